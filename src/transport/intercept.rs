//! Schema-fixing transport decorator.
//!
//! Sits in front of another [`Transport`] and repairs `tools[].function.parameters`
//! in chat-completion request bodies (see [`crate::normalize`]). It never originates an
//! error: bodies it cannot read, parse or re-encode are forwarded exactly as received,
//! and whatever the inner transport returns is handed back untouched.

use crate::config::InterceptConfig;
use crate::normalize::normalize_tool_schemas;
use crate::transport::{Transport, TransportError};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_LENGTH};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub struct SchemaFixTransport {
    inner: Arc<dyn Transport>,
    path_fragment: String,
}

impl SchemaFixTransport {
    /// Wrap `inner`, inspecting requests whose path contains `/chat/completions`.
    pub fn new(inner: Arc<dyn Transport>) -> Self {
        Self::with_config(inner, &InterceptConfig::default())
    }

    pub fn with_config(inner: Arc<dyn Transport>, config: &InterceptConfig) -> Self {
        Self {
            inner,
            path_fragment: config.path_fragment.clone(),
        }
    }

    pub fn path_fragment(&self) -> &str {
        &self.path_fragment
    }

    /// Cheap pre-filter: path match and a body present. The body is not read here.
    pub fn is_eligible(&self, request: &reqwest::Request) -> bool {
        request.url().path().contains(&self.path_fragment) && request.body().is_some()
    }
}

/// Normalize a raw request body.
///
/// Returns the re-encoded body when at least one schema was repaired, `None` when the
/// original bytes should be forwarded as they are.
pub fn rewrite_body(original: &[u8]) -> Option<Vec<u8>> {
    let mut document: Value = match serde_json::from_slice(original) {
        Ok(v @ Value::Object(_)) => v,
        Ok(_) => {
            debug!("request body is not a JSON object, forwarding unchanged");
            return None;
        }
        Err(e) => {
            debug!("request body is not valid JSON ({}), forwarding unchanged", e);
            return None;
        }
    };

    let report = normalize_tool_schemas(&mut document);
    if !report.changed() {
        return None;
    }

    match serde_json::to_vec(&document) {
        Ok(bytes) => {
            debug!(
                tools = report.tools_seen,
                fixed = report.schemas_fixed,
                "repaired tool parameter schemas"
            );
            Some(bytes)
        }
        Err(e) => {
            // The partially mutated document is dropped with this branch.
            debug!("failed to re-encode request body ({}), forwarding original", e);
            None
        }
    }
}

#[async_trait]
impl Transport for SchemaFixTransport {
    async fn round_trip(
        &self,
        mut request: reqwest::Request,
    ) -> std::result::Result<reqwest::Response, TransportError> {
        if !self.is_eligible(&request) {
            return self.inner.round_trip(request).await;
        }

        let rewritten = match request.body().and_then(reqwest::Body::as_bytes) {
            Some(bytes) => rewrite_body(bytes),
            None => {
                debug!(
                    path = request.url().path(),
                    "streaming request body cannot be buffered, forwarding unchanged"
                );
                None
            }
        };

        if let Some(body) = rewritten {
            let len = body.len();
            *request.body_mut() = Some(reqwest::Body::from(body));
            request
                .headers_mut()
                .insert(CONTENT_LENGTH, HeaderValue::from(len));
        }

        self.inner.round_trip(request).await
    }
}
