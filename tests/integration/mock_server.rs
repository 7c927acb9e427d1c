//! Mock HTTP server setup for integration tests

use ai_schema_fix::{ClientConfig, HttpTransport, SchemaFixTransport, Transport};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::sync::Arc;

pub const CHAT_PATH: &str = "/v1/chat/completions";

/// Test fixture that owns a mock server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Client config pointing at the mock server. The explicit key keeps the keyring out of tests.
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new("gpt-4o-mini")
            .with_base_url(format!("{}/v1", self.base_url))
            .with_api_key("sk-test")
    }

    /// Schema-fixing transport over a real reqwest transport.
    pub fn fixing_transport(&self) -> SchemaFixTransport {
        let http = HttpTransport::new(&self.config()).expect("http transport");
        SchemaFixTransport::new(Arc::new(http) as Arc<dyn Transport>)
    }

    pub fn post(&self, path: &str, body: &'static str) -> reqwest::Request {
        let url = reqwest::Url::parse(&format!("{}{}", self.base_url, path)).expect("url");
        let mut req = reqwest::Request::new(reqwest::Method::POST, url);
        req.headers_mut().insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        *req.body_mut() = Some(reqwest::Body::from(body));
        req
    }

    /// Expect exactly one POST to `path` whose body matches.
    pub async fn expect_body(&mut self, path: &str, body: Matcher) -> Mock {
        self.server
            .mock("POST", path)
            .match_body(body)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .expect(1)
            .create_async()
            .await
    }

    /// Create a mock for a JSON chat completion response
    pub async fn mock_json_response(
        &mut self,
        body_matcher: Matcher,
        status: usize,
        body: &str,
    ) -> Mock {
        self.server
            .mock("POST", CHAT_PATH)
            .match_header("authorization", "Bearer sk-test")
            .match_body(body_matcher)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(1)
            .create_async()
            .await
    }

    /// Create a mock for a successful streaming response (SSE)
    pub async fn mock_sse_stream(&mut self, body_matcher: Matcher, chunks: Vec<&str>) -> Mock {
        let body = chunks
            .iter()
            .map(|chunk| format!("data: {}\n\n", chunk))
            .collect::<Vec<_>>()
            .join("");

        self.server
            .mock("POST", CHAT_PATH)
            .match_header("accept", "text/event-stream")
            .match_body(body_matcher)
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .expect(1)
            .create_async()
            .await
    }
}
