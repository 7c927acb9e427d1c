//! Outbound HTTP transports.
//!
//! A [`Transport`] takes a fully-formed request and returns the response. Transports
//! compose as decorators: [`SchemaFixTransport`] wraps any other transport and rewrites
//! chat-completion bodies before delegating, [`HttpTransport`] puts bytes on the wire.

pub mod http;
pub mod intercept;

pub use http::HttpTransport;
pub use intercept::SchemaFixTransport;

use async_trait::async_trait;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn round_trip(
        &self,
        request: reqwest::Request,
    ) -> std::result::Result<reqwest::Response, TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
