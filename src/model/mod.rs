//! Chat model contract and implementations.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ChatModel`] | `generate` / `stream` over a list of messages |
//! | [`ToolCallingChatModel`] | Tool binding on top of [`ChatModel`] |
//! | [`OpenAiChatModel`] | OpenAI-compatible client over any [`Transport`](crate::transport::Transport) |
//! | [`SchemaFixingChatModel`] | Facade that routes the client through the schema-fixing transport |

pub mod facade;
pub mod openai;
pub mod sse;

pub use facade::SchemaFixingChatModel;
pub use openai::OpenAiChatModel;

use crate::types::{Message, MessageDelta, ToolDefinition};
use crate::{BoxStream, Result};
use async_trait::async_trait;

/// Per-call generation options. Unset fields are omitted from the request.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Overrides the configured model for this call.
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub stop: Option<Vec<String>>,
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, t: f64) -> Self {
        self.temperature = Some(t);
        self
    }

    pub fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    pub fn stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, messages: &[Message], options: &GenerateOptions) -> Result<Message>;

    async fn stream(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<BoxStream<'static, MessageDelta>>;

    /// Implementation identifier, e.g. for logs.
    fn model_type(&self) -> &str;

    fn is_callbacks_enabled(&self) -> bool {
        false
    }
}

pub trait ToolCallingChatModel: ChatModel {
    /// Make `tools` available to the model for subsequent calls.
    fn bind_tools(&mut self, tools: Vec<ToolDefinition>) -> Result<()>;

    /// Like [`bind_tools`](Self::bind_tools), but the model must call one of them.
    fn bind_forced_tools(&mut self, tools: Vec<ToolDefinition>) -> Result<()>;

    /// A copy of this model with `tools` bound; the receiver keeps its own tools.
    fn with_tools(&self, tools: Vec<ToolDefinition>) -> Result<Self>
    where
        Self: Sized;
}
