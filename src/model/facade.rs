//! Chat model facade with tool schema repair.
//!
//! [`SchemaFixingChatModel`] is a thin pass-through over [`OpenAiChatModel`]. The only
//! thing it adds is wiring: the inner client's transport is wrapped in a
//! [`SchemaFixTransport`], so tool definitions whose parameters lack `properties` are
//! repaired on the wire instead of being rejected by the API.

use crate::config::ClientConfig;
use crate::model::{ChatModel, GenerateOptions, OpenAiChatModel, ToolCallingChatModel};
use crate::transport::{HttpTransport, SchemaFixTransport, Transport};
use crate::types::{Message, MessageDelta, ToolDefinition};
use crate::{BoxStream, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub const MODEL_TYPE: &str = "SchemaFixingOpenAI";

#[derive(Debug, Clone)]
pub struct SchemaFixingChatModel {
    inner: OpenAiChatModel,
}

impl SchemaFixingChatModel {
    /// Build over a fresh [`HttpTransport`] configured from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = HttpTransport::new(config)?;
        Self::with_transport(config, Arc::new(http))
    }

    /// Build over an existing transport (a shared client, a test double, ...).
    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let fixing = SchemaFixTransport::with_config(transport, &config.intercept);
        let inner = OpenAiChatModel::new(config, Arc::new(fixing))?;
        info!(
            model = %config.model,
            path_fragment = %config.intercept.path_fragment,
            "schema-fixing chat model ready"
        );
        Ok(Self { inner })
    }

    pub fn inner(&self) -> &OpenAiChatModel {
        &self.inner
    }
}

#[async_trait]
impl ChatModel for SchemaFixingChatModel {
    async fn generate(&self, messages: &[Message], options: &GenerateOptions) -> Result<Message> {
        self.inner.generate(messages, options).await
    }

    async fn stream(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<BoxStream<'static, MessageDelta>> {
        self.inner.stream(messages, options).await
    }

    fn model_type(&self) -> &str {
        MODEL_TYPE
    }

    fn is_callbacks_enabled(&self) -> bool {
        self.inner.is_callbacks_enabled()
    }
}

impl ToolCallingChatModel for SchemaFixingChatModel {
    fn bind_tools(&mut self, tools: Vec<ToolDefinition>) -> Result<()> {
        self.inner.bind_tools(tools)
    }

    fn bind_forced_tools(&mut self, tools: Vec<ToolDefinition>) -> Result<()> {
        self.inner.bind_forced_tools(tools)
    }

    fn with_tools(&self, tools: Vec<ToolDefinition>) -> Result<Self> {
        Ok(Self {
            inner: self.inner.with_tools(tools)?,
        })
    }
}
