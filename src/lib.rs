//! # ai-schema-fix
//!
//! 在请求发出前修复聊天补全请求中的工具参数 schema。
//!
//! Transport middleware that repairs tool/function parameter schemas in outbound
//! chat-completion requests.
//!
//! ## Overview
//!
//! OpenAI-compatible APIs reject a function definition whose `parameters` schema says
//! `"type": "object"` but has no `properties` map (or a `null` one). Tool definitions
//! generated from MCP servers routinely look like that. This crate fixes the request on
//! its way out instead of failing the call:
//!
//! - [`normalize`]: pure JSON repair of `tools[].function.parameters`
//! - [`transport::SchemaFixTransport`]: a [`transport::Transport`] decorator that applies
//!   the repair to `/chat/completions` bodies and otherwise forwards requests untouched
//! - [`model::SchemaFixingChatModel`]: chat model facade whose outbound calls go through
//!   the decorator
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_schema_fix::model::{ChatModel, GenerateOptions, SchemaFixingChatModel, ToolCallingChatModel};
//! use ai_schema_fix::types::{Message, ToolDefinition};
//! use ai_schema_fix::ClientConfig;
//!
//! #[tokio::main]
//! async fn main() -> ai_schema_fix::Result<()> {
//!     let config = ClientConfig::new("gpt-4o-mini").with_env_overrides();
//!     let mut model = SchemaFixingChatModel::new(&config)?;
//!
//!     // No `properties`: sent as `{"type":"object","properties":{}}`.
//!     model.bind_tools(vec![ToolDefinition::function(
//!         "get_time",
//!         Some("Current server time"),
//!         Some(serde_json::json!({"type": "object"})),
//!     )])?;
//!
//!     let reply = model
//!         .generate(&[Message::user("What time is it?")], &GenerateOptions::new())
//!         .await?;
//!     println!("{:?}", reply.tool_calls);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`normalize`] | Tool parameter schema repair |
//! | [`transport`] | Transport trait, reqwest transport, schema-fixing decorator |
//! | [`model`] | Chat model traits, OpenAI-compatible client, facade |
//! | [`types`] | Messages, deltas, tool definitions |
//! | [`config`] | Client configuration (defaults, YAML, env) |

pub mod config;
pub mod model;
pub mod normalize;
pub mod transport;
pub mod types;

pub use config::{ClientConfig, InterceptConfig};
pub use model::{ChatModel, GenerateOptions, SchemaFixingChatModel, ToolCallingChatModel};
pub use normalize::{normalize_tool_schemas, NormalizeReport};
pub use transport::{HttpTransport, SchemaFixTransport, Transport, TransportError};
pub use types::{Message, MessageDelta, MessageRole, ToolCall, ToolDefinition};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
