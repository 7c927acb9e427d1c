//! Core data types exchanged with the chat model.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Chat message with role, text and tool calls |
//! | [`MessageRole`] | Message role (system, user, assistant, tool) |
//! | [`MessageDelta`] | One incremental piece of a streamed reply |
//! | [`ToolCall`] | Function/tool call from a model response |
//! | [`ToolDefinition`] | Tool definition sent in the request |
//!
//! ## Example
//!
//! ```rust
//! use ai_schema_fix::types::{Message, ToolDefinition};
//!
//! let user = Message::user("What's the weather?");
//!
//! // Parameters without `properties`: the request transport repairs this on the way out.
//! let tool = ToolDefinition::function(
//!     "get_time",
//!     Some("Current server time"),
//!     Some(serde_json::json!({"type": "object"})),
//! );
//! assert_eq!(tool.function.name, "get_time");
//! ```

pub mod events;
pub mod message;
pub mod tool;

pub use events::{MessageDelta, ToolCallDelta};
pub use message::{Message, MessageRole, ResponseMeta, Usage};
pub use tool::{FunctionDefinition, ToolCall, ToolDefinition};
