//! OpenAI-compatible chat completions client.
//!
//! Requests are built as `reqwest::Request`s and handed to a [`Transport`], so whatever
//! decorators sit in that transport (schema repair in particular) see every call.

use crate::config::ClientConfig;
use crate::model::sse::decode_sse;
use crate::model::{ChatModel, GenerateOptions, ToolCallingChatModel};
use crate::transport::{Transport, TransportError};
use crate::types::{
    Message, MessageDelta, MessageRole, ResponseMeta, ToolCall, ToolCallDelta, ToolDefinition,
    Usage,
};
use crate::{BoxStream, Error, ErrorContext, Result};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct OpenAiChatModel {
    transport: Arc<dyn Transport>,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
    tools: Vec<ToolDefinition>,
    forced_tools: bool,
}

impl std::fmt::Debug for OpenAiChatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatModel")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .field("tools", &self.tools.len())
            .field("forced_tools", &self.forced_tools)
            .finish()
    }
}

impl OpenAiChatModel {
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            endpoint: config.chat_completions_url()?,
            model: config.model.clone(),
            api_key: config.resolve_api_key(),
            tools: Vec::new(),
            forced_tools: false,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// Request body for one call. Tool parameters are sent exactly as bound.
    pub fn build_body(&self, messages: &[Message], options: &GenerateOptions, stream: bool) -> Value {
        let mut body = Map::new();
        body.insert(
            "model".to_string(),
            json!(options.model.as_deref().unwrap_or(&self.model)),
        );
        body.insert(
            "messages".to_string(),
            Value::Array(messages.iter().map(encode_message).collect()),
        );
        if let Some(t) = options.temperature {
            body.insert("temperature".to_string(), json!(t));
        }
        if let Some(n) = options.max_tokens {
            body.insert("max_tokens".to_string(), json!(n));
        }
        if let Some(stop) = &options.stop {
            body.insert("stop".to_string(), json!(stop));
        }
        if !self.tools.is_empty() {
            body.insert("tools".to_string(), json!(self.tools));
            if self.forced_tools {
                body.insert("tool_choice".to_string(), json!("required"));
            }
        }
        if stream {
            body.insert("stream".to_string(), json!(true));
        }
        Value::Object(body)
    }

    fn build_request(&self, body: &Value, stream: bool) -> Result<reqwest::Request> {
        let bytes = serde_json::to_vec(body)?;
        let mut request = reqwest::Request::new(Method::POST, self.endpoint.clone());

        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(if stream {
                "text/event-stream"
            } else {
                "application/json"
            }),
        );
        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|_| {
                Error::configuration_with_context(
                    "API key contains characters not allowed in a header",
                    ErrorContext::new().with_field_path("api_key"),
                )
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        *request.body_mut() = Some(bytes.into());
        Ok(request)
    }

    async fn send(&self, request: reqwest::Request) -> Result<reqwest::Response> {
        let response = self.transport.round_trip(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        warn!(status = status.as_u16(), model = %self.model, "chat completion request failed");
        let message = match response.text().await {
            Ok(text) if !text.trim().is_empty() => error_message_from_body(&text),
            Ok(_) => status_text(status),
            Err(e) => {
                debug!("failed to read error body: {}", e);
                status_text(status)
            }
        };
        Err(Error::Remote {
            status: status.as_u16(),
            message,
        })
    }

    fn bind(&mut self, tools: Vec<ToolDefinition>, forced: bool) -> Result<()> {
        if tools.is_empty() {
            return Err(Error::validation_with_context(
                "no tools to bind",
                ErrorContext::new().with_source("openai_client"),
            ));
        }
        self.tools = tools;
        self.forced_tools = forced;
        Ok(())
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn generate(&self, messages: &[Message], options: &GenerateOptions) -> Result<Message> {
        let body = self.build_body(messages, options, false);
        let request = self.build_request(&body, false)?;
        debug!(model = %self.model, messages = messages.len(), "chat completion request");

        let response = self.send(request).await?;
        let payload: Value = response
            .json()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;
        parse_completion(&payload)
    }

    async fn stream(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<BoxStream<'static, MessageDelta>> {
        let body = self.build_body(messages, options, true);
        let request = self.build_request(&body, true)?;
        debug!(model = %self.model, messages = messages.len(), "chat completion stream request");

        let response = self.send(request).await?;
        let bytes = response
            .bytes_stream()
            .map_err(|e| Error::Transport(TransportError::Http(e)));

        let deltas = decode_sse(Box::pin(bytes)).filter_map(|frame| async move {
            match frame {
                Ok(chunk) => parse_chunk(&chunk).transpose(),
                Err(e) => Some(Err(e)),
            }
        });
        Ok(Box::pin(deltas))
    }

    fn model_type(&self) -> &str {
        "OpenAI"
    }
}

impl ToolCallingChatModel for OpenAiChatModel {
    fn bind_tools(&mut self, tools: Vec<ToolDefinition>) -> Result<()> {
        self.bind(tools, false)
    }

    fn bind_forced_tools(&mut self, tools: Vec<ToolDefinition>) -> Result<()> {
        self.bind(tools, true)
    }

    fn with_tools(&self, tools: Vec<ToolDefinition>) -> Result<Self> {
        let mut model = self.clone();
        model.bind(tools, false)?;
        Ok(model)
    }
}

fn encode_message(message: &Message) -> Value {
    let mut out = Map::new();
    out.insert("role".to_string(), json!(message.role.as_str()));

    if message.role == MessageRole::Assistant && message.has_tool_calls() {
        let calls: Vec<Value> = message
            .tool_calls
            .iter()
            .map(|call| {
                // The wire format wants arguments as a JSON-encoded string.
                let arguments = match &call.arguments {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                json!({
                    "id": call.id,
                    "type": "function",
                    "function": {"name": call.name, "arguments": arguments},
                })
            })
            .collect();
        out.insert("tool_calls".to_string(), Value::Array(calls));
        if message.content.is_empty() {
            out.insert("content".to_string(), Value::Null);
        } else {
            out.insert("content".to_string(), json!(message.content));
        }
    } else {
        out.insert("content".to_string(), json!(message.content));
    }

    if let Some(id) = &message.tool_call_id {
        out.insert("tool_call_id".to_string(), json!(id));
    }
    Value::Object(out)
}

/// Decode a JSON-string argument payload, keeping the raw string if it is not JSON.
fn decode_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(Map::new());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn parse_tool_call(v: &Value) -> Option<ToolCall> {
    let function = v.get("function")?;
    let arguments = match function.get("arguments") {
        Some(Value::String(s)) => decode_arguments(s),
        Some(other) => other.clone(),
        None => Value::Object(Map::new()),
    };
    Some(ToolCall {
        id: v.get("id").and_then(Value::as_str).unwrap_or_default().to_string(),
        name: function.get("name")?.as_str()?.to_string(),
        arguments,
    })
}

pub(crate) fn parse_completion(payload: &Value) -> Result<Message> {
    let choice = payload
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| Error::Stream {
            message: "completion response has no choices".to_string(),
        })?;
    let message = choice.get("message").unwrap_or(&Value::Null);

    let tool_calls: Vec<ToolCall> = message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(|calls| calls.iter().filter_map(parse_tool_call).collect())
        .unwrap_or_default();

    let usage = payload
        .get("usage")
        .and_then(|u| serde_json::from_value::<Usage>(u.clone()).ok());

    Ok(Message {
        role: MessageRole::Assistant,
        content: message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        tool_calls,
        tool_call_id: None,
        response_meta: Some(ResponseMeta {
            finish_reason: choice
                .get("finish_reason")
                .and_then(Value::as_str)
                .map(str::to_string),
            usage,
        }),
    })
}

/// Map one streamed chunk to a delta. Chunks without choices (e.g. trailing usage) yield `None`.
pub(crate) fn parse_chunk(chunk: &Value) -> Result<Option<MessageDelta>> {
    if let Some(err) = chunk.get("error") {
        return Err(Error::Stream {
            message: error_message_from_value(err),
        });
    }

    let Some(choice) = chunk.get("choices").and_then(|c| c.get(0)) else {
        return Ok(None);
    };
    let delta = choice.get("delta").unwrap_or(&Value::Null);

    let tool_calls = delta
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(|calls| {
            calls
                .iter()
                .enumerate()
                .map(|(i, call)| {
                    let function = call.get("function");
                    let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);
                    ToolCallDelta {
                        index: call
                            .get("index")
                            .and_then(Value::as_u64)
                            .unwrap_or(i as u64) as u32,
                        id: text(call.get("id")),
                        name: text(function.and_then(|f| f.get("name"))),
                        arguments: text(function.and_then(|f| f.get("arguments"))),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let out = MessageDelta {
        content: delta
            .get("content")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        tool_calls,
        finish_reason: choice
            .get("finish_reason")
            .and_then(Value::as_str)
            .map(str::to_string),
    };

    if out.is_empty() {
        return Ok(None);
    }
    Ok(Some(out))
}

fn error_message_from_value(err: &Value) -> String {
    err.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| err.as_str().map(str::to_string))
        .unwrap_or_else(|| err.to_string())
}

/// Fallback message when the error body is empty or unreadable.
fn status_text(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

fn error_message_from_body(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("error").map(error_message_from_value))
        .unwrap_or_else(|| body.to_string())
}
