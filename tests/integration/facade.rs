//! SchemaFixingChatModel end to end.

use crate::mock_server::MockServerFixture;
use ai_schema_fix::model::facade::MODEL_TYPE;
use ai_schema_fix::{
    ChatModel, ClientConfig, Error, GenerateOptions, Message, SchemaFixingChatModel,
    ToolCallingChatModel, ToolDefinition, TransportError,
};
use futures::StreamExt;
use mockito::Matcher;
use serde_json::json;

fn bare_tool() -> ToolDefinition {
    ToolDefinition::function("get_time", Some("Current time"), Some(json!({"type": "object"})))
}

const COMPLETION: &str = r#"{
    "id": "chatcmpl-1",
    "choices": [{
        "index": 0,
        "message": {
            "role": "assistant",
            "content": null,
            "tool_calls": [{"id": "call_1", "type": "function", "function": {"name": "get_time", "arguments": "{}"}}]
        },
        "finish_reason": "tool_calls"
    }],
    "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
}"#;

#[tokio::test]
async fn test_generate_sends_repaired_tool_schema() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_response(
            Matcher::AllOf(vec![
                // The bound schema has no `properties` at all; only the transport can add it.
                Matcher::Regex(r#""properties":\{\}"#.to_string()),
                Matcher::Regex(r#""model":"gpt-4o-mini""#.to_string()),
            ]),
            200,
            COMPLETION,
        )
        .await;

    let mut model = SchemaFixingChatModel::new(&fixture.config()).unwrap();
    model.bind_tools(vec![bare_tool()]).unwrap();
    assert_eq!(model.model_type(), MODEL_TYPE);
    assert!(!model.is_callbacks_enabled());

    let reply = model
        .generate(&[Message::user("what time is it?")], &GenerateOptions::new())
        .await
        .unwrap();

    assert_eq!(reply.tool_calls.len(), 1);
    assert_eq!(reply.tool_calls[0].name, "get_time");
    assert_eq!(reply.tool_calls[0].arguments, json!({}));
    assert_eq!(
        reply.response_meta.and_then(|m| m.usage).map(|u| u.total_tokens),
        Some(15)
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_forced_tools_and_with_tools() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_response(
            Matcher::AllOf(vec![
                Matcher::Regex(r#""tool_choice":"required""#.to_string()),
                Matcher::Regex(r#""properties":\{\}"#.to_string()),
            ]),
            200,
            COMPLETION,
        )
        .await;

    let base = SchemaFixingChatModel::new(&fixture.config()).unwrap();
    let mut forced = base.with_tools(vec![bare_tool()]).unwrap();
    forced.bind_forced_tools(vec![bare_tool()]).unwrap();
    assert!(base.inner().tools().is_empty());

    forced
        .generate(&[Message::user("time")], &GenerateOptions::new())
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_stream_yields_deltas() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_sse_stream(
            Matcher::Regex(r#""stream":true"#.to_string()),
            vec![
                r#"{"choices":[{"index":0,"delta":{"role":"assistant","content":"Hel"}}]}"#,
                r#"{"choices":[{"index":0,"delta":{"content":"lo"}}]}"#,
                r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
                "[DONE]",
            ],
        )
        .await;

    let model = SchemaFixingChatModel::new(&fixture.config()).unwrap();
    let deltas: Vec<_> = model
        .stream(&[Message::user("hi")], &GenerateOptions::new().temperature(0.0))
        .await
        .unwrap()
        .collect()
        .await;

    let deltas: Vec<_> = deltas.into_iter().map(|d| d.unwrap()).collect();
    assert_eq!(deltas.len(), 3);
    let text: String = deltas.iter().filter_map(|d| d.content.clone()).collect();
    assert_eq!(text, "Hello");
    assert_eq!(deltas[2].finish_reason.as_deref(), Some("stop"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_rejection_surfaces_as_remote_error() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .mock_json_response(
            Matcher::Any,
            400,
            r#"{"error":{"message":"Invalid value for 'tool_choice'","type":"invalid_request_error"}}"#,
        )
        .await;

    let model = SchemaFixingChatModel::new(&fixture.config()).unwrap();
    let err = model
        .generate(&[Message::user("hi")], &GenerateOptions::new())
        .await
        .unwrap_err();

    match err {
        Error::Remote { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid value for 'tool_choice'");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    let config = ClientConfig::new("gpt-4o-mini")
        .with_base_url("http://127.0.0.1:1/v1")
        .with_api_key("sk-test");
    let model = SchemaFixingChatModel::new(&config).unwrap();

    let err = model
        .generate(&[Message::user("hi")], &GenerateOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(TransportError::Http(_))));
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = SchemaFixingChatModel::new(&ClientConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}
