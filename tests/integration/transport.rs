//! SchemaFixTransport over a real HTTP transport.

use crate::mock_server::{MockServerFixture, CHAT_PATH};
use ai_schema_fix::Transport;
use mockito::Matcher;
use serde_json::json;

#[tokio::test]
async fn test_missing_properties_injected_on_the_wire() {
    let mut fixture = MockServerFixture::new().await;
    let expected = json!({"tools": [{"function": {"parameters": {"type": "object", "properties": {}}}}]});
    let expected_len = serde_json::to_vec(&expected).unwrap().len();

    let mock = fixture
        .server
        .mock("POST", CHAT_PATH)
        .match_header("content-length", expected_len.to_string().as_str())
        .match_body(Matcher::Json(expected))
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let transport = fixture.fixing_transport();
    let resp = transport
        .round_trip(fixture.post(
            CHAT_PATH,
            r#"{"tools":[{"function":{"parameters":{"type":"object"}}}]}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_populated_properties_forwarded_verbatim() {
    let mut fixture = MockServerFixture::new().await;
    let body = r#"{"tools":[{"function":{"parameters":{"type":"object","properties":{"x":{"type":"string"}}}}}]}"#;
    let mock = fixture
        .expect_body(CHAT_PATH, Matcher::Exact(body.to_string()))
        .await;

    fixture
        .fixing_transport()
        .round_trip(fixture.post(CHAT_PATH, body))
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_invalid_json_forwarded_verbatim() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .expect_body(CHAT_PATH, Matcher::Exact("{bad json".to_string()))
        .await;

    fixture
        .fixing_transport()
        .round_trip(fixture.post(CHAT_PATH, "{bad json"))
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_other_endpoints_forwarded_verbatim() {
    let mut fixture = MockServerFixture::new().await;
    let body = r#"{"tools":[{"function":{"parameters":{"type":"object"}}}]}"#;
    let mock = fixture
        .expect_body("/v1/embeddings", Matcher::Exact(body.to_string()))
        .await;

    fixture
        .fixing_transport()
        .round_trip(fixture.post("/v1/embeddings", body))
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_upstream_status_is_returned_unchanged() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", CHAT_PATH)
        .with_status(503)
        .with_body("upstream down")
        .create_async()
        .await;

    let resp = fixture
        .fixing_transport()
        .round_trip(fixture.post(CHAT_PATH, "{}"))
        .await
        .unwrap();

    assert_eq!(resp.status(), 503);
    assert_eq!(resp.text().await.unwrap(), "upstream down");
    mock.assert_async().await;
}
