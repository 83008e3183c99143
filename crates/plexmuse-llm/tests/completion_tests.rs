use plexmuse_llm::{ChatRequest, LlmClient, LlmError, Provider};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(model: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        system: "You are a music curator.".to_string(),
        user: "Create a playlist for: rainy night".to_string(),
        max_tokens: 30,
        temperature: 0.7,
    }
}

#[tokio::test]
async fn test_openai_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4",
            "max_tokens": 30,
            "messages": [
                {"role": "system", "content": "You are a music curator."},
                {"role": "user", "content": "Create a playlist for: rainy night"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "  Midnight Drizzle \n"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = LlmClient::builder()
        .openai_api_key(Some("sk-test".to_string()))
        .openai_base_url(server.uri())
        .build()
        .unwrap();

    let text = client.complete(&request("gpt-4")).await.unwrap();
    assert_eq!(text, "Midnight Drizzle");
}

#[tokio::test]
async fn test_anthropic_completion_uses_messages_api() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "ak-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-5-sonnet-latest",
            "system": "You are a music curator."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "{\"artists\": [\"Portishead\"]}"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = LlmClient::builder()
        .anthropic_api_key(Some("ak-test".to_string()))
        .anthropic_base_url(server.uri())
        .build()
        .unwrap();

    let text = client
        .complete(&request("anthropic/claude-3-5-sonnet-latest"))
        .await
        .unwrap();
    assert_eq!(text, "{\"artists\": [\"Portishead\"]}");
}

#[tokio::test]
async fn test_missing_key_fails_without_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = LlmClient::builder()
        .openai_base_url(server.uri())
        .build()
        .unwrap();

    let result = client.complete(&request("gpt-4")).await;
    assert!(matches!(result, Err(LlmError::MissingApiKey(Provider::OpenAi))));
}

#[tokio::test]
async fn test_error_status_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let client = LlmClient::builder()
        .openai_api_key(Some("sk-test".to_string()))
        .openai_base_url(server.uri())
        .build()
        .unwrap();

    match client.complete(&request("gpt-4")).await {
        Err(LlmError::HttpStatus { status, body }) => {
            assert_eq!(status.as_u16(), 429);
            assert_eq!(body, "slow down");
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_null_content_is_empty_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        })))
        .mount(&server)
        .await;

    let client = LlmClient::builder()
        .openai_api_key(Some("sk-test".to_string()))
        .openai_base_url(server.uri())
        .build()
        .unwrap();

    let result = client.complete(&request("gpt-4")).await;
    assert!(matches!(result, Err(LlmError::EmptyCompletion)));
}
