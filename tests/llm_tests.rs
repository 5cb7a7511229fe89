//! LLM and embedding clients against mocked provider APIs.
//!
//! wiremock stands in for the Gemini and Ollama servers so request shape,
//! response parsing and error mapping are checked without network access.

use ragchat::llm::{GeminiClient, LLMClient};
use ragchat::rag::embeddings::GeminiEmbedder;
use ragchat::rag::Embedder;
use ragchat::types::AppError;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL: &str = "gemini-2.5-flash";

// ============= Helper Functions =============

fn gemini_client(server: &MockServer, api_key: Option<&str>) -> GeminiClient {
    GeminiClient::new(
        server.uri(),
        MODEL.to_string(),
        api_key.map(str::to_string),
        Some(5),
    )
    .unwrap()
}

fn mock_candidate(parts: &[&str]) -> serde_json::Value {
    let parts: Vec<_> = parts.iter().map(|t| json!({ "text": t })).collect();
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": parts },
            "finishReason": "STOP"
        }]
    })
}

// ============= Gemini generateContent =============

#[tokio::test]
async fn test_gemini_generate_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{MODEL}:generateContent")))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Say hi" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(mock_candidate(&["Hi!"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = gemini_client(&server, Some("test-key"));
    let answer = client.generate("Say hi").await.unwrap();

    assert_eq!(answer, "Hi!");
    assert_eq!(client.model_name(), MODEL);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].url.query(), None);
}

#[tokio::test]
async fn test_gemini_error_body_does_not_echo_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .mount(&server)
        .await;

    let err = gemini_client(&server, Some("SECRET-KEY-123"))
        .generate("x")
        .await
        .unwrap_err();

    assert!(!err.to_string().contains("SECRET-KEY-123"));
}

#[tokio::test]
async fn test_gemini_joins_text_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(mock_candidate(&["Hello, ", "world."])),
        )
        .mount(&server)
        .await;

    let answer = gemini_client(&server, Some("k")).generate("x").await.unwrap();
    assert_eq!(answer, "Hello, world.");
}

#[tokio::test]
async fn test_gemini_error_status_is_llm_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let result = gemini_client(&server, Some("bad")).generate("x").await;

    match result {
        Err(AppError::LLM(msg)) => assert!(msg.contains("API key not valid")),
        other => panic!("expected LLM error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_gemini_blocked_response_reports_finish_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        })))
        .mount(&server)
        .await;

    let result = gemini_client(&server, Some("k")).generate("x").await;

    match result {
        Err(AppError::LLM(msg)) => assert!(msg.contains("SAFETY")),
        other => panic!("expected LLM error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_gemini_missing_key_fails_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(mock_candidate(&["unused"])))
        .expect(0)
        .mount(&server)
        .await;

    let result = gemini_client(&server, None).generate("x").await;
    assert!(matches!(result, Err(AppError::LLM(_))));
}

// ============= Gemini batchEmbedContents =============

#[tokio::test]
async fn test_gemini_embedder_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/text-embedding-004:batchEmbedContents"))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [
                { "values": [0.5, 0.25, 0.125] },
                { "values": [1.0, -0.5, 0.75] }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = GeminiEmbedder::new(
        server.uri(),
        "text-embedding-004".to_string(),
        Some("test-key".to_string()),
        None,
    )
    .unwrap();

    let vectors = embedder
        .embed_texts(&["first".to_string(), "second".to_string()])
        .await
        .unwrap();

    assert_eq!(vectors, vec![vec![0.5, 0.25, 0.125], vec![1.0, -0.5, 0.75]]);
}

#[tokio::test]
async fn test_gemini_embedder_count_mismatch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "embeddings": [{ "values": [0.1] }]
        })))
        .mount(&server)
        .await;

    let embedder = GeminiEmbedder::new(
        server.uri(),
        "text-embedding-004".to_string(),
        Some("k".to_string()),
        None,
    )
    .unwrap();

    let result = embedder
        .embed_texts(&["a".to_string(), "b".to_string()])
        .await;
    assert!(matches!(result, Err(AppError::Embedding(_))));
}

// ============= Ollama =============

#[cfg(feature = "ollama")]
mod ollama {
    use super::*;
    use ragchat::llm::ollama::OllamaClient;

    #[tokio::test]
    async fn test_ollama_generate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3.2",
                "created_at": "2024-01-01T00:00:00Z",
                "message": { "role": "assistant", "content": "Hello from Ollama" },
                "done": true
            })))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri(), "llama3.2".to_string())
            .await
            .unwrap();
        let answer = client.generate("hi").await.unwrap();

        assert_eq!(answer, "Hello from Ollama");
    }

    #[tokio::test]
    async fn test_ollama_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri(), "llama3.2".to_string())
            .await
            .unwrap();
        assert!(matches!(
            client.generate("hi").await,
            Err(AppError::LLM(_))
        ));
    }
}
