mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use common::mocks::MockLLMClient;
use common::{start, test_config, write_doc};
use ragchat::api;
use ragchat::rag::IndexPolicy;
use ragchat::types::{ChatResponse, SessionCreated, SessionHistory};
use serde_json::{json, Value};
use tempfile::TempDir;

async fn create_test_server(dir: &TempDir, client: &MockLLMClient) -> TestServer {
    let config = test_config(dir.path());
    write_doc(
        &config,
        "handbook.txt",
        "Employees get twenty-five days of paid leave per year, plus public holidays.".as_bytes(),
    );
    let (state, _) = start(&config, IndexPolicy::Reuse, client).await;
    TestServer::new(api::app(state)).expect("Failed to create test server")
}

async fn create_session(server: &TestServer) -> String {
    let response = server.post("/api/sessions").await;
    response.assert_status(StatusCode::CREATED);
    response.json::<SessionCreated>().session_id
}

// ============= Health & Index =============

#[tokio::test]
async fn test_health_check() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(&dir, &MockLLMClient::new("ok")).await;

    let response = server.get("/api/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "mock-model");
}

#[tokio::test]
async fn test_index_status() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(&dir, &MockLLMClient::new("ok")).await;

    let response = server.get("/api/index").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["collection"], "knowledge_base");
    assert_eq!(body["entries"], 1);
    assert_eq!(body["exists"], true);
    assert_eq!(body["manifest"]["populated"], true);
}

#[tokio::test]
async fn test_root_serves_chat_page() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(&dir, &MockLLMClient::new("ok")).await;

    let response = server.get("/").await;

    response.assert_status_ok();
    assert!(response.text().contains("<title>RAG Chat</title>"));
}

#[tokio::test]
async fn test_chat_page_shows_message_before_reply_and_ends_session() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(&dir, &MockLLMClient::new("ok")).await;

    let page = server.get("/").await.text();

    let shown = page.find("append('user', text)").expect("user message rendered");
    let sent = page.find("'/messages'").expect("message request");
    assert!(shown < sent, "user message must render before the request");
    assert!(page.contains("'pagehide'"));
    assert!(page.contains("keepalive: true"));
}

#[tokio::test]
async fn test_unknown_asset_is_not_found() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(&dir, &MockLLMClient::new("ok")).await;

    server.get("/nope.js").await.assert_status_not_found();
}

// ============= Sessions =============

#[tokio::test]
async fn test_session_lifecycle() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(&dir, &MockLLMClient::new("ok")).await;

    let id = create_session(&server).await;

    let history: SessionHistory = server.get(&format!("/api/sessions/{id}")).await.json();
    assert_eq!(history.session_id, id);
    assert!(history.messages.is_empty());

    server
        .delete(&format!("/api/sessions/{id}"))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get(&format!("/api/sessions/{id}"))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_send_message_uses_context() {
    let dir = TempDir::new().unwrap();
    let client = MockLLMClient::new("Twenty-five days.");
    let server = create_test_server(&dir, &client).await;
    let id = create_session(&server).await;

    let response = server
        .post(&format!("/api/sessions/{id}/messages"))
        .json(&json!({ "message": "How much leave do I get?" }))
        .await;

    response.assert_status_ok();
    let reply: ChatResponse = response.json();
    assert_eq!(reply.response, "Twenty-five days.");
    assert!(reply.used_context);
    assert_eq!(reply.sources, vec!["handbook.txt".to_string()]);
    assert_eq!(reply.history_len, 2);
    assert!(client
        .last_prompt()
        .unwrap()
        .contains("Employees get twenty-five days"));

    let history: SessionHistory = server.get(&format!("/api/sessions/{id}")).await.json();
    assert_eq!(history.messages.len(), 2);
    assert_eq!(history.messages[0].content, "How much leave do I get?");
    assert_eq!(history.messages[1].content, "Twenty-five days.");
}

#[tokio::test]
async fn test_send_message_unknown_session() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(&dir, &MockLLMClient::new("ok")).await;

    server
        .post("/api/sessions/does-not-exist/messages")
        .json(&json!({ "message": "hi" }))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_send_blank_message_is_rejected() {
    let dir = TempDir::new().unwrap();
    let client = MockLLMClient::new("ok");
    let server = create_test_server(&dir, &client).await;
    let id = create_session(&server).await;

    let response = server
        .post(&format!("/api/sessions/{id}/messages"))
        .json(&json!({ "message": "   " }))
        .await;

    response.assert_status_bad_request();
    assert!(client.prompts().is_empty());
}

#[tokio::test]
async fn test_llm_failure_keeps_history() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(&dir, &MockLLMClient::failing()).await;
    let id = create_session(&server).await;

    let response = server
        .post(&format!("/api/sessions/{id}/messages"))
        .json(&json!({ "message": "hello" }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("Mock LLM failure"));

    let history: SessionHistory = server.get(&format!("/api/sessions/{id}")).await.json();
    assert!(history.messages.is_empty());
}
