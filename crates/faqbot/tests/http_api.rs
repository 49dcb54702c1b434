mod common;

use axum::{
  body::{to_bytes, Body},
  http::{Request, StatusCode},
  Router,
};
use base64::Engine;
use bentley::service_log::ServiceLog;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use common::{memory_store, qa, uploader, verifier, ScriptedChat, DIMENSION};
use faqbot::models::FaqRecord;
use faqbot::pipeline::synthesizer::APOLOGY;
use faqbot::server::routing::create_router;
use faqbot::server::state::AppState;
use faqbot::services::storage::LocalBlobStorage;
use faqbot::services::IndexSchema;

struct Harness {
  app: Router,
  chat: Arc<ScriptedChat>,
  _dir: TempDir,
}

async fn harness(chat: Arc<ScriptedChat>) -> Harness {
  let dir = TempDir::new().unwrap();
  let logs = ServiceLog::open_with_silent(dir.path().join("server.logs.jsonl"), true).unwrap();
  let storage = Arc::new(LocalBlobStorage::new(dir.path().join("blobs")));

  let (store, _index) = memory_store().await;
  store
    .bulk_insert_from_source(&[FaqRecord {
      question: "What is X?".to_string(),
      answer: "X is a service.".to_string(),
    }])
    .await;

  let state = AppState::new(
    qa(store, chat.clone()),
    verifier(storage.clone(), chat.clone()),
    uploader(storage),
    logs,
    IndexSchema::new("faq-index", DIMENSION),
  );

  Harness { app: create_router(state), chat, _dir: dir }
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
  let request = Request::builder()
    .method("POST")
    .uri(uri)
    .header("content-type", "application/json")
    .body(Body::from(body.to_string()))
    .unwrap();
  send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
  send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
  let response = app.clone().oneshot(request).await.unwrap();
  let status = response.status();
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn encode(bytes: &[u8]) -> String {
  base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[tokio::test]
async fn test_faq_chat_returns_generated_answer() {
  let h = harness(ScriptedChat::replying("X is a managed service.")).await;

  let (status, body) = post(&h.app, "/api/faq/chat", json!({"user_message": "What is X?"})).await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["response"], "X is a managed service.");
  assert!(body["transaction_id"].is_string());
  assert!(body.get("errors").is_none());
  assert_eq!(h.chat.calls().len(), 1);
}

#[tokio::test]
async fn test_faq_chat_generation_failure_is_a_soft_apology() {
  let h = harness(ScriptedChat::failing()).await;

  let (status, body) = post(&h.app, "/api/faq/chat", json!({"user_message": "What is X?"})).await;

  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["response"], APOLOGY);
}

#[tokio::test]
async fn test_faq_chat_embedding_failure_is_500() {
  let h = harness(ScriptedChat::replying("unused")).await;

  // No alphanumeric terms, so the hashed embedder refuses it
  let (status, body) = post(&h.app, "/api/faq/chat", json!({"user_message": "???"})).await;

  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["errors"][0]["key"], "faq_chat_failed");
  assert!(h.chat.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_422() {
  let h = harness(ScriptedChat::replying("unused")).await;

  let (status, body) = post(&h.app, "/api/faq/chat", json!({"question": "wrong field"})).await;

  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["errors"][0]["key"], "validation_failed");
}

#[tokio::test]
async fn test_upload_then_verify() {
  let h = harness(ScriptedChat::replying("Válido")).await;

  let (status, body) = post(
    &h.app,
    "/api/documents/upload_file",
    json!({"filename": "maria.pdf", "content": encode(b"CRM 1234 Maria Souza")}),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["response"], "documents/maria.pdf");

  let (status, body) = post(
    &h.app,
    "/api/documents/verify_file",
    json!({"document_path": "documents/maria.pdf", "professional_name": "Maria Souza"}),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["response"], "Válido");
}

#[tokio::test]
async fn test_upload_validation_messages() {
  let h = harness(ScriptedChat::replying("unused")).await;

  let (status, body) =
    post(&h.app, "/api/documents/upload_file", json!({"filename": " ", "content": encode(b"x")})).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["errors"][0]["message"], "O nome do arquivo não pode ser vazio.");

  let (status, body) =
    post(&h.app, "/api/documents/upload_file", json!({"filename": "a.pdf", "content": "not base64!"})).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["errors"][0]["message"], "O conteúdo não é uma string base64 válida.");
}

#[tokio::test]
async fn test_verify_error_statuses() {
  let h = harness(ScriptedChat::replying("Válido")).await;

  let (status, body) = post(
    &h.app,
    "/api/documents/verify_file",
    json!({"document_path": "documents/missing.pdf", "professional_name": "Maria"}),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["errors"][0]["key"], "document_not_found");

  let (status, body) = post(
    &h.app,
    "/api/documents/verify_file",
    json!({"document_path": "documents/missing.pdf", "professional_name": ""}),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["errors"][0]["message"], "O nome do profissional não pode ser vazio.");

  let (status, body) = post(
    &h.app,
    "/api/documents/verify_file",
    json!({"document_path": "no-container.pdf", "professional_name": "Maria"}),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["errors"][0]["key"], "document_not_found");

  post(&h.app, "/api/documents/upload_file", json!({"filename": "blank.pdf", "content": encode(b"  ")})).await;
  let (status, body) = post(
    &h.app,
    "/api/documents/verify_file",
    json!({"document_path": "documents/blank.pdf", "professional_name": "Maria"}),
  )
  .await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["errors"][0]["key"], "verify_failed");
  assert!(h.chat.calls().is_empty());
}

#[tokio::test]
async fn test_verify_generation_failure_is_server_error() {
  let h = harness(ScriptedChat::failing()).await;

  let (status, _) =
    post(&h.app, "/api/documents/upload_file", json!({"filename": "cert.pdf", "content": encode(b"Nome: Maria")})).await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, body) = post(
    &h.app,
    "/api/documents/verify_file",
    json!({"document_path": "documents/cert.pdf", "professional_name": "Maria"}),
  )
  .await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["errors"][0]["key"], "verify_failed");
  assert_eq!(h.chat.calls().len(), 1);
}

#[tokio::test]
async fn test_status_and_schema_endpoints() {
  let h = harness(ScriptedChat::replying("unused")).await;

  let (status, body) = get(&h.app, "/status").await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "healthy");
  assert_eq!(body["index_name"], "faq-index");
  assert_eq!(body["embedding_dimension"], DIMENSION);

  let (status, body) = get(&h.app, "/api/schema").await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["schemas"]["UploadDocumentRequest"]["properties"].get("content").is_some());
}

#[tokio::test]
async fn test_requests_are_recorded_in_service_log() {
  let h = harness(ScriptedChat::replying("X is a managed service.")).await;

  let (_, answered) = post(&h.app, "/api/faq/chat", json!({"user_message": "What is X?"})).await;
  let transaction_id = answered["transaction_id"].as_str().unwrap().to_string();

  let (status, body) = get(&h.app, "/logs?limit=50").await;
  assert_eq!(status, StatusCode::OK);

  let logs = body["logs"].as_array().unwrap();
  let for_request: Vec<&Value> =
    logs.iter().filter(|entry| entry["context"]["request_id"] == transaction_id.as_str()).collect();

  assert!(for_request.iter().any(|entry| entry["message"] == "Request completed"
    && entry["context"]["status_code"] == 200
    && entry["context"]["path"] == "/api/faq/chat"));
  assert!(for_request.iter().any(|entry| entry["component"] == "faq-api"));
}
