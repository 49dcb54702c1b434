//! Axum router configuration for all endpoints

use axum::{
  middleware::from_fn_with_state,
  routing::{get, post},
  Router,
};

use crate::server::handlers::{documents, faq, logs, status};
use crate::server::middleware::request_context_middleware;
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
  Router::new()
    // Status and version endpoints
    .route("/status", get(status::status))
    .route("/version", get(status::version))
    .route("/api", get(status::api_info))
    .route("/api/schema", get(status::api_schema))
    .route("/logs", get(logs::get_logs))
    // Pipelines
    .route("/api/faq/chat", post(faq::chat))
    .route("/api/documents/upload_file", post(documents::upload_file))
    .route("/api/documents/verify_file", post(documents::verify_file))
    .layer(from_fn_with_state(state.clone(), request_context_middleware))
    .with_state(state)
}
