//! Endpoint handlers and the shared error mapping

pub mod documents;
pub mod faq;
pub mod logs;
pub mod status;

use axum::{extract::rejection::JsonRejection, http::StatusCode, response::Json as ResponseJson};
use uuid::Uuid;

use crate::error::Error;
use crate::server::middleware::RequestContext;
use crate::server::types::{ApiError, BaseResponse};

/// Error half of every handler result
pub type ErrorResponse = (StatusCode, ResponseJson<BaseResponse<()>>);

pub fn error_response(status: StatusCode, key: &str, message: &str, transaction_id: Uuid) -> ErrorResponse {
  let error = ApiError::new(key, message);
  (status, ResponseJson(BaseResponse::<()>::error(vec![error], transaction_id)))
}

/// `Validation` → 422, `NotFound` → 404, anything else → 500 under `fallback_key`
pub fn pipeline_failure(error: &Error, fallback_key: &str, transaction_id: Uuid) -> ErrorResponse {
  match error {
    Error::Validation(message) => {
      error_response(StatusCode::UNPROCESSABLE_ENTITY, error.key(), message, transaction_id)
    }
    Error::NotFound(_) => {
      error_response(StatusCode::NOT_FOUND, "document_not_found", &error.to_string(), transaction_id)
    }
    _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, fallback_key, &error.to_string(), transaction_id),
  }
}

/// Log a rejected JSON body and turn it into a 422 envelope
pub async fn rejected_body(context: &RequestContext, rejection: JsonRejection, component: &str) -> ErrorResponse {
  let message = rejection.body_text();
  context.log_warn(&format!("Rejected request body: {message}"), component).await;
  error_response(StatusCode::UNPROCESSABLE_ENTITY, "validation_failed", &message, context.request_id)
}

/// 422 for a blank required field
pub async fn blank_field(context: &RequestContext, message: &str, component: &str) -> ErrorResponse {
  context.log_warn(message, component).await;
  error_response(StatusCode::UNPROCESSABLE_ENTITY, "validation_failed", message, context.request_id)
}
