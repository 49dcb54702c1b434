//! Document upload and certificate verification handlers

use axum::{
  extract::{rejection::JsonRejection, Extension, Json, State},
  http::StatusCode,
  response::Json as ResponseJson,
};

use crate::error::Error;
use crate::server::handlers::{blank_field, pipeline_failure, rejected_body, ErrorResponse};
use crate::server::{
  middleware::RequestContext,
  state::AppState,
  types::{BaseResponse, UploadDocumentRequest, UploadDocumentResponse, VerifyDocumentRequest, VerifyDocumentResponse},
};
use crate::services::storage::BlobPath;

const COMPONENT: &str = "documents-api";

/// POST /api/documents/upload_file - Store a base64 document, 201 with its path
pub async fn upload_file(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  payload: Result<Json<UploadDocumentRequest>, JsonRejection>,
) -> Result<(StatusCode, ResponseJson<BaseResponse<UploadDocumentResponse>>), ErrorResponse> {
  let Json(request) = match payload {
    Ok(payload) => payload,
    Err(rejection) => return Err(rejected_body(&context, rejection, COMPONENT).await),
  };

  if request.filename.trim().is_empty() {
    return Err(blank_field(&context, "O nome do arquivo não pode ser vazio.", COMPONENT).await);
  }

  match state.uploader.upload(&request.filename, &request.content).await {
    Ok(path) => {
      context.log_success(&format!("Uploaded {path}"), COMPONENT).await;
      let response = UploadDocumentResponse { response: path.to_string() };
      Ok((StatusCode::CREATED, ResponseJson(BaseResponse::success(response, context.request_id))))
    }
    Err(e) => {
      context.log_error(&format!("Upload of '{}' failed: {e}", request.filename), COMPONENT).await;
      Err(pipeline_failure(&e, "upload_failed", context.request_id))
    }
  }
}

/// POST /api/documents/verify_file - Judge a stored certificate
pub async fn verify_file(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  payload: Result<Json<VerifyDocumentRequest>, JsonRejection>,
) -> Result<ResponseJson<BaseResponse<VerifyDocumentResponse>>, ErrorResponse> {
  let Json(request) = match payload {
    Ok(payload) => payload,
    Err(rejection) => return Err(rejected_body(&context, rejection, COMPONENT).await),
  };

  if request.document_path.trim().is_empty() {
    return Err(blank_field(&context, "O caminho do arquivo não pode ser vazio.", COMPONENT).await);
  }
  if request.professional_name.trim().is_empty() {
    return Err(blank_field(&context, "O nome do profissional não pode ser vazio.", COMPONENT).await);
  }

  // A path that names no blob cannot be found
  let result = match request.document_path.trim().parse::<BlobPath>() {
    Ok(path) => state.verifier.verify(&path, request.professional_name.trim()).await,
    Err(_) => Err(Error::NotFound(request.document_path.clone())),
  };

  match result {
    Ok(judgment) => {
      context.log_success(&format!("Verified {}: {judgment}", request.document_path), COMPONENT).await;
      Ok(ResponseJson(BaseResponse::success(VerifyDocumentResponse { response: judgment }, context.request_id)))
    }
    Err(e) => {
      context.log_error(&format!("Verification of '{}' failed: {e}", request.document_path), COMPONENT).await;
      Err(pipeline_failure(&e, "verify_failed", context.request_id))
    }
  }
}
