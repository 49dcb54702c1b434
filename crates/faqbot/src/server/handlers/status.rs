//! Status, version and schema endpoint handlers

use axum::{extract::State, response::Json};
use schemars::JsonSchema;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::server::state::AppState;
use crate::server::types::{
  ApiInfoResponse, ApiVersions, BaseResponse, FaqRequest, FaqResponse, LogsQuery, LogsResponse, SchemaResponse,
  StatusResponse, UploadDocumentRequest, UploadDocumentResponse, VerifyDocumentRequest, VerifyDocumentResponse,
  VersionResponse,
};

/// GET /status - Health check endpoint
pub async fn status(State(state): State<AppState>) -> Json<BaseResponse<StatusResponse>> {
  let response = StatusResponse {
    status: "healthy".to_string(),
    version: env!("CARGO_PKG_VERSION").to_string(),
    index_name: state.schema.name.clone(),
    embedding_dimension: state.schema.dimension,
  };

  Json(BaseResponse::success(response, Uuid::new_v4()))
}

/// GET /version - Returns current API version
pub async fn version() -> Json<BaseResponse<VersionResponse>> {
  let response = VersionResponse { version: env!("CARGO_PKG_VERSION").to_string() };
  Json(BaseResponse::success(response, Uuid::new_v4()))
}

/// GET /api - Returns API information and supported versions
pub async fn api_info() -> Json<BaseResponse<ApiInfoResponse>> {
  let version = env!("CARGO_PKG_VERSION");
  let response = ApiInfoResponse {
    latest: version.to_string(),
    versions: ApiVersions { latest: version.to_string(), active: vec![version.to_string()] },
  };

  Json(BaseResponse::success(response, Uuid::new_v4()))
}

fn schema_of<T: JsonSchema>() -> serde_json::Value {
  serde_json::to_value(schemars::schema_for!(T)).unwrap_or_default()
}

/// GET /api/schema - JSON schemas of the request and response bodies
pub async fn api_schema() -> Json<BaseResponse<SchemaResponse>> {
  let schemas = BTreeMap::from([
    ("FaqRequest".to_string(), schema_of::<FaqRequest>()),
    ("FaqResponse".to_string(), schema_of::<FaqResponse>()),
    ("UploadDocumentRequest".to_string(), schema_of::<UploadDocumentRequest>()),
    ("UploadDocumentResponse".to_string(), schema_of::<UploadDocumentResponse>()),
    ("VerifyDocumentRequest".to_string(), schema_of::<VerifyDocumentRequest>()),
    ("VerifyDocumentResponse".to_string(), schema_of::<VerifyDocumentResponse>()),
    ("LogsQuery".to_string(), schema_of::<LogsQuery>()),
    ("LogsResponse".to_string(), schema_of::<LogsResponse>()),
    ("StatusResponse".to_string(), schema_of::<StatusResponse>()),
  ]);

  Json(BaseResponse::success(SchemaResponse { schemas }, Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_api_schema_describes_request_fields() {
    let Json(response) = api_schema().await;
    let faq = &response.data.schemas["FaqRequest"];
    assert!(faq["properties"].get("user_message").is_some());

    let verify = &response.data.schemas["VerifyDocumentRequest"];
    assert!(verify["properties"].get("professional_name").is_some());
  }

  #[tokio::test]
  async fn test_api_info_lists_current_version() {
    let Json(response) = api_info().await;
    assert_eq!(response.data.latest, env!("CARGO_PKG_VERSION"));
    assert_eq!(response.data.versions.active, vec![env!("CARGO_PKG_VERSION").to_string()]);
  }
}
