//! REST API types with schemars annotations for schema generation

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// Base Response Structure
// ======================

/// Base response object for all API endpoints
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BaseResponse<T> {
  /// API versioning information
  pub versioning: VersionInfo,

  /// Transaction ID for logging correlation
  pub transaction_id: Uuid,

  /// Optional error information
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub errors: Vec<ApiError>,

  /// Response data (generic for different endpoint types)
  #[serde(flatten)]
  pub data: T,
}

/// API versioning information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionInfo {
  /// The latest version of the API
  pub latest: String,

  /// The version of the API requested by the client
  pub requested: String,

  /// The version of the API that was used in producing the response
  pub resolved: String,
}

impl VersionInfo {
  fn current() -> Self {
    let version = env!("CARGO_PKG_VERSION");
    Self { latest: version.to_string(), requested: version.to_string(), resolved: version.to_string() }
  }
}

/// API error information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiError {
  /// Error key, unique to the error source
  pub key: String,

  /// Human readable error message
  pub message: String,
}

impl<T> BaseResponse<T> {
  /// Create a successful response
  pub fn success(data: T, transaction_id: Uuid) -> Self {
    Self { versioning: VersionInfo::current(), transaction_id, errors: Vec::new(), data }
  }

  /// Create an error response
  pub fn error(errors: Vec<ApiError>, transaction_id: Uuid) -> BaseResponse<()> {
    BaseResponse { versioning: VersionInfo::current(), transaction_id, errors, data: () }
  }
}

impl ApiError {
  /// Create a new API error
  pub fn new(key: &str, message: &str) -> Self {
    Self { key: key.to_string(), message: message.to_string() }
  }
}

// Status/Version Endpoints
// =======================

/// Response for /status endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StatusResponse {
  /// Service health
  pub status: String,

  /// Server version
  pub version: String,

  /// Vector index the server answers from
  pub index_name: String,

  /// Embedding width of that index
  pub embedding_dimension: usize,
}

/// Response for /version endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionResponse {
  /// Current API version
  pub version: String,
}

/// Response for /api endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiInfoResponse {
  /// Latest API version
  pub latest: String,

  /// Version information
  pub versions: ApiVersions,
}

/// API version details
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiVersions {
  /// Latest version
  pub latest: String,

  /// Currently active versions
  pub active: Vec<String>,
}

/// Response for /api/schema endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SchemaResponse {
  /// JSON schema of every request and response body, by type name
  pub schemas: BTreeMap<String, serde_json::Value>,
}

// Logs Endpoint
// =============

/// Query string for /logs
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct LogsQuery {
  /// Newest entries to return (default 100)
  pub limit: Option<usize>,

  /// Only entries of this level; `all` disables the filter
  pub level: Option<String>,
}

/// Response for /logs endpoint
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LogsResponse {
  /// JSON log entries, oldest first
  pub logs: Vec<LogEntry>,
}

/// Individual log entry (re-exported from bentley)
pub type LogEntry = bentley::service_log::LogEntry;

/// Request context information for logs (re-exported from bentley)
pub type LogContext = bentley::service_log::LogContext;

// FAQ Endpoint
// ============

/// Request for /api/faq/chat
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FaqRequest {
  /// The user's question
  pub user_message: String,
}

/// Response for /api/faq/chat
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct FaqResponse {
  /// Answer grounded in the FAQ, or a polite decline
  pub response: String,
}

// Document Endpoints
// ==================

/// Request for /api/documents/upload_file
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UploadDocumentRequest {
  /// File name inside the documents container
  pub filename: String,

  /// File content, base64 encoded
  pub content: String,
}

/// Response for /api/documents/upload_file
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UploadDocumentResponse {
  /// Storage reference, e.g. `documents/file.pdf`
  pub response: String,
}

/// Request for /api/documents/verify_file
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VerifyDocumentRequest {
  /// Storage reference, e.g. `documents/file.pdf`
  pub document_path: String,

  /// Name that must appear on the certificate
  pub professional_name: String,
}

/// Response for /api/documents/verify_file
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VerifyDocumentResponse {
  /// The judgment, `Válido` or `Inválido`
  pub response: String,
}
