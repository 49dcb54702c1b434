//! Shared plumbing for the upstream REST clients

use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Build the reqwest client shared by one upstream service
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
  reqwest::Client::builder()
    .timeout(timeout)
    .user_agent(concat!("faqbot/", env!("CARGO_PKG_VERSION")))
    .build()
    .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))
}

/// Join an endpoint base with a path, tolerating trailing slashes
pub fn join(endpoint: &str, path: &str) -> String {
  format!("{}/{}", endpoint.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
  error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
  code: Option<String>,
  message: Option<String>,
}

/// Describe a failed upstream response as `HTTP <status>: <message>`
///
/// Azure services wrap failures as `{"error": {"code", "message"}}`; anything
/// else is reported verbatim.
pub fn describe_failure(status: reqwest::StatusCode, body: &str) -> String {
  let detail = serde_json::from_str::<ErrorEnvelope>(body)
    .ok()
    .and_then(|envelope| envelope.error)
    .map(|detail| match (detail.code, detail.message) {
      (Some(code), Some(message)) => format!("{code}: {message}"),
      (None, Some(message)) => message,
      (Some(code), None) => code,
      (None, None) => body.to_string(),
    })
    .unwrap_or_else(|| body.trim().to_string());

  if detail.is_empty() {
    format!("HTTP {}", status.as_u16())
  } else {
    format!("HTTP {}: {detail}", status.as_u16())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_build_client_with_timeout() {
    assert!(build_client(Duration::from_secs(5)).is_ok());
  }

  #[test]
  fn test_join_trims_slashes() {
    assert_eq!(join("https://x.example/", "/indexes"), "https://x.example/indexes");
    assert_eq!(join("https://x.example", "indexes"), "https://x.example/indexes");
  }

  #[test]
  fn test_describe_azure_error_envelope() {
    let body = r#"{"error": {"code": "401", "message": "Access denied"}}"#;
    let message = describe_failure(reqwest::StatusCode::UNAUTHORIZED, body);
    assert_eq!(message, "HTTP 401: 401: Access denied");
  }

  #[test]
  fn test_describe_plain_body() {
    let message = describe_failure(reqwest::StatusCode::BAD_GATEWAY, "upstream down\n");
    assert_eq!(message, "HTTP 502: upstream down");

    let message = describe_failure(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "");
    assert_eq!(message, "HTTP 500");
  }
}
