//! Document text extraction

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::services::http;

pub const API_VERSION: &str = "2023-07-31";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextExtractor: Send + Sync {
  /// Extract the full text of a document; may be empty
  async fn extract(&self, bytes: &[u8]) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct AnalyzeOperation {
  status: String,
  #[serde(rename = "analyzeResult")]
  analyze_result: Option<AnalyzeResult>,
  error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
  #[serde(default)]
  content: String,
}

#[derive(Debug, Deserialize)]
struct OperationError {
  message: Option<String>,
}

/// Azure AI Document Intelligence `prebuilt-read` model
pub struct AzureDocumentIntelligence {
  client: reqwest::Client,
  endpoint: String,
  api_key: String,
  poll_interval: Duration,
  max_polls: u32,
}

impl AzureDocumentIntelligence {
  pub fn new(
    endpoint: impl Into<String>,
    api_key: impl Into<String>,
    timeout: Duration,
    poll_interval: Duration,
    max_polls: u32,
  ) -> Result<Self> {
    Ok(Self {
      client: http::build_client(timeout)?,
      endpoint: endpoint.into(),
      api_key: api_key.into(),
      poll_interval,
      max_polls: max_polls.max(1),
    })
  }

  async fn submit(&self, bytes: &[u8]) -> Result<String> {
    let url = http::join(
      &self.endpoint,
      &format!("formrecognizer/documentModels/prebuilt-read:analyze?api-version={API_VERSION}"),
    );
    let response = self
      .client
      .post(url)
      .header("Ocp-Apim-Subscription-Key", &self.api_key)
      .header("Content-Type", "application/octet-stream")
      .body(bytes.to_vec())
      .send()
      .await
      .map_err(|e| Error::Extraction(format!("analyze request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(Error::Extraction(http::describe_failure(status, &body)));
    }

    response
      .headers()
      .get("Operation-Location")
      .and_then(|value| value.to_str().ok())
      .map(str::to_string)
      .ok_or_else(|| Error::Extraction("analyze response has no Operation-Location".to_string()))
  }

  async fn poll(&self, operation: &str) -> Result<String> {
    for attempt in 1..=self.max_polls {
      let response = self
        .client
        .get(operation)
        .header("Ocp-Apim-Subscription-Key", &self.api_key)
        .send()
        .await
        .map_err(|e| Error::Extraction(format!("polling analyze result failed: {e}")))?;

      let status = response.status();
      if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Extraction(http::describe_failure(status, &body)));
      }

      let operation_state: AnalyzeOperation = response
        .json()
        .await
        .map_err(|e| Error::Extraction(format!("unreadable analyze result: {e}")))?;

      match operation_state.status.as_str() {
        "succeeded" => {
          return Ok(operation_state.analyze_result.map(|result| result.content).unwrap_or_default())
        }
        "failed" => {
          let reason = operation_state
            .error
            .and_then(|error| error.message)
            .unwrap_or_else(|| "no reason given".to_string());
          return Err(Error::Extraction(format!("analysis failed: {reason}")));
        }
        other => {
          tracing::debug!(attempt, status = other, "document analysis still running");
          if attempt < self.max_polls {
            tokio::time::sleep(self.poll_interval).await;
          }
        }
      }
    }

    Err(Error::Extraction(format!("analysis did not finish after {} polls", self.max_polls)))
  }
}

#[async_trait]
impl TextExtractor for AzureDocumentIntelligence {
  async fn extract(&self, bytes: &[u8]) -> Result<String> {
    let operation = self.submit(bytes).await?;
    let content = self.poll(&operation).await?;
    tracing::info!(chars = content.len(), "extracted document text");
    Ok(content)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::{Matcher, Server};

  fn extractor(url: String, max_polls: u32) -> AzureDocumentIntelligence {
    AzureDocumentIntelligence::new(url, "ocr-key", Duration::from_secs(5), Duration::from_millis(1), max_polls).unwrap()
  }

  #[tokio::test]
  async fn test_extract_submits_and_polls_until_succeeded() {
    let mut server = Server::new_async().await;
    let operation = format!("{}/operations/42", server.url());

    let submit = server
      .mock("POST", "/formrecognizer/documentModels/prebuilt-read:analyze")
      .match_query(Matcher::UrlEncoded("api-version".into(), API_VERSION.into()))
      .match_header("Ocp-Apim-Subscription-Key", "ocr-key")
      .match_body("pdf")
      .with_status(202)
      .with_header("Operation-Location", &operation)
      .create_async()
      .await;
    let running = server
      .mock("GET", "/operations/42")
      .with_status(200)
      .with_body(r#"{"status": "running"}"#)
      .expect(1)
      .create_async()
      .await;
    let done = server
      .mock("GET", "/operations/42")
      .with_status(200)
      .with_body(r#"{"status": "succeeded", "analyzeResult": {"content": "Nome: Maria\nCRM 1234"}}"#)
      .create_async()
      .await;

    let text = extractor(server.url(), 5).extract(b"pdf").await.unwrap();
    assert_eq!(text, "Nome: Maria\nCRM 1234");
    submit.assert_async().await;
    running.assert_async().await;
    done.assert_async().await;
  }

  #[tokio::test]
  async fn test_failed_analysis_is_extraction_error() {
    let mut server = Server::new_async().await;
    let operation = format!("{}/operations/7", server.url());
    let _submit = server
      .mock("POST", "/formrecognizer/documentModels/prebuilt-read:analyze")
      .match_query(Matcher::Any)
      .with_status(202)
      .with_header("Operation-Location", &operation)
      .create_async()
      .await;
    let _poll = server
      .mock("GET", "/operations/7")
      .with_status(200)
      .with_body(r#"{"status": "failed", "error": {"code": "InvalidContent", "message": "corrupt file"}}"#)
      .create_async()
      .await;

    let err = extractor(server.url(), 3).extract(b"pdf").await.unwrap_err();
    assert!(matches!(err, Error::Extraction(_)));
    assert!(err.to_string().contains("corrupt file"));
  }

  #[tokio::test]
  async fn test_poll_budget_is_bounded() {
    let mut server = Server::new_async().await;
    let operation = format!("{}/operations/9", server.url());
    let _submit = server
      .mock("POST", "/formrecognizer/documentModels/prebuilt-read:analyze")
      .match_query(Matcher::Any)
      .with_status(202)
      .with_header("Operation-Location", &operation)
      .create_async()
      .await;
    let poll = server
      .mock("GET", "/operations/9")
      .with_status(200)
      .with_body(r#"{"status": "running"}"#)
      .expect(2)
      .create_async()
      .await;

    let err = extractor(server.url(), 2).extract(b"pdf").await.unwrap_err();
    assert!(err.to_string().contains("did not finish"));
    poll.assert_async().await;
  }

  #[tokio::test]
  async fn test_exhausted_budget_does_not_wait_after_last_poll() {
    let mut server = Server::new_async().await;
    let operation = format!("{}/operations/11", server.url());
    let _submit = server
      .mock("POST", "/formrecognizer/documentModels/prebuilt-read:analyze")
      .match_query(Matcher::Any)
      .with_status(202)
      .with_header("Operation-Location", &operation)
      .create_async()
      .await;
    let _poll = server
      .mock("GET", "/operations/11")
      .with_status(200)
      .with_body(r#"{"status": "running"}"#)
      .create_async()
      .await;

    let slow = AzureDocumentIntelligence::new(
      server.url(),
      "ocr-key",
      Duration::from_secs(5),
      Duration::from_secs(30),
      1,
    )
    .unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), slow.extract(b"pdf")).await;
    let err = result.expect("gave up without sleeping").unwrap_err();
    assert!(err.to_string().contains("did not finish after 1 polls"));
  }

  #[tokio::test]
  async fn test_rejected_submission_is_extraction_error() {
    let mut server = Server::new_async().await;
    let _submit = server
      .mock("POST", "/formrecognizer/documentModels/prebuilt-read:analyze")
      .match_query(Matcher::Any)
      .with_status(401)
      .with_body(r#"{"error": {"code": "401", "message": "invalid subscription key"}}"#)
      .create_async()
      .await;

    let err = extractor(server.url(), 2).extract(b"pdf").await.unwrap_err();
    assert!(err.to_string().contains("invalid subscription key"));
  }
}
