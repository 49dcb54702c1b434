//! Text embedding clients
//!
//! [`Embedder`] turns text into a fixed-length vector. The Azure OpenAI client
//! is used in production; [`HashedTermEmbedder`] is a deterministic offline
//! stand-in for tests and for running without an embedding deployment.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::services::http;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
  /// Embed one text
  async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
  input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
  data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
  embedding: Vec<f32>,
}

/// Azure OpenAI embeddings deployment
pub struct AzureOpenAiEmbeddings {
  client: reqwest::Client,
  endpoint: String,
  api_key: String,
  api_version: String,
  deployment: String,
}

impl AzureOpenAiEmbeddings {
  pub fn new(
    endpoint: impl Into<String>,
    api_key: impl Into<String>,
    api_version: impl Into<String>,
    deployment: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self> {
    Ok(Self {
      client: http::build_client(timeout)?,
      endpoint: endpoint.into(),
      api_key: api_key.into(),
      api_version: api_version.into(),
      deployment: deployment.into(),
    })
  }

  fn url(&self) -> String {
    http::join(
      &self.endpoint,
      &format!("openai/deployments/{}/embeddings?api-version={}", self.deployment, self.api_version),
    )
  }
}

#[async_trait]
impl Embedder for AzureOpenAiEmbeddings {
  async fn embed(&self, text: &str) -> Result<Vec<f32>> {
    if text.trim().is_empty() {
      return Err(Error::Embedding("cannot embed empty text".to_string()));
    }

    let response = self
      .client
      .post(self.url())
      .header("api-key", &self.api_key)
      .json(&EmbeddingRequest { input: [text] })
      .send()
      .await
      .map_err(|e| Error::Embedding(format!("request to embedding deployment failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(Error::Embedding(http::describe_failure(status, &body)));
    }

    let parsed: EmbeddingResponse = response
      .json()
      .await
      .map_err(|e| Error::Embedding(format!("unreadable embedding response: {e}")))?;

    let embedding = parsed
      .data
      .into_iter()
      .next()
      .map(|data| data.embedding)
      .ok_or_else(|| Error::Embedding("embedding response contained no vectors".to_string()))?;

    tracing::debug!(deployment = %self.deployment, dimension = embedding.len(), "computed embedding");
    Ok(embedding)
  }
}

/// Deterministic feature-hashing embedder
///
/// Lower-cased alphanumeric terms are hashed into `dimension` signed buckets
/// and the result is L2-normalised, so texts sharing vocabulary land close
/// together under cosine similarity.
#[derive(Debug, Clone)]
pub struct HashedTermEmbedder {
  dimension: usize,
}

impl HashedTermEmbedder {
  pub fn new(dimension: usize) -> Self {
    Self { dimension: dimension.max(1) }
  }

  pub fn embed_sync(&self, text: &str) -> Result<Vec<f32>> {
    let mut vector = vec![0.0f32; self.dimension];
    let mut terms = 0usize;

    for term in terms_of(text) {
      let hash = fnv1a(term.as_bytes());
      let bucket = (hash % self.dimension as u64) as usize;
      let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
      vector[bucket] += sign;
      terms += 1;
    }

    if terms == 0 {
      return Err(Error::Embedding("cannot embed text without terms".to_string()));
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
      vector.iter_mut().for_each(|v| *v /= norm);
    }
    Ok(vector)
  }
}

#[async_trait]
impl Embedder for HashedTermEmbedder {
  async fn embed(&self, text: &str) -> Result<Vec<f32>> {
    self.embed_sync(text)
  }
}

fn terms_of(text: &str) -> impl Iterator<Item = String> + '_ {
  text
    .split(|c: char| !c.is_alphanumeric())
    .filter(|term| !term.is_empty())
    .map(|term| term.to_lowercase())
}

fn fnv1a(bytes: &[u8]) -> u64 {
  let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
  for byte in bytes {
    hash ^= u64::from(*byte);
    hash = hash.wrapping_mul(0x0100_0000_01b3);
  }
  hash
}
