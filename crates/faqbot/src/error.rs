//! Error taxonomy shared by both pipelines

use thiserror::Error;

/// Result alias for faqbot operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
  /// A stored document or blob does not exist
  #[error("not found: {0}")]
  NotFound(String),

  /// The embedding service failed or returned nothing usable
  #[error("embedding error: {0}")]
  Embedding(String),

  /// A vector does not match the index dimension
  #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
  DimensionMismatch { expected: usize, actual: usize },

  /// Index creation, upsert or search failed
  #[error("index error: {0}")]
  Index(String),

  /// The OCR service failed
  #[error("text extraction failed: {0}")]
  Extraction(String),

  /// The OCR service succeeded but produced no text
  #[error("no text was extracted from the document")]
  EmptyExtraction,

  /// The chat model call failed
  #[error("generation error: {0}")]
  Generation(String),

  /// Blob storage failed
  #[error("storage error: {0}")]
  Storage(String),

  /// Malformed input rejected before it reaches a pipeline
  #[error("invalid input: {0}")]
  Validation(String),

  /// Missing or inconsistent settings
  #[error("configuration error: {0}")]
  Config(String),
}

impl Error {
  /// Stable key used in API error envelopes
  pub fn key(&self) -> &'static str {
    match self {
      Error::NotFound(_) => "not_found",
      Error::Embedding(_) => "embedding_failed",
      Error::DimensionMismatch { .. } => "dimension_mismatch",
      Error::Index(_) => "index_failed",
      Error::Extraction(_) => "extraction_failed",
      Error::EmptyExtraction => "empty_extraction",
      Error::Generation(_) => "generation_failed",
      Error::Storage(_) => "storage_failed",
      Error::Validation(_) => "validation_failed",
      Error::Config(_) => "config_invalid",
    }
  }
}
