//! Vector index abstraction
//!
//! Every backend satisfies the same filtered nearest-neighbour contract, so the
//! document store and the pipelines never see which service holds the vectors.

use async_trait::async_trait;
use serde_json::json;

use crate::error::Result;
use crate::models::{Document, Filter, SearchHit};

/// Fixed index layout: `id`, `type`, `content` and a cosine `embedding` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
  pub name: String,
  pub dimension: usize,
}

impl IndexSchema {
  pub const DEFAULT_NAME: &'static str = "faq-index";
  pub const DEFAULT_DIMENSION: usize = 1536;

  pub fn new(name: impl Into<String>, dimension: usize) -> Self {
    Self { name: name.into(), dimension }
  }

  /// Azure AI Search index definition for this schema
  pub fn to_azure_definition(&self) -> serde_json::Value {
    json!({
      "name": self.name,
      "fields": [
        {"name": "id", "type": "Edm.String", "key": true, "filterable": true},
        {"name": "type", "type": "Edm.String", "filterable": true, "searchable": true},
        {"name": "content", "type": "Edm.String", "searchable": true, "filterable": true},
        {
          "name": "embedding",
          "type": "Collection(Edm.Single)",
          "searchable": true,
          "dimensions": self.dimension,
          "vectorSearchProfile": "faq-vector-profile"
        }
      ],
      "vectorSearch": {
        "algorithms": [
          {
            "name": "faq-exhaustive-knn",
            "kind": "exhaustiveKnn",
            "exhaustiveKnnParameters": {"metric": "cosine"}
          }
        ],
        "profiles": [
          {"name": "faq-vector-profile", "algorithm": "faq-exhaustive-knn"}
        ]
      }
    })
  }
}

impl Default for IndexSchema {
  fn default() -> Self {
    Self::new(Self::DEFAULT_NAME, Self::DEFAULT_DIMENSION)
  }
}

/// Filtered nearest-neighbour index over stored documents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorIndex: Send + Sync {
  /// Names of every index the backend holds
  async fn list_index_names(&self) -> Result<Vec<String>>;

  /// Create the index, or update it in place when it already exists
  async fn create_or_update_index(&self, schema: &IndexSchema) -> Result<()>;

  /// Insert or replace documents by id
  async fn upsert(&self, index: &str, documents: &[Document]) -> Result<()>;

  /// Up to `k` documents matching `filter`, most similar first
  async fn search(&self, index: &str, vector: &[f32], k: usize, filter: &Filter) -> Result<Vec<SearchHit>>;
}

/// Cosine similarity; zero when either vector has no magnitude
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
  let mut dot = 0.0f32;
  let mut norm_a = 0.0f32;
  let mut norm_b = 0.0f32;
  for (x, y) in a.iter().zip(b) {
    dot += x * y;
    norm_a += x * x;
    norm_b += y * y;
  }
  if norm_a == 0.0 || norm_b == 0.0 {
    return 0.0;
  }
  dot / (norm_a.sqrt() * norm_b.sqrt())
}
