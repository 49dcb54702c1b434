//! In-process vector index with exhaustive cosine search

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::models::{Document, Filter, SearchHit};
use crate::services::vector_database::{cosine_similarity, IndexSchema, VectorIndex};

struct StoredIndex {
  dimension: usize,
  /// Insertion order, used to break score ties
  documents: Vec<Document>,
}

/// Exhaustive kNN over documents held in memory
#[derive(Default)]
pub struct MemoryIndex {
  indexes: RwLock<HashMap<String, StoredIndex>>,
  creations: AtomicUsize,
}

impl MemoryIndex {
  pub fn new() -> Self {
    Self::default()
  }

  /// How many times an index was created (updates of an existing index excluded)
  pub fn creation_count(&self) -> usize {
    self.creations.load(Ordering::SeqCst)
  }

  pub async fn document_count(&self, index: &str) -> usize {
    self.indexes.read().await.get(index).map(|stored| stored.documents.len()).unwrap_or(0)
  }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
  async fn list_index_names(&self) -> Result<Vec<String>> {
    let mut names: Vec<String> = self.indexes.read().await.keys().cloned().collect();
    names.sort();
    Ok(names)
  }

  async fn create_or_update_index(&self, schema: &IndexSchema) -> Result<()> {
    let mut indexes = self.indexes.write().await;
    match indexes.get_mut(&schema.name) {
      Some(existing) => {
        if existing.dimension != schema.dimension && !existing.documents.is_empty() {
          return Err(Error::Index(format!(
            "index '{}' already holds {}-dimensional vectors",
            schema.name, existing.dimension
          )));
        }
        existing.dimension = schema.dimension;
      }
      None => {
        indexes.insert(
          schema.name.clone(),
          StoredIndex { dimension: schema.dimension, documents: Vec::new() },
        );
        self.creations.fetch_add(1, Ordering::SeqCst);
      }
    }
    Ok(())
  }

  async fn upsert(&self, index: &str, documents: &[Document]) -> Result<()> {
    let mut indexes = self.indexes.write().await;
    let stored = indexes
      .get_mut(index)
      .ok_or_else(|| Error::Index(format!("index '{index}' does not exist")))?;

    for document in documents {
      if document.embedding.len() != stored.dimension {
        return Err(Error::DimensionMismatch {
          expected: stored.dimension,
          actual: document.embedding.len(),
        });
      }
    }

    for document in documents {
      match stored.documents.iter_mut().find(|existing| existing.id == document.id) {
        Some(existing) => *existing = document.clone(),
        None => stored.documents.push(document.clone()),
      }
    }
    Ok(())
  }

  async fn search(&self, index: &str, vector: &[f32], k: usize, filter: &Filter) -> Result<Vec<SearchHit>> {
    let indexes = self.indexes.read().await;
    let stored =
      indexes.get(index).ok_or_else(|| Error::Index(format!("index '{index}' does not exist")))?;

    if vector.len() != stored.dimension {
      return Err(Error::DimensionMismatch { expected: stored.dimension, actual: vector.len() });
    }

    let mut scored: Vec<(f32, &Document)> = stored
      .documents
      .iter()
      .filter(|document| filter.matches(document))
      .map(|document| (cosine_similarity(vector, &document.embedding), document))
      .collect();

    // Stable sort keeps insertion order among equal scores
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    Ok(
      scored
        .into_iter()
        .take(k)
        .map(|(score, document)| SearchHit {
          id: document.id.clone(),
          kind: document.kind.clone(),
          content: document.content.clone(),
          score,
        })
        .collect(),
    )
  }
}
