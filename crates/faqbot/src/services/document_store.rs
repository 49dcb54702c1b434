//! Document store: embedding plus vector index behind one API
//!
//! The store owns the index schema. It embeds content on insert, rejects
//! vectors of the wrong width, and embeds queries before searching.

use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Document, DocumentContent, FaqRecord, Filter, NewDocument, SearchHit};
use crate::services::embeddings::Embedder;
use crate::services::vector_database::{IndexSchema, VectorIndex};

/// Outcome of [`DocumentStore::ensure_index`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
  Created,
  AlreadyExists,
}

/// Summary of a bulk FAQ load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkInsertReport {
  pub inserted: Vec<String>,
  pub failed: usize,
}

#[derive(Clone)]
pub struct DocumentStore {
  index: Arc<dyn VectorIndex>,
  embedder: Arc<dyn Embedder>,
  schema: IndexSchema,
}

impl DocumentStore {
  /// Build the store without touching the index
  pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>, schema: IndexSchema) -> Self {
    Self { index, embedder, schema }
  }

  /// Build the store and make sure its index exists
  ///
  /// A failure to create the index is logged and swallowed; later searches
  /// against the missing index report their own errors.
  pub async fn open(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>, schema: IndexSchema) -> Self {
    let store = Self::new(index, embedder, schema);
    match store.ensure_index().await {
      Ok(IndexStatus::Created) => {
        tracing::info!(index = %store.schema.name, "created vector index");
      }
      Ok(IndexStatus::AlreadyExists) => {
        tracing::debug!(index = %store.schema.name, "vector index already exists");
      }
      Err(e) => {
        tracing::error!(index = %store.schema.name, error = %e, "failed to ensure vector index");
      }
    }
    store
  }

  pub fn schema(&self) -> &IndexSchema {
    &self.schema
  }

  /// Create the index when it is absent
  pub async fn ensure_index(&self) -> Result<IndexStatus> {
    let names = self.index.list_index_names().await?;
    if names.iter().any(|name| name == &self.schema.name) {
      return Ok(IndexStatus::AlreadyExists);
    }
    self.index.create_or_update_index(&self.schema).await?;
    Ok(IndexStatus::Created)
  }

  /// Embed (when needed), validate and store one document, returning its id
  pub async fn insert(&self, document: NewDocument) -> Result<String> {
    let content = document.content.encode()?;
    let embedding = match document.embedding {
      Some(embedding) => embedding,
      None => self.embedder.embed(&content).await?,
    };

    if embedding.len() != self.schema.dimension {
      return Err(Error::DimensionMismatch { expected: self.schema.dimension, actual: embedding.len() });
    }

    let stored = Document {
      id: Uuid::new_v4().to_string(),
      kind: document.content.kind(),
      content,
      embedding,
    };
    self.index.upsert(&self.schema.name, std::slice::from_ref(&stored)).await?;

    tracing::debug!(index = %self.schema.name, id = %stored.id, kind = %stored.kind, "inserted document");
    Ok(stored.id)
  }

  /// Embed `query` and return up to `k` hits; the filter defaults to `type eq 'doc'`
  pub async fn search(&self, query: &str, k: usize, filter: Option<&Filter>) -> Result<Vec<SearchHit>> {
    if k == 0 {
      return Err(Error::Validation("k must be at least 1".to_string()));
    }
    let vector = self.embedder.embed(query).await?;
    let default_filter;
    let filter = match filter {
      Some(filter) => filter,
      None => {
        default_filter = Filter::type_eq("doc");
        &default_filter
      }
    };

    let hits = self.index.search(&self.schema.name, &vector, k, filter).await?;
    tracing::debug!(index = %self.schema.name, k, %filter, hits = hits.len(), "searched index");
    Ok(hits)
  }

  /// Insert every record as a `faq` document, skipping failures
  pub async fn bulk_insert_from_source(&self, records: &[FaqRecord]) -> BulkInsertReport {
    let mut report = BulkInsertReport::default();
    for record in records {
      let document = NewDocument::new(DocumentContent::faq(&record.question, &record.answer));
      match self.insert(document).await {
        Ok(id) => report.inserted.push(id),
        Err(e) => {
          tracing::warn!(question = %record.question, error = %e, "skipping FAQ record");
          report.failed += 1;
        }
      }
    }
    tracing::info!(
      index = %self.schema.name,
      inserted = report.inserted.len(),
      failed = report.failed,
      "bulk FAQ load finished"
    );
    report
  }
}
