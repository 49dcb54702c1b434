//! Embedded LanceDB backend for [`VectorIndex`]
//!
//! Each index is one LanceDB table under the data directory. Documents are
//! merged on `id`, and searches use cosine distance with the filter rendered
//! as a SQL predicate.

pub mod connection;
pub mod records;
pub mod search;

use arrow::record_batch::RecordBatchIterator;
use async_trait::async_trait;
use lancedb::{Connection, Table};
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::{Document, Filter, SearchHit};
use crate::services::vector_database::{IndexSchema, VectorIndex};

pub struct LanceDbIndex {
  connection: Connection,
}

impl LanceDbIndex {
  pub async fn open(data_dir: &Path) -> Result<Self> {
    let connection = connection::create_connection(data_dir).await?;
    Ok(Self { connection })
  }

  async fn table(&self, name: &str) -> Result<Table> {
    self
      .connection
      .open_table(name)
      .execute()
      .await
      .map_err(|e| Error::Index(format!("failed to open table '{name}': {e}")))
  }

  async fn dimension_of(&self, table: &Table) -> Result<usize> {
    let schema = table
      .schema()
      .await
      .map_err(|e| Error::Index(format!("failed to read table schema: {e}")))?;
    records::embedding_dimension(&schema)
      .ok_or_else(|| Error::Index(format!("table '{}' has no embedding column", table.name())))
  }
}

#[async_trait]
impl VectorIndex for LanceDbIndex {
  async fn list_index_names(&self) -> Result<Vec<String>> {
    self
      .connection
      .table_names()
      .execute()
      .await
      .map_err(|e| Error::Index(format!("failed to list tables: {e}")))
  }

  async fn create_or_update_index(&self, schema: &IndexSchema) -> Result<()> {
    if self.list_index_names().await?.contains(&schema.name) {
      let table = self.table(&schema.name).await?;
      let existing = self.dimension_of(&table).await?;
      if existing != schema.dimension {
        return Err(Error::Index(format!(
          "table '{}' already holds {existing}-dimensional vectors",
          schema.name
        )));
      }
      return Ok(());
    }

    self
      .connection
      .create_empty_table(&schema.name, records::document_schema(schema.dimension))
      .execute()
      .await
      .map_err(|e| Error::Index(format!("failed to create table '{}': {e}", schema.name)))?;

    bentley::info!("created LanceDB table '{}' ({} dimensions)", schema.name, schema.dimension);
    Ok(())
  }

  async fn upsert(&self, index: &str, documents: &[Document]) -> Result<()> {
    if documents.is_empty() {
      return Ok(());
    }

    let table = self.table(index).await?;
    let dimension = self.dimension_of(&table).await?;
    let batch = records::documents_to_batch(documents, dimension)?;
    let schema = batch.schema();
    let reader = RecordBatchIterator::new(vec![Ok(batch)], schema);

    let mut merge = table.merge_insert(&["id"]);
    merge.when_matched_update_all(None).when_not_matched_insert_all();
    merge
      .execute(Box::new(reader))
      .await
      .map_err(|e| Error::Index(format!("failed to store documents: {e}")))?;

    tracing::debug!(index, count = documents.len(), "stored documents in LanceDB");
    Ok(())
  }

  async fn search(&self, index: &str, vector: &[f32], k: usize, filter: &Filter) -> Result<Vec<SearchHit>> {
    let table = self.table(index).await?;
    let dimension = self.dimension_of(&table).await?;
    if vector.len() != dimension {
      return Err(Error::DimensionMismatch { expected: dimension, actual: vector.len() });
    }
    search::search_documents(&table, vector, k, filter).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::DocumentType;
  use tempfile::TempDir;

  fn document(id: &str, kind: DocumentType, embedding: Vec<f32>) -> Document {
    Document { id: id.to_string(), kind, content: format!("content {id}"), embedding }
  }

  #[tokio::test]
  async fn test_create_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let index = LanceDbIndex::open(dir.path()).await.unwrap();
    let schema = IndexSchema::new("faq-index", 2);

    index.create_or_update_index(&schema).await.unwrap();
    index.create_or_update_index(&schema).await.unwrap();

    assert_eq!(index.list_index_names().await.unwrap(), vec!["faq-index".to_string()]);
  }

  #[tokio::test]
  async fn test_filtered_search_ranks_by_cosine() {
    let dir = TempDir::new().unwrap();
    let index = LanceDbIndex::open(dir.path()).await.unwrap();
    index.create_or_update_index(&IndexSchema::new("faq-index", 2)).await.unwrap();
    index
      .upsert(
        "faq-index",
        &[
          document("near", DocumentType::Faq, vec![1.0, 0.1]),
          document("far", DocumentType::Faq, vec![0.0, 1.0]),
          document("doc", DocumentType::Doc, vec![1.0, 0.0]),
        ],
      )
      .await
      .unwrap();

    let hits = index.search("faq-index", &[1.0, 0.0], 3, &Filter::type_eq("faq")).await.unwrap();
    let ids: Vec<_> = hits.iter().map(|hit| hit.id.as_str()).collect();
    assert_eq!(ids, vec!["near", "far"]);
  }

  #[tokio::test]
  async fn test_search_rejects_wrong_width() {
    let dir = TempDir::new().unwrap();
    let index = LanceDbIndex::open(dir.path()).await.unwrap();
    index.create_or_update_index(&IndexSchema::new("faq-index", 2)).await.unwrap();

    let result = index.search("faq-index", &[1.0], 3, &Filter::type_eq("faq")).await;
    assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
  }
}
