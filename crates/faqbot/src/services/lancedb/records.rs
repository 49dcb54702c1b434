//! Arrow RecordBatch conversion for stored documents

use arrow::array::{Array, FixedSizeListBuilder, Float32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::models::Document;

/// Arrow schema of a document table with `dimension`-wide embeddings
pub fn document_schema(dimension: usize) -> SchemaRef {
  Arc::new(Schema::new(vec![
    Field::new("id", DataType::Utf8, false),
    Field::new("type", DataType::Utf8, false),
    Field::new("content", DataType::Utf8, false),
    Field::new(
      "embedding",
      DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dimension as i32),
      false,
    ),
  ]))
}

/// Embedding width declared by a table schema
pub fn embedding_dimension(schema: &Schema) -> Option<usize> {
  match schema.field_with_name("embedding").ok()?.data_type() {
    DataType::FixedSizeList(_, size) => usize::try_from(*size).ok(),
    _ => None,
  }
}

/// Convert documents into a single RecordBatch
pub fn documents_to_batch(documents: &[Document], dimension: usize) -> Result<RecordBatch> {
  if documents.is_empty() {
    return Err(Error::Index("cannot build a record batch from no documents".to_string()));
  }

  let ids = string_column(documents, |d| &d.id);
  let kinds = string_column(documents, |d| d.kind.as_str());
  let contents = string_column(documents, |d| &d.content);

  let mut embeddings =
    FixedSizeListBuilder::new(Float32Array::builder(dimension * documents.len()), dimension as i32);
  for document in documents {
    if document.embedding.len() != dimension {
      return Err(Error::DimensionMismatch { expected: dimension, actual: document.embedding.len() });
    }
    embeddings.values().append_slice(&document.embedding);
    embeddings.append(true);
  }

  let columns: Vec<Arc<dyn Array>> =
    vec![Arc::new(ids), Arc::new(kinds), Arc::new(contents), Arc::new(embeddings.finish())];

  RecordBatch::try_new(document_schema(dimension), columns)
    .map_err(|e| Error::Index(format!("failed to create record batch: {e}")))
}

fn string_column<F>(documents: &[Document], field: F) -> StringArray
where
  F: Fn(&Document) -> &str,
{
  StringArray::from(documents.iter().map(|d| Some(field(d))).collect::<Vec<_>>())
}
