//! Vector search and result decoding for LanceDB

use arrow::array::{Array, Float32Array, StringArray};
use arrow::record_batch::RecordBatch;
use futures::stream::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{DistanceType, Table};

use crate::error::{Error, Result};
use crate::models::{DocumentType, Filter, SearchHit};

/// Cosine kNN restricted by `filter`, most similar first
pub async fn search_documents(
  table: &Table,
  vector: &[f32],
  k: usize,
  filter: &Filter,
) -> Result<Vec<SearchHit>> {
  let batches: Vec<RecordBatch> = table
    .vector_search(vector)
    .map_err(|e| Error::Index(format!("invalid vector query: {e}")))?
    .column("embedding")
    .distance_type(DistanceType::Cosine)
    .only_if(filter.to_sql())
    .limit(k)
    .execute()
    .await
    .map_err(|e| Error::Index(format!("vector search failed: {e}")))?
    .try_collect()
    .await
    .map_err(|e| Error::Index(format!("error reading search results: {e}")))?;

  let mut hits = Vec::new();
  for batch in &batches {
    hits.extend(hits_from_batch(batch)?);
  }
  hits.sort_by(|a, b| b.score.total_cmp(&a.score));
  hits.truncate(k);
  Ok(hits)
}

fn hits_from_batch(batch: &RecordBatch) -> Result<Vec<SearchHit>> {
  let ids = string_column(batch, "id")?;
  let kinds = string_column(batch, "type")?;
  let contents = string_column(batch, "content")?;
  let distances =
    batch.column_by_name("_distance").and_then(|col| col.as_any().downcast_ref::<Float32Array>());

  Ok(
    (0..batch.num_rows())
      .map(|row| SearchHit {
        id: ids.value(row).to_string(),
        kind: DocumentType::from(kinds.value(row)),
        content: contents.value(row).to_string(),
        score: similarity(distances, row),
      })
      .collect(),
  )
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
  batch
    .column_by_name(name)
    .ok_or_else(|| Error::Index(format!("search result is missing the '{name}' column")))?
    .as_any()
    .downcast_ref::<StringArray>()
    .ok_or_else(|| Error::Index(format!("column '{name}' is not a string column")))
}

/// Cosine distance is `1 - cosine similarity`
fn similarity(distances: Option<&Float32Array>, row: usize) -> f32 {
  match distances {
    Some(distances) if row < distances.len() && !distances.is_null(row) => 1.0 - distances.value(row),
    _ => 0.0,
  }
}
