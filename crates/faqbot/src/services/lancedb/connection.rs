//! Database connection management for LanceDB

use lancedb::{connect, Connection};
use std::path::Path;

use crate::error::{Error, Result};

/// Open a LanceDB connection, creating the data directory if needed
pub async fn create_connection(data_dir: &Path) -> Result<Connection> {
  std::fs::create_dir_all(data_dir).map_err(|e| {
    Error::Index(format!("failed to create LanceDB directory {}: {e}", data_dir.display()))
  })?;

  connect(&data_dir.to_string_lossy())
    .execute()
    .await
    .map_err(|e| Error::Index(format!("failed to connect to LanceDB: {e}")))
}
