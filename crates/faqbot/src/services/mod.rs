pub mod azure_search;
pub mod chat;
pub mod document_store;
pub mod embeddings;
pub mod http;
#[cfg(feature = "lancedb")]
pub mod lancedb;
pub mod memory_index;
pub mod ocr;
pub mod storage;
pub mod vector_database;

pub use document_store::{BulkInsertReport, DocumentStore, IndexStatus};
pub use vector_database::{IndexSchema, VectorIndex};
