//! faqbot - retrieval-augmented FAQ answering and certificate verification
//!
//! Documents are embedded into a vector index; questions are answered by
//! retrieving the closest FAQ entries and asking a chat model to answer from
//! them. Certificates are read with OCR and judged by the same chat model.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod server;
pub mod services;

pub use error::{Error, Result};
