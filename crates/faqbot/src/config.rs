//! Runtime settings shared by the CLI and the server
//!
//! Every field can be given as a flag or through the environment variable the
//! deployment already uses. Components are built from settings on demand, so a
//! command only needs credentials for the services it actually touches.

use clap::ValueEnum;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::services::chat::{AzureOpenAiChat, ChatModel};
use crate::services::embeddings::{AzureOpenAiEmbeddings, Embedder, HashedTermEmbedder};
use crate::services::memory_index::MemoryIndex;
use crate::services::ocr::{AzureDocumentIntelligence, TextExtractor};
use crate::services::storage::{AzureBlobStorage, BlobStorage, LocalBlobStorage};
use crate::services::vector_database::{IndexSchema, VectorIndex};

/// Highest sampling temperature the pipelines accept
pub const MAX_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IndexBackend {
  /// Azure AI Search
  Azure,
  /// In-process index, lost on exit
  Memory,
  /// Embedded LanceDB tables under the data directory
  Lancedb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbeddingBackend {
  /// Azure OpenAI embeddings deployment
  AzureOpenai,
  /// Offline feature hashing
  Hashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
  /// Azure Blob Storage
  Azure,
  /// Directory under the data directory
  Local,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Settings {
  /// Azure OpenAI API key
  #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
  pub openai_api_key: Option<String>,

  /// Azure OpenAI API version
  #[arg(long, env = "OPENAI_API_VERSION", default_value = "2024-02-01")]
  pub openai_api_version: String,

  /// Azure OpenAI resource endpoint
  #[arg(long, env = "OPENAI_AZURE_ENDPOINT")]
  pub openai_endpoint: Option<String>,

  /// Chat completions deployment
  #[arg(long, env = "OPENAI_GPT_MODEL", default_value = "gpt-4o")]
  pub gpt_model: String,

  /// Embeddings deployment
  #[arg(long, env = "OPENAI_EMBEDDING_MODEL", default_value = "text-embedding-ada-002")]
  pub embedding_model: String,

  /// Azure AI Search admin key
  #[arg(long, env = "AZURE_SEARCH_API_KEY", hide_env_values = true)]
  pub search_api_key: Option<String>,

  /// Azure AI Search service endpoint
  #[arg(long, env = "AZURE_SEARCH_ENDPOINT")]
  pub search_endpoint: Option<String>,

  /// Azure Document Intelligence endpoint
  #[arg(long, env = "AZURE_OCR_ENDPOINT")]
  pub ocr_endpoint: Option<String>,

  /// Azure Document Intelligence key
  #[arg(long, env = "AZURE_OCR_KEY", hide_env_values = true)]
  pub ocr_key: Option<String>,

  /// Azure Storage connection string carrying a shared access signature
  #[arg(long, env = "AZURE_STORAGE_CONNECTION_STRING", hide_env_values = true)]
  pub storage_connection_string: Option<String>,

  /// Container that receives uploaded documents
  #[arg(long, env = "DOCUMENTS_CONTAINER_NAME", default_value = "documents")]
  pub documents_container: String,

  #[arg(long, env = "INDEX_BACKEND", value_enum, default_value = "azure")]
  pub index_backend: IndexBackend,

  #[arg(long, env = "EMBEDDING_BACKEND", value_enum, default_value = "azure-openai")]
  pub embedding_backend: EmbeddingBackend,

  #[arg(long, env = "STORAGE_BACKEND", value_enum, default_value = "azure")]
  pub storage_backend: StorageBackend,

  /// Name of the vector index
  #[arg(long, env = "FAQ_INDEX_NAME", default_value = IndexSchema::DEFAULT_NAME)]
  pub index_name: String,

  /// Width of every stored embedding
  #[arg(long, env = "EMBEDDING_DIMENSION", default_value_t = IndexSchema::DEFAULT_DIMENSION)]
  pub embedding_dimension: usize,

  /// Documents retrieved per question
  #[arg(long, env = "FAQ_TOP_K", default_value_t = 3)]
  pub top_k: usize,

  /// Sampling temperature for FAQ answers
  #[arg(long, env = "FAQ_TEMPERATURE", default_value_t = 0.3)]
  pub qa_temperature: f32,

  /// Sampling temperature for certificate judgments
  #[arg(long, env = "VERIFY_TEMPERATURE", default_value_t = 0.3)]
  pub verify_temperature: f32,

  /// Timeout for every upstream HTTP call, in seconds
  #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value_t = 60)]
  pub http_timeout_secs: u64,

  /// Delay between OCR result polls, in milliseconds
  #[arg(long, env = "OCR_POLL_INTERVAL_MS", default_value_t = 1000)]
  pub ocr_poll_interval_ms: u64,

  /// Maximum OCR result polls before giving up
  #[arg(long, env = "OCR_MAX_POLLS", default_value_t = 60)]
  pub ocr_max_polls: u32,

  /// Directory for logs, local blobs and LanceDB tables (default ~/.faqbot)
  #[arg(long, env = "FAQBOT_DATA_DIR")]
  pub data_dir: Option<PathBuf>,
}

fn require<'a>(value: &'a Option<String>, variable: &str) -> Result<&'a str> {
  value
    .as_deref()
    .map(str::trim)
    .filter(|value| !value.is_empty())
    .ok_or_else(|| Error::Config(format!("{variable} must be set")))
}

impl Settings {
  /// Check values that clap cannot express
  pub fn validate(&self) -> Result<()> {
    for (name, value) in [("FAQ_TEMPERATURE", self.qa_temperature), ("VERIFY_TEMPERATURE", self.verify_temperature)] {
      if !(0.0..=MAX_TEMPERATURE).contains(&value) {
        return Err(Error::Config(format!("{name} must be between 0.0 and {MAX_TEMPERATURE}, got {value}")));
      }
    }
    if self.embedding_dimension == 0 {
      return Err(Error::Config("EMBEDDING_DIMENSION must be positive".to_string()));
    }
    if self.top_k == 0 {
      return Err(Error::Config("FAQ_TOP_K must be positive".to_string()));
    }
    if self.documents_container.trim().is_empty() || self.documents_container.contains('/') {
      return Err(Error::Config(format!(
        "DOCUMENTS_CONTAINER_NAME '{}' is not a valid container name",
        self.documents_container
      )));
    }
    Ok(())
  }

  pub fn data_dir(&self) -> PathBuf {
    self.data_dir.clone().unwrap_or_else(|| {
      dirs::home_dir().unwrap_or_else(std::env::temp_dir).join(".faqbot")
    })
  }

  pub fn service_log_path(&self) -> PathBuf {
    self.data_dir().join("server.logs.jsonl")
  }

  pub fn http_timeout(&self) -> Duration {
    Duration::from_secs(self.http_timeout_secs)
  }

  pub fn index_schema(&self) -> IndexSchema {
    IndexSchema::new(&self.index_name, self.embedding_dimension)
  }

  pub fn embedder(&self) -> Result<Arc<dyn Embedder>> {
    match self.embedding_backend {
      EmbeddingBackend::AzureOpenai => Ok(Arc::new(AzureOpenAiEmbeddings::new(
        require(&self.openai_endpoint, "OPENAI_AZURE_ENDPOINT")?,
        require(&self.openai_api_key, "OPENAI_API_KEY")?,
        &self.openai_api_version,
        &self.embedding_model,
        self.http_timeout(),
      )?)),
      EmbeddingBackend::Hashed => Ok(Arc::new(HashedTermEmbedder::new(self.embedding_dimension))),
    }
  }

  pub async fn vector_index(&self) -> Result<Arc<dyn VectorIndex>> {
    match self.index_backend {
      IndexBackend::Azure => Ok(Arc::new(crate::services::azure_search::AzureSearchIndex::new(
        require(&self.search_endpoint, "AZURE_SEARCH_ENDPOINT")?,
        require(&self.search_api_key, "AZURE_SEARCH_API_KEY")?,
        self.http_timeout(),
      )?)),
      IndexBackend::Memory => Ok(Arc::new(MemoryIndex::new())),
      #[cfg(feature = "lancedb")]
      IndexBackend::Lancedb => {
        let index = crate::services::lancedb::LanceDbIndex::open(&self.data_dir().join("lancedb")).await?;
        Ok(Arc::new(index))
      }
      #[cfg(not(feature = "lancedb"))]
      IndexBackend::Lancedb => {
        Err(Error::Config("INDEX_BACKEND=lancedb requires the 'lancedb' cargo feature".to_string()))
      }
    }
  }

  pub fn chat_model(&self) -> Result<Arc<dyn ChatModel>> {
    Ok(Arc::new(AzureOpenAiChat::new(
      require(&self.openai_endpoint, "OPENAI_AZURE_ENDPOINT")?,
      require(&self.openai_api_key, "OPENAI_API_KEY")?,
      &self.openai_api_version,
      &self.gpt_model,
      self.http_timeout(),
    )?))
  }

  pub fn text_extractor(&self) -> Result<Arc<dyn TextExtractor>> {
    Ok(Arc::new(AzureDocumentIntelligence::new(
      require(&self.ocr_endpoint, "AZURE_OCR_ENDPOINT")?,
      require(&self.ocr_key, "AZURE_OCR_KEY")?,
      self.http_timeout(),
      Duration::from_millis(self.ocr_poll_interval_ms),
      self.ocr_max_polls,
    )?))
  }

  pub fn blob_storage(&self) -> Result<Arc<dyn BlobStorage>> {
    match self.storage_backend {
      StorageBackend::Azure => {
        let connection_string =
          require(&self.storage_connection_string, "AZURE_STORAGE_CONNECTION_STRING")?;
        Ok(Arc::new(AzureBlobStorage::from_connection_string(connection_string, self.http_timeout())?))
      }
      StorageBackend::Local => Ok(Arc::new(LocalBlobStorage::new(self.data_dir().join("blobs")))),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::Parser;
  use serial_test::serial;

  #[derive(Parser)]
  struct TestCli {
    #[command(flatten)]
    settings: Settings,
  }

  const VARIABLES: &[&str] = &[
    "OPENAI_API_KEY",
    "OPENAI_AZURE_ENDPOINT",
    "AZURE_SEARCH_API_KEY",
    "AZURE_SEARCH_ENDPOINT",
    "AZURE_OCR_ENDPOINT",
    "AZURE_OCR_KEY",
    "AZURE_STORAGE_CONNECTION_STRING",
    "FAQ_INDEX_NAME",
    "EMBEDDING_DIMENSION",
    "INDEX_BACKEND",
    "EMBEDDING_BACKEND",
    "STORAGE_BACKEND",
    "FAQ_TOP_K",
    "FAQ_TEMPERATURE",
    "FAQBOT_DATA_DIR",
  ];

  fn clear_env() {
    for variable in VARIABLES {
      std::env::remove_var(variable);
    }
  }

  fn parse(args: &[&str]) -> Settings {
    let mut argv = vec!["faqbot"];
    argv.extend_from_slice(args);
    TestCli::try_parse_from(argv).unwrap().settings
  }

  #[test]
  #[serial]
  fn test_defaults() {
    clear_env();
    let settings = parse(&[]);

    assert_eq!(settings.index_name, "faq-index");
    assert_eq!(settings.embedding_dimension, 1536);
    assert_eq!(settings.top_k, 3);
    assert_eq!(settings.index_backend, IndexBackend::Azure);
    assert_eq!(settings.embedding_backend, EmbeddingBackend::AzureOpenai);
    assert!((settings.qa_temperature - 0.3).abs() < f32::EPSILON);
    assert!(settings.validate().is_ok());
  }

  #[test]
  #[serial]
  fn test_environment_overrides() {
    clear_env();
    std::env::set_var("INDEX_BACKEND", "memory");
    std::env::set_var("EMBEDDING_BACKEND", "hashed");
    std::env::set_var("FAQ_TOP_K", "5");
    std::env::set_var("FAQBOT_DATA_DIR", "/var/lib/faqbot");

    let settings = parse(&[]);
    clear_env();

    assert_eq!(settings.index_backend, IndexBackend::Memory);
    assert_eq!(settings.embedding_backend, EmbeddingBackend::Hashed);
    assert_eq!(settings.top_k, 5);
    assert_eq!(settings.data_dir(), PathBuf::from("/var/lib/faqbot"));
    assert_eq!(settings.service_log_path(), PathBuf::from("/var/lib/faqbot/server.logs.jsonl"));
  }

  #[test]
  #[serial]
  fn test_missing_credentials_name_the_variable() {
    clear_env();
    let settings = parse(&[]);

    let err = settings.chat_model().err().unwrap();
    assert!(err.to_string().contains("OPENAI_AZURE_ENDPOINT"));

    let settings = parse(&["--openai-endpoint", "https://x.openai.azure.com"]);
    let err = settings.embedder().err().unwrap();
    assert!(err.to_string().contains("OPENAI_API_KEY"));
  }

  #[tokio::test]
  #[serial]
  async fn test_offline_backends_need_no_credentials() {
    clear_env();
    let settings = parse(&["--index-backend", "memory", "--embedding-backend", "hashed", "--storage-backend", "local"]);

    assert!(settings.vector_index().await.is_ok());
    assert_eq!(settings.embedder().unwrap().embed("hello").await.unwrap().len(), 1536);
    assert!(settings.blob_storage().is_ok());
    assert!(matches!(settings.text_extractor().err(), Some(Error::Config(_))));
  }

  #[test]
  #[serial]
  fn test_validate_rejects_hot_temperature() {
    clear_env();
    let settings = parse(&["--qa-temperature", "0.9"]);
    let err = settings.validate().unwrap_err();
    assert!(err.to_string().contains("FAQ_TEMPERATURE"));
  }
}
