//! Long-lived clients shared by every request

use anyhow::{Context, Result};
use bentley::service_log::ServiceLog;

use crate::config::Settings;
use crate::pipeline::{AnswerSynthesizer, CertificateVerifier, DocumentUploader, QaOptions, QaOrchestrator};
use crate::services::{DocumentStore, IndexSchema};

/// Axum state: built once at start-up, cloned cheaply into each handler
#[derive(Clone)]
pub struct AppState {
  pub qa: QaOrchestrator,
  pub verifier: CertificateVerifier,
  pub uploader: DocumentUploader,
  pub logs: ServiceLog,
  pub schema: IndexSchema,
}

impl AppState {
  pub fn new(
    qa: QaOrchestrator,
    verifier: CertificateVerifier,
    uploader: DocumentUploader,
    logs: ServiceLog,
    schema: IndexSchema,
  ) -> Self {
    Self { qa, verifier, uploader, logs, schema }
  }

  /// Build every upstream client named by `settings`
  ///
  /// Fails when a selected backend is missing credentials. The vector index is
  /// created if absent; a failure there is logged and does not stop start-up.
  pub async fn from_settings(settings: &Settings, logs: ServiceLog) -> Result<Self> {
    settings.validate().context("invalid settings")?;

    let schema = settings.index_schema();
    let embedder = settings.embedder().context("embedding client")?;
    let index = settings.vector_index().await.context("vector index")?;
    let chat = settings.chat_model().context("chat model")?;
    let extractor = settings.text_extractor().context("OCR client")?;
    let storage = settings.blob_storage().context("blob storage")?;

    let store = DocumentStore::open(index, embedder, schema.clone()).await;
    logs.info(&format!("Vector index '{}' ready ({} dimensions)", schema.name, schema.dimension), "faqbot-server").await;

    let options = QaOptions { k: settings.top_k, ..QaOptions::default() };
    let qa = QaOrchestrator::new(store, AnswerSynthesizer::new(chat.clone(), settings.qa_temperature), options);
    let verifier =
      CertificateVerifier::new(storage.clone(), extractor, AnswerSynthesizer::new(chat, settings.verify_temperature));
    let uploader = DocumentUploader::new(storage, &settings.documents_container);

    Ok(Self::new(qa, verifier, uploader, logs, schema))
  }
}
