#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use faqbot::pipeline::{AnswerSynthesizer, CertificateVerifier, DocumentUploader, QaOptions, QaOrchestrator};
use faqbot::services::chat::{ChatMessage, ChatModel};
use faqbot::services::embeddings::HashedTermEmbedder;
use faqbot::services::memory_index::MemoryIndex;
use faqbot::services::ocr::TextExtractor;
use faqbot::services::storage::LocalBlobStorage;
use faqbot::services::{DocumentStore, IndexSchema};
use faqbot::{Error, Result};

pub const DIMENSION: usize = 256;

/// Chat model that replies with a fixed text, or fails, and records every call
pub struct ScriptedChat {
  reply: Option<String>,
  calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChat {
  pub fn replying(reply: &str) -> Arc<Self> {
    Arc::new(Self { reply: Some(reply.to_string()), calls: Mutex::new(Vec::new()) })
  }

  pub fn failing() -> Arc<Self> {
    Arc::new(Self { reply: None, calls: Mutex::new(Vec::new()) })
  }

  pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
    self.calls.lock().unwrap().clone()
  }
}

#[async_trait]
impl ChatModel for ScriptedChat {
  async fn complete(&self, messages: &[ChatMessage], _temperature: f32) -> Result<String> {
    self.calls.lock().unwrap().push(messages.to_vec());
    match &self.reply {
      Some(reply) => Ok(reply.clone()),
      None => Err(Error::Generation("model unavailable".to_string())),
    }
  }
}

/// OCR stand-in that returns the document bytes as UTF-8 text
pub struct Utf8Extractor;

#[async_trait]
impl TextExtractor for Utf8Extractor {
  async fn extract(&self, bytes: &[u8]) -> Result<String> {
    Ok(String::from_utf8_lossy(bytes).into_owned())
  }
}

pub async fn memory_store() -> (DocumentStore, Arc<MemoryIndex>) {
  let index = Arc::new(MemoryIndex::new());
  let store = DocumentStore::open(
    index.clone(),
    Arc::new(HashedTermEmbedder::new(DIMENSION)),
    IndexSchema::new("faq-index", DIMENSION),
  )
  .await;
  (store, index)
}

pub fn qa(store: DocumentStore, chat: Arc<ScriptedChat>) -> QaOrchestrator {
  QaOrchestrator::new(store, AnswerSynthesizer::new(chat, 0.3), QaOptions::default())
}

pub fn verifier(storage: Arc<LocalBlobStorage>, chat: Arc<ScriptedChat>) -> CertificateVerifier {
  CertificateVerifier::new(storage, Arc::new(Utf8Extractor), AnswerSynthesizer::new(chat, 0.0))
}

pub fn uploader(storage: Arc<LocalBlobStorage>) -> DocumentUploader {
  DocumentUploader::new(storage, "documents")
}
