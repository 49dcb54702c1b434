//! Certificate verification and document upload

use base64::Engine;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::pipeline::synthesizer::{AnswerSynthesizer, GenerationFailurePolicy};
use crate::services::chat::ChatMessage;
use crate::services::ocr::TextExtractor;
use crate::services::storage::{BlobPath, BlobStorage};

/// System instruction naming the professional the certificate must match
pub fn certificate_prompt(professional_name: &str) -> String {
  format!(
    "Você é um assistente especializado em validação de certificados. \
     Analise o conteúdo extraído do documento e verifique se ele contém todas as informações necessárias para que o certificado seja considerado válido. \
     Considere o nome do profissional, o número do registro e a data de validade. \
     O nome do profissional informado é '{professional_name}'. \
     Se todas as informações estiverem corretas e consistentes, responda 'Válido'. \
     Caso contrário, responda 'Inválido'."
  )
}

/// Download, read and judge a stored certificate
///
/// Every stage is a hard failure: a missing blob, an OCR error, blank text and
/// a failing chat model are all returned to the caller.
#[derive(Clone)]
pub struct CertificateVerifier {
  storage: Arc<dyn BlobStorage>,
  extractor: Arc<dyn TextExtractor>,
  synthesizer: AnswerSynthesizer,
}

impl CertificateVerifier {
  pub fn new(storage: Arc<dyn BlobStorage>, extractor: Arc<dyn TextExtractor>, synthesizer: AnswerSynthesizer) -> Self {
    Self { storage, extractor, synthesizer }
  }

  /// Returns the model's literal judgment, normally `Válido` or `Inválido`
  pub async fn verify(&self, path: &BlobPath, professional_name: &str) -> Result<String> {
    let bytes = match self.storage.get(path).await? {
      Some(bytes) if !bytes.is_empty() => bytes,
      _ => return Err(Error::NotFound(format!("document '{path}'"))),
    };
    tracing::debug!(document = %path, bytes = bytes.len(), "downloaded certificate");

    let text = self.extractor.extract(&bytes).await?;
    if text.trim().is_empty() {
      return Err(Error::EmptyExtraction);
    }

    let messages = [ChatMessage::system(certificate_prompt(professional_name)), ChatMessage::user(text)];
    let judgment = self
      .synthesizer
      .generate(&messages, &GenerationFailurePolicy::PropagateAsFailure)
      .await?
      .into_text();

    tracing::info!(document = %path, judgment = %judgment, "certificate verified");
    Ok(judgment)
  }
}

/// Stores base64-encoded uploads in the documents container
#[derive(Clone)]
pub struct DocumentUploader {
  storage: Arc<dyn BlobStorage>,
  container: String,
}

impl DocumentUploader {
  pub fn new(storage: Arc<dyn BlobStorage>, container: impl Into<String>) -> Self {
    Self { storage, container: container.into() }
  }

  /// Decode `content` and store it as `<container>/<filename>`
  pub async fn upload(&self, filename: &str, content: &str) -> Result<BlobPath> {
    let bytes = decode_base64(content)?;
    let path = BlobPath::new(&self.container, filename)?;
    let stored = self.storage.put(&path, bytes).await?;
    tracing::info!(document = %stored, "document uploaded");
    Ok(stored)
  }
}

/// Strict standard-alphabet base64
pub fn decode_base64(content: &str) -> Result<Vec<u8>> {
  base64::engine::general_purpose::STANDARD
    .decode(content.trim())
    .map_err(|_| Error::Validation("O conteúdo não é uma string base64 válida.".to_string()))
}
