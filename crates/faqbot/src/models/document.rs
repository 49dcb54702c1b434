//! Stored documents and their typed content

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Discriminator used to partition the corpus for filtered search
///
/// Unknown values are preserved so documents written by newer producers still
/// round-trip; they are treated as plain text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DocumentType {
  Faq,
  Doc,
  Other(String),
}

impl DocumentType {
  pub fn as_str(&self) -> &str {
    match self {
      DocumentType::Faq => "faq",
      DocumentType::Doc => "doc",
      DocumentType::Other(name) => name,
    }
  }
}

impl From<String> for DocumentType {
  fn from(value: String) -> Self {
    match value.as_str() {
      "faq" => DocumentType::Faq,
      "doc" => DocumentType::Doc,
      _ => DocumentType::Other(value),
    }
  }
}

impl From<&str> for DocumentType {
  fn from(value: &str) -> Self {
    DocumentType::from(value.to_string())
  }
}

impl From<DocumentType> for String {
  fn from(value: DocumentType) -> Self {
    value.as_str().to_string()
  }
}

impl std::fmt::Display for DocumentType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A question/answer pair, stored JSON-encoded in the `content` field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqContent {
  pub question: String,
  pub answer: String,
}

/// Typed view of a document's `content` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentContent {
  Faq(FaqContent),
  Plain(String),
}

impl DocumentContent {
  pub fn faq(question: impl Into<String>, answer: impl Into<String>) -> Self {
    DocumentContent::Faq(FaqContent { question: question.into(), answer: answer.into() })
  }

  pub fn plain(text: impl Into<String>) -> Self {
    DocumentContent::Plain(text.into())
  }

  /// The type discriminator this content is stored under
  pub fn kind(&self) -> DocumentType {
    match self {
      DocumentContent::Faq(_) => DocumentType::Faq,
      DocumentContent::Plain(_) => DocumentType::Doc,
    }
  }

  /// Encode into the raw string stored in the index
  pub fn encode(&self) -> Result<String> {
    match self {
      DocumentContent::Faq(faq) => serde_json::to_string(faq)
        .map_err(|e| Error::Validation(format!("failed to encode faq content: {e}"))),
      DocumentContent::Plain(text) => Ok(text.clone()),
    }
  }

  /// Decode a raw `content` string according to its type discriminator
  pub fn decode(kind: &DocumentType, raw: &str) -> Result<Self> {
    match kind {
      DocumentType::Faq => serde_json::from_str::<FaqContent>(raw)
        .map(DocumentContent::Faq)
        .map_err(|e| Error::Validation(format!("faq content is not a question/answer pair: {e}"))),
      DocumentType::Doc | DocumentType::Other(_) => Ok(DocumentContent::Plain(raw.to_string())),
    }
  }
}

/// A document as persisted in the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: DocumentType,
  pub content: String,
  pub embedding: Vec<f32>,
}

/// A document waiting to be inserted
#[derive(Debug, Clone)]
pub struct NewDocument {
  pub content: DocumentContent,
  /// Precomputed embedding; computed from the encoded content when absent
  pub embedding: Option<Vec<f32>>,
}

impl NewDocument {
  pub fn new(content: DocumentContent) -> Self {
    Self { content, embedding: None }
  }

  pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
    self.embedding = Some(embedding);
    self
  }
}

/// One ranked result of a similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: DocumentType,
  pub content: String,
  /// Similarity score, higher is more similar
  pub score: f32,
}

impl SearchHit {
  pub fn decode(&self) -> Result<DocumentContent> {
    DocumentContent::decode(&self.kind, &self.content)
  }
}
