//! FAQ seed files used for bulk loading

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// One question/answer record from a seed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqRecord {
  pub question: String,
  pub answer: String,
}

/// Top-level shape of a seed file: `{"faq": [...]}`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FaqSource {
  #[serde(default)]
  pub faq: Vec<FaqRecord>,
}

/// Load FAQ records from a JSON file, or YAML when the extension says so
pub fn load_faq_source(path: &Path) -> Result<Vec<FaqRecord>> {
  let raw = std::fs::read_to_string(path)
    .map_err(|e| Error::Validation(format!("failed to read {}: {e}", path.display())))?;

  let is_yaml = path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

  let source: FaqSource = if is_yaml {
    serde_yaml::from_str(&raw)
      .map_err(|e| Error::Validation(format!("invalid FAQ YAML in {}: {e}", path.display())))?
  } else {
    serde_json::from_str(&raw)
      .map_err(|e| Error::Validation(format!("invalid FAQ JSON in {}: {e}", path.display())))?
  };

  Ok(source.faq)
}
