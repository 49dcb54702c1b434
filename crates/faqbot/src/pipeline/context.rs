//! Context assembly from ranked search hits

use crate::models::{DocumentContent, DocumentType, SearchHit};

/// Join the answers of the FAQ hits, in ranking order, with single spaces
///
/// Hits of other types and FAQ entries that fail to decode are skipped. An
/// empty result is a valid context.
pub fn assemble(hits: &[SearchHit]) -> String {
  hits
    .iter()
    .filter(|hit| hit.kind == DocumentType::Faq)
    .filter_map(|hit| match hit.decode() {
      Ok(DocumentContent::Faq(faq)) => Some(faq.answer),
      Ok(DocumentContent::Plain(_)) => None,
      Err(e) => {
        tracing::warn!(id = %hit.id, error = %e, "skipping undecodable FAQ hit");
        None
      }
    })
    .filter(|answer| !answer.trim().is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}
