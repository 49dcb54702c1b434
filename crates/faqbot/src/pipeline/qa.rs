//! Question answering: embed, retrieve, assemble, synthesize

use serde::Serialize;

use crate::error::{Error, Result};
use crate::models::Filter;
use crate::pipeline::context;
use crate::pipeline::synthesizer::{AnswerSynthesizer, GenerationFailurePolicy, Synthesis, APOLOGY, FAQ_SYSTEM_PROMPT};
use crate::services::DocumentStore;

/// Reply when retrieval finds nothing to answer from
pub const DECLINE: &str = "Essa informação não está disponível.";

/// What to do when no FAQ answer was retrieved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmptyContextPolicy {
  /// Reply with the given text without calling the model
  Decline(String),
  /// Ask the model anyway, with an empty context
  AskModel,
}

impl Default for EmptyContextPolicy {
  fn default() -> Self {
    EmptyContextPolicy::Decline(DECLINE.to_string())
  }
}

#[derive(Debug, Clone)]
pub struct QaOptions {
  pub k: usize,
  pub filter: Filter,
  pub system_prompt: String,
  pub empty_context: EmptyContextPolicy,
  pub fallback: String,
}

impl Default for QaOptions {
  fn default() -> Self {
    Self {
      k: 3,
      filter: Filter::type_eq("faq"),
      system_prompt: FAQ_SYSTEM_PROMPT.to_string(),
      empty_context: EmptyContextPolicy::default(),
      fallback: APOLOGY.to_string(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QaOutcome {
  Generated,
  Declined,
  Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaAnswer {
  pub response: String,
  pub source_ids: Vec<String>,
  pub outcome: QaOutcome,
}

#[derive(Clone)]
pub struct QaOrchestrator {
  store: DocumentStore,
  synthesizer: AnswerSynthesizer,
  options: QaOptions,
}

impl QaOrchestrator {
  pub fn new(store: DocumentStore, synthesizer: AnswerSynthesizer, options: QaOptions) -> Self {
    Self { store, synthesizer, options }
  }

  pub async fn answer(&self, question: &str) -> Result<QaAnswer> {
    self.answer_with_k(question, self.options.k).await
  }

  /// Answer with an explicit retrieval depth
  ///
  /// Embedding and search failures are returned; a failing chat model degrades
  /// to the configured fallback reply.
  pub async fn answer_with_k(&self, question: &str, k: usize) -> Result<QaAnswer> {
    if question.trim().is_empty() {
      return Err(Error::Validation("question must not be empty".to_string()));
    }

    let hits = self.store.search(question, k, Some(&self.options.filter)).await?;
    let source_ids: Vec<String> = hits.iter().map(|hit| hit.id.clone()).collect();
    let context = context::assemble(&hits);
    tracing::debug!(hits = hits.len(), context_chars = context.len(), "assembled FAQ context");

    if context.is_empty() {
      if let EmptyContextPolicy::Decline(reply) = &self.options.empty_context {
        tracing::info!("no FAQ context retrieved, declining");
        return Ok(QaAnswer { response: reply.clone(), source_ids, outcome: QaOutcome::Declined });
      }
    }

    let policy = GenerationFailurePolicy::DegradeToFallback(self.options.fallback.clone());
    let synthesis = self
      .synthesizer
      .synthesize(&self.options.system_prompt, &context, question, &policy)
      .await?;

    let outcome = match synthesis {
      Synthesis::Generated(_) => QaOutcome::Generated,
      Synthesis::Fallback(_) => QaOutcome::Fallback,
    };
    Ok(QaAnswer { response: synthesis.into_text(), source_ids, outcome })
  }
}
