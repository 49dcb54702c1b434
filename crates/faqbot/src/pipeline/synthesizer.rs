//! Answer synthesis through the chat model

use std::sync::Arc;

use crate::config::MAX_TEMPERATURE;
use crate::error::Result;
use crate::services::chat::{ChatMessage, ChatModel};

/// Default instruction for FAQ answers: stay inside the supplied context
pub const FAQ_SYSTEM_PROMPT: &str = "Você é um assistente útil chamado FAQBot, responsável por responder perguntas de usuários com base nos documentos fornecidos. Você deve sempre se basear exclusivamente no conteúdo fornecido. Caso a resposta não esteja presente, responda educadamente que não sabe ou que a informação não está disponível. Seja direto, claro e profissional em suas respostas.";

/// Reply used when the chat model fails while answering a question
pub const APOLOGY: &str = "Desculpe, não consegui encontrar uma resposta para sua pergunta.";

/// Wrap retrieved context as the assistant-role message
pub fn context_message(context: &str) -> ChatMessage {
  ChatMessage::assistant(format!("Aqui estão informações relevantes para responder à consulta: {context}."))
}

/// System instruction, assistant-role context, user query
pub fn grounded_messages(system_prompt: &str, context: &str, query: &str) -> Vec<ChatMessage> {
  vec![ChatMessage::system(system_prompt), context_message(context), ChatMessage::user(query)]
}

/// What to do when the chat model call fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailurePolicy {
  /// Log the failure and reply with the given text
  DegradeToFallback(String),
  /// Return the failure to the caller
  PropagateAsFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Synthesis {
  Generated(String),
  Fallback(String),
}

impl Synthesis {
  pub fn into_text(self) -> String {
    match self {
      Synthesis::Generated(text) | Synthesis::Fallback(text) => text,
    }
  }
}

#[derive(Clone)]
pub struct AnswerSynthesizer {
  model: Arc<dyn ChatModel>,
  temperature: f32,
}

impl AnswerSynthesizer {
  /// Temperatures outside `0.0..=0.3` are clamped into range
  pub fn new(model: Arc<dyn ChatModel>, temperature: f32) -> Self {
    Self { model, temperature: temperature.clamp(0.0, MAX_TEMPERATURE) }
  }

  pub fn temperature(&self) -> f32 {
    self.temperature
  }

  /// Answer `query` from `context` under `system_prompt`
  pub async fn synthesize(
    &self,
    system_prompt: &str,
    context: &str,
    query: &str,
    policy: &GenerationFailurePolicy,
  ) -> Result<Synthesis> {
    self.generate(&grounded_messages(system_prompt, context, query), policy).await
  }

  /// Send `messages` to the model and trim the reply
  pub async fn generate(&self, messages: &[ChatMessage], policy: &GenerationFailurePolicy) -> Result<Synthesis> {
    match self.model.complete(messages, self.temperature).await {
      Ok(reply) => Ok(Synthesis::Generated(reply.trim().to_string())),
      Err(e) => match policy {
        GenerationFailurePolicy::DegradeToFallback(fallback) => {
          tracing::error!(error = %e, "chat model failed, replying with fallback");
          Ok(Synthesis::Fallback(fallback.clone()))
        }
        GenerationFailurePolicy::PropagateAsFailure => Err(e),
      },
    }
  }
}
