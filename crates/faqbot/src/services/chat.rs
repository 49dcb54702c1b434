//! Chat completion clients

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::services::http;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
  System,
  Assistant,
  User,
}

/// One role-tagged message of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role: ChatRole,
  pub content: String,
}

impl ChatMessage {
  pub fn system(content: impl Into<String>) -> Self {
    Self { role: ChatRole::System, content: content.into() }
  }

  pub fn assistant(content: impl Into<String>) -> Self {
    Self { role: ChatRole::Assistant, content: content.into() }
  }

  pub fn user(content: impl Into<String>) -> Self {
    Self { role: ChatRole::User, content: content.into() }
  }
}

/// A language model that completes a conversation with one reply
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
  async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
  messages: &'a [ChatMessage],
  temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
  choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
  message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
  content: Option<String>,
}

/// Azure OpenAI chat completions deployment
pub struct AzureOpenAiChat {
  client: reqwest::Client,
  endpoint: String,
  api_key: String,
  api_version: String,
  deployment: String,
}

impl AzureOpenAiChat {
  pub fn new(
    endpoint: impl Into<String>,
    api_key: impl Into<String>,
    api_version: impl Into<String>,
    deployment: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self> {
    Ok(Self {
      client: http::build_client(timeout)?,
      endpoint: endpoint.into(),
      api_key: api_key.into(),
      api_version: api_version.into(),
      deployment: deployment.into(),
    })
  }

  fn url(&self) -> String {
    http::join(
      &self.endpoint,
      &format!(
        "openai/deployments/{}/chat/completions?api-version={}",
        self.deployment, self.api_version
      ),
    )
  }
}

#[async_trait]
impl ChatModel for AzureOpenAiChat {
  async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
    let response = self
      .client
      .post(self.url())
      .header("api-key", &self.api_key)
      .json(&CompletionRequest { messages, temperature })
      .send()
      .await
      .map_err(|e| Error::Generation(format!("request to chat deployment failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(Error::Generation(http::describe_failure(status, &body)));
    }

    let parsed: CompletionResponse = response
      .json()
      .await
      .map_err(|e| Error::Generation(format!("unreadable completion response: {e}")))?;

    let content = parsed
      .choices
      .into_iter()
      .next()
      .and_then(|choice| choice.message.content)
      .ok_or_else(|| Error::Generation("completion response contained no message".to_string()))?;

    tracing::debug!(deployment = %self.deployment, chars = content.len(), "received completion");
    Ok(content)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::{Matcher, Server};

  fn client(url: String) -> AzureOpenAiChat {
    AzureOpenAiChat::new(url, "secret", "2024-02-01", "gpt-4o", Duration::from_secs(5)).unwrap()
  }

  #[test]
  fn test_roles_serialize_lowercase() {
    let value = serde_json::to_value(ChatMessage::assistant("ctx")).unwrap();
    assert_eq!(value, serde_json::json!({"role": "assistant", "content": "ctx"}));
  }

  #[tokio::test]
  async fn test_complete_sends_messages_and_temperature() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("POST", "/openai/deployments/gpt-4o/chat/completions")
      .match_query(Matcher::UrlEncoded("api-version".into(), "2024-02-01".into()))
      .match_header("api-key", "secret")
      .match_body(Matcher::PartialJson(serde_json::json!({
        "messages": [
          {"role": "system", "content": "be brief"},
          {"role": "user", "content": "hi"}
        ],
        "temperature": 0.25
      })))
      .with_status(200)
      .with_body(r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "hello"}}]}"#)
      .create_async()
      .await;

    let messages = vec![ChatMessage::system("be brief"), ChatMessage::user("hi")];
    let reply = client(server.url()).complete(&messages, 0.25).await.unwrap();
    assert_eq!(reply, "hello");
  }

  #[tokio::test]
  async fn test_complete_maps_http_errors() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("POST", Matcher::Regex("/chat/completions".to_string()))
      .with_status(500)
      .with_body(r#"{"error": {"message": "model overloaded"}}"#)
      .create_async()
      .await;

    let err = client(server.url()).complete(&[ChatMessage::user("hi")], 0.3).await.unwrap_err();
    assert!(matches!(err, Error::Generation(_)));
    assert!(err.to_string().contains("model overloaded"));
  }

  #[tokio::test]
  async fn test_complete_rejects_missing_content() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("POST", Matcher::Regex("/chat/completions".to_string()))
      .with_status(200)
      .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#)
      .create_async()
      .await;

    let result = client(server.url()).complete(&[ChatMessage::user("hi")], 0.3).await;
    assert!(matches!(result, Err(Error::Generation(_))));
  }
}
