//! Azure AI Search backend for [`VectorIndex`]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::{Document, DocumentType, Filter, SearchHit};
use crate::services::http;
use crate::services::vector_database::{IndexSchema, VectorIndex};

pub const API_VERSION: &str = "2023-11-01";

pub struct AzureSearchIndex {
  client: reqwest::Client,
  endpoint: String,
  api_key: String,
}

#[derive(Debug, Deserialize)]
struct IndexList {
  value: Vec<IndexName>,
}

#[derive(Debug, Deserialize)]
struct IndexName {
  name: String,
}

#[derive(Debug, Serialize)]
struct UploadAction<'a> {
  #[serde(rename = "@search.action")]
  action: &'static str,
  id: &'a str,
  #[serde(rename = "type")]
  kind: &'a str,
  content: &'a str,
  embedding: &'a [f32],
}

#[derive(Debug, Deserialize)]
struct IndexingResults {
  value: Vec<IndexingResult>,
}

#[derive(Debug, Deserialize)]
struct IndexingResult {
  key: String,
  status: bool,
  #[serde(rename = "errorMessage")]
  error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
  value: Vec<SearchResultItem>,
}

#[derive(Debug, Deserialize)]
struct SearchResultItem {
  #[serde(rename = "@search.score")]
  score: f32,
  id: String,
  #[serde(rename = "type")]
  kind: Option<String>,
  content: Option<String>,
}

impl AzureSearchIndex {
  pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
    Ok(Self { client: http::build_client(timeout)?, endpoint: endpoint.into(), api_key: api_key.into() })
  }

  fn url(&self, path: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{separator}api-version={API_VERSION}", http::join(&self.endpoint, path))
  }

  async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
    let response = request
      .header("api-key", &self.api_key)
      .send()
      .await
      .map_err(|e| Error::Index(format!("{what} request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(Error::Index(format!("{what} failed: {}", http::describe_failure(status, &body))));
    }
    Ok(response)
  }
}

#[async_trait]
impl VectorIndex for AzureSearchIndex {
  async fn list_index_names(&self) -> Result<Vec<String>> {
    let response = self.send(self.client.get(self.url("indexes?$select=name")), "list indexes").await?;
    let list: IndexList = response
      .json()
      .await
      .map_err(|e| Error::Index(format!("unreadable index list: {e}")))?;
    Ok(list.value.into_iter().map(|index| index.name).collect())
  }

  async fn create_or_update_index(&self, schema: &IndexSchema) -> Result<()> {
    let request = self
      .client
      .put(self.url(&format!("indexes/{}", schema.name)))
      .json(&schema.to_azure_definition());
    self.send(request, "create index").await?;
    tracing::info!(index = %schema.name, dimension = schema.dimension, "azure search index created or updated");
    Ok(())
  }

  async fn upsert(&self, index: &str, documents: &[Document]) -> Result<()> {
    if documents.is_empty() {
      return Ok(());
    }

    let actions: Vec<UploadAction<'_>> = documents
      .iter()
      .map(|document| UploadAction {
        action: "upload",
        id: &document.id,
        kind: document.kind.as_str(),
        content: &document.content,
        embedding: &document.embedding,
      })
      .collect();

    let request = self
      .client
      .post(self.url(&format!("indexes/{index}/docs/index")))
      .json(&json!({ "value": actions }));
    let response = self.send(request, "upload documents").await?;

    let results: IndexingResults = response
      .json()
      .await
      .map_err(|e| Error::Index(format!("unreadable indexing result: {e}")))?;

    if let Some(failed) = results.value.into_iter().find(|result| !result.status) {
      return Err(Error::Index(format!(
        "document '{}' was rejected: {}",
        failed.key,
        failed.error_message.unwrap_or_else(|| "no reason given".to_string())
      )));
    }
    Ok(())
  }

  async fn search(&self, index: &str, vector: &[f32], k: usize, filter: &Filter) -> Result<Vec<SearchHit>> {
    let body = json!({
      "select": "id,content,type",
      "filter": filter.to_odata(),
      "top": k,
      "vectorQueries": [
        {"kind": "vector", "vector": vector, "fields": "embedding", "k": k}
      ]
    });

    let request = self.client.post(self.url(&format!("indexes/{index}/docs/search"))).json(&body);
    let response = self.send(request, "vector search").await?;

    let results: SearchResults = response
      .json()
      .await
      .map_err(|e| Error::Index(format!("unreadable search result: {e}")))?;

    let mut hits: Vec<SearchHit> = results
      .value
      .into_iter()
      .map(|item| SearchHit {
        id: item.id,
        kind: item.kind.map(DocumentType::from).unwrap_or(DocumentType::Doc),
        content: item.content.unwrap_or_default(),
        score: item.score,
      })
      .collect();
    hits.truncate(k);
    Ok(hits)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use mockito::{Matcher, Server};

  fn index(url: String) -> AzureSearchIndex {
    AzureSearchIndex::new(url, "search-key", Duration::from_secs(5)).unwrap()
  }

  #[tokio::test]
  async fn test_list_index_names() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("GET", "/indexes")
      .match_query(Matcher::AllOf(vec![
        Matcher::UrlEncoded("api-version".into(), API_VERSION.into()),
        Matcher::UrlEncoded("$select".into(), "name".into()),
      ]))
      .match_header("api-key", "search-key")
      .with_status(200)
      .with_body(r#"{"value": [{"name": "faq-index"}, {"name": "other"}]}"#)
      .create_async()
      .await;

    let names = index(server.url()).list_index_names().await.unwrap();
    assert_eq!(names, vec!["faq-index".to_string(), "other".to_string()]);
  }

  #[tokio::test]
  async fn test_create_index_puts_definition() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("PUT", "/indexes/faq-index")
      .match_query(Matcher::UrlEncoded("api-version".into(), API_VERSION.into()))
      .match_body(Matcher::PartialJson(json!({"name": "faq-index"})))
      .with_status(201)
      .with_body("{}")
      .create_async()
      .await;

    index(server.url()).create_or_update_index(&IndexSchema::new("faq-index", 3)).await.unwrap();
    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_upsert_reports_rejected_documents() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("POST", "/indexes/faq-index/docs/index")
      .match_query(Matcher::Any)
      .match_body(Matcher::PartialJson(json!({
        "value": [{"@search.action": "upload", "id": "1", "type": "faq"}]
      })))
      .with_status(207)
      .with_body(r#"{"value": [{"key": "1", "status": false, "errorMessage": "bad vector", "statusCode": 400}]}"#)
      .create_async()
      .await;

    let document = Document {
      id: "1".to_string(),
      kind: DocumentType::Faq,
      content: "{}".to_string(),
      embedding: vec![0.1, 0.2],
    };
    let err = index(server.url()).upsert("faq-index", &[document]).await.unwrap_err();
    assert!(err.to_string().contains("bad vector"));
  }

  #[tokio::test]
  async fn test_search_sends_vector_query_and_filter() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("POST", "/indexes/faq-index/docs/search")
      .match_query(Matcher::Any)
      .match_body(Matcher::PartialJson(json!({
        "filter": "type eq 'faq'",
        "select": "id,content,type",
        "vectorQueries": [{"kind": "vector", "fields": "embedding", "k": 3}]
      })))
      .with_status(200)
      .with_body(
        r#"{"value": [
          {"@search.score": 0.9, "id": "a", "type": "faq", "content": "{\"question\":\"q\",\"answer\":\"a\"}"},
          {"@search.score": 0.5, "id": "b", "type": "faq", "content": "{}"}
        ]}"#,
      )
      .create_async()
      .await;

    let hits = index(server.url())
      .search("faq-index", &[0.1, 0.2], 3, &Filter::type_eq("faq"))
      .await
      .unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "a");
    assert_eq!(hits[0].kind, DocumentType::Faq);
    assert!((hits[0].score - 0.9).abs() < 1e-6);
  }

  #[tokio::test]
  async fn test_search_failure_is_index_error() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("POST", "/indexes/faq-index/docs/search")
      .match_query(Matcher::Any)
      .with_status(503)
      .with_body("Service Unavailable")
      .create_async()
      .await;

    let result = index(server.url()).search("faq-index", &[0.1], 3, &Filter::type_eq("doc")).await;
    assert!(matches!(result, Err(Error::Index(_))));
  }
}
