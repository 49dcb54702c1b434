//! Blob storage for uploaded documents
//!
//! Blobs are addressed as `container/name`. Azure Blob Storage is reached over
//! REST with the shared access signature from the connection string; the local
//! backend mirrors the same layout under a directory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};
use crate::services::http;

/// `container/name` address of a blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobPath {
  pub container: String,
  pub name: String,
}

impl BlobPath {
  pub fn new(container: impl Into<String>, name: impl Into<String>) -> Result<Self> {
    let path = Self { container: container.into(), name: name.into() };
    if path.container.trim().is_empty() || path.container.contains('/') {
      return Err(Error::Validation(format!("invalid container name '{}'", path.container)));
    }
    if path.name.trim().is_empty() {
      return Err(Error::Validation("blob name must not be empty".to_string()));
    }
    Ok(path)
  }
}

impl FromStr for BlobPath {
  type Err = Error;

  /// Split at the first `/`; the remainder may contain further slashes
  fn from_str(value: &str) -> Result<Self> {
    match value.split_once('/') {
      Some((container, name)) => BlobPath::new(container, name),
      None => Err(Error::Validation(format!(
        "document path '{value}' must look like '<container>/<filename>'"
      ))),
    }
  }
}

impl fmt::Display for BlobPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.container, self.name)
  }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStorage: Send + Sync {
  /// Store `bytes` at `path`, replacing any existing blob
  async fn put(&self, path: &BlobPath, bytes: Vec<u8>) -> Result<BlobPath>;

  /// Read the blob at `path`; `None` when it does not exist
  async fn get(&self, path: &BlobPath) -> Result<Option<Vec<u8>>>;
}

/// Azure Blob Storage authorised by a shared access signature
pub struct AzureBlobStorage {
  client: reqwest::Client,
  endpoint: Url,
  sas: String,
}

impl AzureBlobStorage {
  pub fn new(endpoint: Url, sas: impl Into<String>, timeout: Duration) -> Result<Self> {
    let sas = sas.into().trim_start_matches('?').to_string();
    Ok(Self { client: http::build_client(timeout)?, endpoint, sas })
  }

  /// Build from `BlobEndpoint=…;SharedAccessSignature=…` or the
  /// `AccountName`/`EndpointSuffix` form of an Azure connection string
  pub fn from_connection_string(connection_string: &str, timeout: Duration) -> Result<Self> {
    let settings: HashMap<&str, &str> = connection_string
      .split(';')
      .filter_map(|pair| pair.split_once('='))
      .map(|(key, value)| (key.trim(), value.trim()))
      .collect();

    let endpoint = match settings.get("BlobEndpoint") {
      Some(endpoint) => endpoint.to_string(),
      None => {
        let account = settings.get("AccountName").ok_or_else(|| {
          Error::Config("storage connection string needs BlobEndpoint or AccountName".to_string())
        })?;
        let protocol = settings.get("DefaultEndpointsProtocol").copied().unwrap_or("https");
        let suffix = settings.get("EndpointSuffix").copied().unwrap_or("core.windows.net");
        format!("{protocol}://{account}.blob.{suffix}")
      }
    };
    let endpoint = Url::parse(&endpoint)
      .map_err(|e| Error::Config(format!("invalid blob endpoint '{endpoint}': {e}")))?;

    let sas = settings.get("SharedAccessSignature").ok_or_else(|| {
      Error::Config(
        "storage connection string has no SharedAccessSignature; account-key signing is not supported"
          .to_string(),
      )
    })?;

    Self::new(endpoint, *sas, timeout)
  }

  fn url(&self, segments: &[&str], extra_query: Option<&str>) -> Result<Url> {
    let mut url = self.endpoint.clone();
    {
      let mut path = url
        .path_segments_mut()
        .map_err(|_| Error::Config(format!("blob endpoint '{}' cannot hold a path", self.endpoint)))?;
      path.pop_if_empty();
      for segment in segments {
        path.push(segment);
      }
    }
    let query = match extra_query {
      Some(extra) if self.sas.is_empty() => extra.to_string(),
      Some(extra) => format!("{extra}&{}", self.sas),
      None => self.sas.clone(),
    };
    url.set_query(if query.is_empty() { None } else { Some(&query) });
    Ok(url)
  }

  fn blob_url(&self, path: &BlobPath) -> Result<Url> {
    let mut segments = vec![path.container.as_str()];
    segments.extend(path.name.split('/'));
    self.url(&segments, None)
  }

  async fn ensure_container(&self, container: &str) -> Result<()> {
    let url = self.url(&[container], Some("restype=container"))?;
    let response = self
      .client
      .put(url)
      .header("x-ms-version", "2021-08-06")
      .send()
      .await
      .map_err(|e| Error::Storage(format!("create container request failed: {e}")))?;

    let status = response.status();
    if status.is_success() || status == reqwest::StatusCode::CONFLICT {
      return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Storage(format!(
      "failed to create container '{container}': {}",
      http::describe_failure(status, &body)
    )))
  }
}

#[async_trait]
impl BlobStorage for AzureBlobStorage {
  async fn put(&self, path: &BlobPath, bytes: Vec<u8>) -> Result<BlobPath> {
    self.ensure_container(&path.container).await?;

    let size = bytes.len();
    let response = self
      .client
      .put(self.blob_url(path)?)
      .header("x-ms-version", "2021-08-06")
      .header("x-ms-blob-type", "BlockBlob")
      .body(bytes)
      .send()
      .await
      .map_err(|e| Error::Storage(format!("upload request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(Error::Storage(format!(
        "failed to upload '{path}': {}",
        http::describe_failure(status, &body)
      )));
    }

    tracing::info!(blob = %path, bytes = size, "uploaded blob");
    Ok(path.clone())
  }

  async fn get(&self, path: &BlobPath) -> Result<Option<Vec<u8>>> {
    let response = self
      .client
      .get(self.blob_url(path)?)
      .header("x-ms-version", "2021-08-06")
      .send()
      .await
      .map_err(|e| Error::Storage(format!("download request failed: {e}")))?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
      return Ok(None);
    }
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(Error::Storage(format!(
        "failed to download '{path}': {}",
        http::describe_failure(status, &body)
      )));
    }

    let bytes = response
      .bytes()
      .await
      .map_err(|e| Error::Storage(format!("failed to read '{path}': {e}")))?;
    Ok(Some(bytes.to_vec()))
  }
}

/// Directory-backed storage: `<root>/<container>/<name>`
pub struct LocalBlobStorage {
  root: PathBuf,
}

impl LocalBlobStorage {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  fn file_path(&self, path: &BlobPath) -> Result<PathBuf> {
    let relative = Path::new(&path.container).join(&path.name);
    let escapes = relative
      .components()
      .any(|component| !matches!(component, Component::Normal(_)));
    if escapes {
      return Err(Error::Validation(format!("blob path '{path}' must stay inside its container")));
    }
    Ok(self.root.join(relative))
  }
}

#[async_trait]
impl BlobStorage for LocalBlobStorage {
  async fn put(&self, path: &BlobPath, bytes: Vec<u8>) -> Result<BlobPath> {
    let file = self.file_path(path)?;
    if let Some(parent) = file.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| Error::Storage(format!("failed to create {}: {e}", parent.display())))?;
    }
    tokio::fs::write(&file, bytes)
      .await
      .map_err(|e| Error::Storage(format!("failed to write {}: {e}", file.display())))?;
    Ok(path.clone())
  }

  async fn get(&self, path: &BlobPath) -> Result<Option<Vec<u8>>> {
    let file = self.file_path(path)?;
    match tokio::fs::read(&file).await {
      Ok(bytes) => Ok(Some(bytes)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(Error::Storage(format!("failed to read {}: {e}", file.display()))),
    }
  }
}
