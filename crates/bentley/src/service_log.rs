//! Persistent, structured logs for long-running services
//!
//! Entries are appended to a JSONL file so they survive restarts and can be
//! served back to operators (the faqbot server exposes them on `/logs`).
//! Every write is mirrored to the console unless the log is silent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

use crate::Level;

/// Request context attached to a log entry
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct LogContext {
  /// Request ID for correlation
  #[serde(skip_serializing_if = "Option::is_none")]
  pub request_id: Option<String>,

  /// HTTP method
  #[serde(skip_serializing_if = "Option::is_none")]
  pub method: Option<String>,

  /// Request path
  #[serde(skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,

  /// Request duration in milliseconds
  #[serde(skip_serializing_if = "Option::is_none")]
  pub duration_ms: Option<f64>,

  /// HTTP status code
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status_code: Option<u16>,
}

/// One persisted log line
#[derive(Debug, Serialize, Deserialize, Clone)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct LogEntry {
  pub timestamp: DateTime<Utc>,
  pub level: String,
  pub message: String,
  pub component: String,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub context: Option<LogContext>,
}

struct ServiceLogInner {
  path: PathBuf,
  silent: bool,
}

/// Thread-safe JSONL log shared across request handlers
#[derive(Clone)]
pub struct ServiceLog {
  inner: Arc<Mutex<ServiceLogInner>>,
}

impl ServiceLog {
  /// Open (or create) a log file, creating parent directories as needed
  pub fn open<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
    Self::open_with_silent(path, false)
  }

  /// Open a log file that never echoes to the console
  pub fn open_with_silent<P: AsRef<Path>>(path: P, silent: bool) -> std::io::Result<Self> {
    let path = path.as_ref().to_path_buf();

    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    // Never truncate an existing log
    if !path.exists() {
      File::create(&path)?;
    }

    Ok(Self { inner: Arc::new(Mutex::new(ServiceLogInner { path, silent })) })
  }

  /// Path of the backing JSONL file
  pub async fn path(&self) -> PathBuf {
    self.inner.lock().await.path.clone()
  }

  /// Append an entry, returning any I/O failure
  pub async fn append(
    &self,
    level: Level,
    message: &str,
    component: &str,
    context: Option<LogContext>,
  ) -> std::io::Result<()> {
    let entry = LogEntry {
      timestamp: Utc::now(),
      level: level.as_str().to_string(),
      message: message.to_string(),
      component: component.to_string(),
      context,
    };

    let line = serde_json::to_string(&entry)
      .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let guard = self.inner.lock().await;
    let mut file = OpenOptions::new().create(true).append(true).open(&guard.path)?;
    writeln!(file, "{line}")?;
    file.flush()?;

    if !guard.silent {
      crate::emit(level, message);
    }

    Ok(())
  }

  /// Append an entry and ignore I/O failures; logging never fails a request
  pub async fn record(&self, level: Level, message: &str, component: &str, context: Option<LogContext>) {
    let _ = self.append(level, message, component, context).await;
  }

  pub async fn info(&self, message: &str, component: &str) {
    self.record(Level::Info, message, component, None).await;
  }

  pub async fn success(&self, message: &str, component: &str) {
    self.record(Level::Success, message, component, None).await;
  }

  pub async fn warn(&self, message: &str, component: &str) {
    self.record(Level::Warn, message, component, None).await;
  }

  pub async fn error(&self, message: &str, component: &str) {
    self.record(Level::Error, message, component, None).await;
  }

  /// Most recent entries, oldest first, optionally filtered by level
  ///
  /// A level of `"all"` disables filtering. Malformed lines are skipped.
  pub async fn recent(&self, limit: Option<usize>, level: Option<&str>) -> std::io::Result<Vec<LogEntry>> {
    let guard = self.inner.lock().await;
    if !guard.path.exists() {
      return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(&guard.path)?);
    let mut entries = Vec::new();

    for line in reader.lines() {
      let line = line?;
      if line.trim().is_empty() {
        continue;
      }

      let Ok(entry) = serde_json::from_str::<LogEntry>(&line) else {
        continue;
      };

      if level.is_none_or(|filter| filter == "all" || entry.level == filter) {
        entries.push(entry);
      }
    }

    entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

    if let Some(limit) = limit {
      let skip = entries.len().saturating_sub(limit);
      entries.drain(..skip);
    }

    Ok(entries)
  }
}
