//! ## Features
//!
//! - Levelled console notices (info, warn, error, debug, verbose, success)
//! - Multi-line message support with consistent prefixes
//! - A process-wide quiet switch for tests and scripted CLI runs
//! - `service-log` feature: persistent JSONL logs for long-running services
//!
//! ## Usage
//!
//! The macros accept `format!` arguments:
//!
//! ```ignore
//! bentley::info!("index '{}' ready", name);
//! bentley::warn!("skipped {} records", failed);
//! ```
//!
//! All console output goes to stderr so stdout stays clean for command results.

use chrono::Local;
use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "service-log")]
pub mod service_log;

static QUIET: AtomicBool = AtomicBool::new(false);

/// Silence (or restore) console notices for the whole process
pub fn set_quiet(quiet: bool) {
  QUIET.store(quiet, Ordering::Relaxed);
}

/// Whether console notices are currently silenced
pub fn is_quiet() -> bool {
  QUIET.load(Ordering::Relaxed)
}

/// Console severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Verbose,
  Debug,
  Info,
  Success,
  Warn,
  Error,
}

impl Level {
  /// Lowercase name used in persisted log entries
  pub fn as_str(&self) -> &'static str {
    match self {
      Level::Verbose => "verbose",
      Level::Debug => "debug",
      Level::Info => "info",
      Level::Success => "success",
      Level::Warn => "warn",
      Level::Error => "error",
    }
  }

  fn tag(&self) -> ColoredString {
    match self {
      Level::Verbose => "verb".cyan().bold(),
      Level::Debug => "debug".magenta().bold(),
      Level::Info => "info".blue().bold(),
      Level::Success => "sccs".green().bold(),
      Level::Warn => "warn".yellow().bold(),
      Level::Error => "error".red().bold(),
    }
  }
}

impl std::fmt::Display for Level {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Render the prefix for a console line
fn format_prefix(level: Level) -> String {
  let timestamp = Local::now().format("%H:%M:%S").to_string();
  format!("[{}] [{}]", level.tag(), timestamp.dimmed())
}

/// Emit a message at the given level, one prefixed line per message line
pub fn emit(level: Level, message: &str) {
  if is_quiet() {
    return;
  }

  let prefix = format_prefix(level);
  for line in message.lines() {
    eprintln!("{prefix} {line}");
  }
}

pub fn verbose(message: &str) {
  emit(Level::Verbose, message);
}

/// Detailed diagnostic information
pub fn debug(message: &str) {
  emit(Level::Debug, message);
}

/// General information
pub fn info(message: &str) {
  emit(Level::Info, message);
}

/// Something completed successfully
pub fn success(message: &str) {
  emit(Level::Success, message);
}

/// Something needs attention
pub fn warn(message: &str) {
  emit(Level::Warn, message);
}

/// Something went wrong
pub fn error(message: &str) {
  emit(Level::Error, message);
}

#[macro_export]
macro_rules! verbose {
  ($($arg:tt)*) => {
    $crate::verbose(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! debug {
  ($($arg:tt)*) => {
    $crate::debug(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => {
    $crate::info(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => {
    $crate::success(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! warn {
  ($($arg:tt)*) => {
    $crate::warn(&format!($($arg)*))
  };
}

#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => {
    $crate::error(&format!($($arg)*))
  };
}
