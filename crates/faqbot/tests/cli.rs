use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::str::contains;
use serial_test::serial;
use std::process::Command;

/// `faqbot` with offline backends and a temporary data directory
fn faqbot_cmd(data_dir: &assert_fs::TempDir) -> Command {
  let mut cmd = Command::cargo_bin("faqbot").expect("binary exists");
  cmd
    .env_clear()
    .env("FAQBOT_DATA_DIR", data_dir.path())
    .env("INDEX_BACKEND", "memory")
    .env("EMBEDDING_BACKEND", "hashed")
    .env("STORAGE_BACKEND", "local")
    .env("EMBEDDING_DIMENSION", "128")
    .env("NO_COLOR", "1");
  cmd
}

#[test]
#[serial]
fn test_ensure_index_creates_in_memory_index() {
  let temp = assert_fs::TempDir::new().unwrap();

  faqbot_cmd(&temp).arg("ensure-index").assert().success().stdout(contains("Created index faq-index"));
}

#[test]
#[serial]
fn test_load_reports_inserted_records() {
  let temp = assert_fs::TempDir::new().unwrap();
  let seed = temp.child("faq.yaml");
  seed
    .write_str(
      "faq:\n  - question: What is X?\n    answer: X is a service.\n  - question: Is it free?\n    answer: Yes.\n",
    )
    .unwrap();

  faqbot_cmd(&temp)
    .args(["load", seed.path().to_str().unwrap()])
    .assert()
    .success()
    .stdout(contains("Loaded 2 of 2 FAQ records"));
}

#[test]
#[serial]
fn test_search_on_empty_index() {
  let temp = assert_fs::TempDir::new().unwrap();

  faqbot_cmd(&temp)
    .args(["search", "anything", "--filter", "type eq 'faq'"])
    .assert()
    .success()
    .stdout(contains("No matching documents."));
}

#[test]
#[serial]
fn test_search_rejects_bad_filter() {
  let temp = assert_fs::TempDir::new().unwrap();

  faqbot_cmd(&temp)
    .args(["search", "anything", "--filter", "score gt 3"])
    .assert()
    .failure();
}

#[test]
#[serial]
fn test_search_rejects_zero_k() {
  let temp = assert_fs::TempDir::new().unwrap();

  faqbot_cmd(&temp)
    .args(["search", "anything", "--k", "0"])
    .assert()
    .failure()
    .stderr(contains("k must be at least 1"));
}

#[test]
#[serial]
fn test_ask_without_openai_credentials_names_the_variable() {
  let temp = assert_fs::TempDir::new().unwrap();

  faqbot_cmd(&temp)
    .args(["ask", "What is X?"])
    .assert()
    .failure()
    .stderr(contains("OPENAI_AZURE_ENDPOINT"));
}
