//! CLI commands, run in-process against the configured backends

use anyhow::{anyhow, Context, Result};
use colored::*;
use std::path::Path;

use crate::cli::display::format_hit;
use crate::config::Settings;
use crate::models::{load_faq_source, DocumentContent, Filter, NewDocument};
use crate::pipeline::{AnswerSynthesizer, QaOptions, QaOrchestrator, QaOutcome};
use crate::services::{DocumentStore, IndexStatus};

async fn open_store(settings: &Settings) -> Result<DocumentStore> {
  settings.validate()?;
  let embedder = settings.embedder()?;
  let index = settings.vector_index().await?;
  Ok(DocumentStore::open(index, embedder, settings.index_schema()).await)
}

/// Create the vector index if it does not exist yet
pub async fn ensure_index(settings: &Settings) -> Result<()> {
  settings.validate()?;
  let store = DocumentStore::new(settings.vector_index().await?, settings.embedder()?, settings.index_schema());
  let schema = store.schema();

  match store.ensure_index().await? {
    IndexStatus::Created => {
      println!("{} Created index {} ({} dimensions)", "✓".green(), schema.name.cyan(), schema.dimension)
    }
    IndexStatus::AlreadyExists => println!("Index {} already exists", schema.name.cyan()),
  }
  Ok(())
}

/// Bulk load FAQ records from a JSON or YAML seed file
pub async fn load_faq(settings: &Settings, file: &Path) -> Result<()> {
  let records = load_faq_source(file)?;
  if records.is_empty() {
    bentley::warn!("{} contains no FAQ records", file.display());
    return Ok(());
  }

  let store = open_store(settings).await?;
  let report = store.bulk_insert_from_source(&records).await;

  println!(
    "{} Loaded {} of {} FAQ records into {}",
    "✓".green(),
    report.inserted.len(),
    records.len(),
    store.schema().name.cyan()
  );
  if report.failed > 0 {
    bentley::warn!("{} records failed; see the log for details", report.failed);
  }
  Ok(())
}

/// Insert the text of `file` as a plain `doc` document
pub async fn add_document(settings: &Settings, file: &Path) -> Result<()> {
  let text = std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
  if text.trim().is_empty() {
    return Err(anyhow!("{} is empty", file.display()));
  }

  let store = open_store(settings).await?;
  let id = store.insert(NewDocument::new(DocumentContent::plain(text))).await?;

  println!("{} Added {} as {}", "✓".green(), file.display(), id.yellow());
  Ok(())
}

/// Run the QA pipeline for one question and print the answer
pub async fn ask(settings: &Settings, question: &str, k: Option<usize>) -> Result<()> {
  let store = open_store(settings).await?;
  let synthesizer = AnswerSynthesizer::new(settings.chat_model()?, settings.qa_temperature);
  let qa = QaOrchestrator::new(store, synthesizer, QaOptions { k: settings.top_k, ..QaOptions::default() });

  let answer = qa.answer_with_k(question, k.unwrap_or(settings.top_k)).await?;
  println!("{}", answer.response);

  match answer.outcome {
    QaOutcome::Generated => bentley::verbose!("answered from {} sources", answer.source_ids.len()),
    QaOutcome::Declined => bentley::info!("no FAQ entry matched the question"),
    QaOutcome::Fallback => bentley::warn!("the chat model failed; replied with the fallback"),
  }
  Ok(())
}

/// Print the nearest documents for `query`
pub async fn search(settings: &Settings, query: &str, k: Option<usize>, filter: Option<&str>) -> Result<()> {
  let filter = filter.map(str::parse::<Filter>).transpose()?;
  let store = open_store(settings).await?;

  let hits = store.search(query, k.unwrap_or(settings.top_k), filter.as_ref()).await?;
  if hits.is_empty() {
    println!("No matching documents.");
    return Ok(());
  }

  for (rank, hit) in hits.iter().enumerate() {
    print!("{}", format_hit(rank + 1, hit));
  }
  Ok(())
}
