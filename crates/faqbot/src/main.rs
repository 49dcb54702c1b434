use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use faqbot::cli::commands;
use faqbot::config::Settings;

#[derive(Parser)]
#[command(name = "faqbot")]
#[command(about = "faqbot - retrieval-augmented FAQ answering\nLoad FAQ entries, search them and ask questions")]
#[command(version)]
struct Cli {
  #[command(subcommand)]
  command: Command,

  /// Show debug logs from the pipeline
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(flatten)]
  settings: Settings,
}

#[derive(Subcommand)]
enum Command {
  /// Bulk load FAQ entries from a JSON or YAML file ({"faq": [{question, answer}]})
  Load {
    /// Path to the seed file
    file: PathBuf,
  },
  /// Index the text of a file as a plain document
  AddDoc {
    /// Path to a UTF-8 text file
    file: PathBuf,
  },
  /// Answer a question from the indexed FAQ
  Ask {
    /// The question
    question: String,
    /// Documents to retrieve (defaults to FAQ_TOP_K)
    #[arg(short, long)]
    k: Option<usize>,
  },
  /// Show the documents nearest to a query
  Search {
    /// Text to search for
    query: String,
    /// Maximum number of results (defaults to FAQ_TOP_K)
    #[arg(short, long)]
    k: Option<usize>,
    /// Filter expression, e.g. "type eq 'faq'" (defaults to type eq 'doc')
    #[arg(short, long)]
    filter: Option<String>,
  },
  /// Create the vector index if it is missing
  EnsureIndex,
}

async fn handle(command: Command, settings: &Settings) -> Result<()> {
  match command {
    Command::Load { file } => commands::load_faq(settings, &file).await,
    Command::AddDoc { file } => commands::add_document(settings, &file).await,
    Command::Ask { question, k } => commands::ask(settings, &question, k).await,
    Command::Search { query, k, filter } => commands::search(settings, &query, k, filter.as_deref()).await,
    Command::EnsureIndex => commands::ensure_index(settings).await,
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose { EnvFilter::new("faqbot=debug,warn") } else { EnvFilter::new("error") };
  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

  handle(cli.command, &cli.settings).await
}
