//! faqbot REST Server
//!
//! HTTP API for FAQ answering, document upload and certificate verification.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use faqbot::config::Settings;
use faqbot::server::startup::start_server;

#[derive(Parser)]
#[command(name = "faqbot_server")]
#[command(about = "faqbot REST API Server")]
#[command(version)]
struct Args {
  /// Server bind address
  #[arg(long, env = "FAQBOT_BIND", default_value = "127.0.0.1:3000")]
  bind: SocketAddr,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,

  #[command(flatten)]
  settings: Settings,
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let filter = if args.verbose {
    EnvFilter::new("debug,hyper=info,reqwest=info,lance=warn,lance_datafusion=warn,datafusion=warn")
  } else {
    EnvFilter::new("faqbot=info,tower_http=info,lance=error,lance_datafusion=error,datafusion=error,warn")
  };

  tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

  bentley::info!("Starting faqbot REST Server v{}", env!("CARGO_PKG_VERSION"));
  bentley::info!("Binding to address: {}", args.bind);

  start_server(args.bind, &args.settings).await
}
