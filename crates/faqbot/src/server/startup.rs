//! REST server startup and configuration

use anyhow::{Context, Result};
use axum::{serve, Router};
use bentley::service_log::ServiceLog;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Settings;
use crate::server::routing::create_router;
use crate::server::state::AppState;

const COMPONENT: &str = "faqbot-server";

/// Router with tracing and CORS layers applied
pub fn build_app(state: AppState) -> Router {
  create_router(state).layer(
    ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()),
  )
}

/// Start the REST server and run until ctrl-c
pub async fn start_server(addr: SocketAddr, settings: &Settings) -> Result<()> {
  let logs_path = settings.service_log_path();
  let logs = ServiceLog::open(&logs_path)
    .with_context(|| format!("failed to open service log at {}", logs_path.display()))?;

  logs.info(&format!("Starting faqbot REST server on {addr}"), COMPONENT).await;
  let state = match AppState::from_settings(settings, logs.clone()).await {
    Ok(state) => state,
    Err(e) => {
      logs.error(&format!("Start-up failed: {e:#}"), COMPONENT).await;
      return Err(e);
    }
  };

  let app = build_app(state);

  let listener = TcpListener::bind(addr).await.with_context(|| format!("failed to bind {addr}"))?;
  logs.info(&format!("Server listening on {addr}"), COMPONENT).await;

  match serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
    Ok(()) => {
      logs.info("Server shutdown gracefully", COMPONENT).await;
      Ok(())
    }
    Err(e) => {
      logs.error(&format!("Server error: {e}"), COMPONENT).await;
      Err(anyhow::anyhow!("Server error: {e}"))
    }
  }
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
}
