//! MCQ backend · process startup
//!
//! - Axum HTTP API: POST /generate_mcq, POST /validate_answer, GET /health
//! - OpenAI-compatible provider (credential required at startup)
//!
//! Important env variables (a `.env` file is read first if present):
//!   OPENAI_API_KEY        : required
//!   OPENAI_BASE_URL       : default "https://api.openai.com/v1"
//!   OPENAI_MCQ_MODEL      : default "gpt-4o-mini"
//!   OPENAI_VALIDATE_MODEL : default "gpt-4o-mini"
//!   OPENAI_TIMEOUT_SECS   : default 20
//!   HOST / PORT           : default 127.0.0.1:5001
//!   PROMPTS_CONFIG_PATH   : optional TOML with [prompts], [mcq], [validate]
//!   LOG_LEVEL             : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT            : "pretty" (default) or "json"

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};

use mcq_backend::config::AppConfig;
use mcq_backend::{build_router, telemetry, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  // Missing .env is fine; real env vars always win.
  let _ = dotenv::dotenv();
  telemetry::init_tracing();

  let cfg = AppConfig::from_env().map_err(|e| {
    error!(target: "mcq_backend", error = %e, "Invalid configuration");
    e
  })?;
  let state = Arc::new(AppState::from_config(&cfg)?);
  let app = build_router(state);

  let listener = TcpListener::bind(cfg.listen).await?;
  info!(target: "mcq_backend", addr = %cfg.listen, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  info!(target: "mcq_backend", "HTTP server stopped");
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      error!(target: "mcq_backend", error = %e, "Failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        error!(target: "mcq_backend", error = %e, "Failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };
  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
  info!(target: "mcq_backend", "Shutdown signal received");
}
