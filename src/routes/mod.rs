//! Router assembly: HTTP endpoints, CORS, HTTP tracing and a JSON 404 fallback.

use std::sync::Arc;

use axum::{
  http::StatusCode,
  response::IntoResponse,
  routing::{get, post},
  Json, Router,
};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::protocol::ErrorOut;
use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - `POST /generate_mcq` and `POST /validate_answer`
/// - `GET /health`
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(http::http_health))
    .route("/generate_mcq", post(http::http_generate_mcq))
    .route("/validate_answer", post(http::http_validate_answer))
    .fallback(not_found)
    .with_state(state)
    .layer(
      CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any),
    )
    .layer(
      TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

async fn not_found() -> impl IntoResponse {
  (StatusCode::NOT_FOUND, Json(ErrorOut { error: "Not found".into(), details: None }))
}
