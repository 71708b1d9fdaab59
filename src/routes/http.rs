//! HTTP endpoint handlers. These are thin wrappers that check required fields
//! and forward to core logic; errors leave through `ApiError`.

use std::sync::Arc;

use axum::{
  extract::{rejection::JsonRejection, State},
  Json,
};
use tracing::{info, instrument};

use crate::domain::McqOutcome;
use crate::error::{ApiError, MCQ_FIELDS_REQUIRED, VALIDATE_FIELDS_REQUIRED};
use crate::logic::{generate_mcq, validate_answer};
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> Json<HealthOut> {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip_all)]
pub async fn http_generate_mcq(
  State(state): State<Arc<AppState>>,
  body: Result<Json<McqIn>, JsonRejection>,
) -> Result<Json<McqOutcome>, ApiError> {
  let Json(body) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
  let (subject, chapter) =
    require_pair(&body.subject, &body.chapter).ok_or(ApiError::MissingFields(MCQ_FIELDS_REQUIRED))?;
  info!(target: "mcq", %subject, %chapter, "HTTP generate_mcq received");

  let outcome = generate_mcq(&state, subject, chapter).await?;
  info!(target: "mcq", ok = outcome.is_question(), "HTTP generate_mcq served");
  Ok(Json(outcome))
}

#[instrument(level = "info", skip_all)]
pub async fn http_validate_answer(
  State(state): State<Arc<AppState>>,
  body: Result<Json<ValidateIn>, JsonRejection>,
) -> Result<Json<ValidateOut>, ApiError> {
  let Json(body) = body.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
  let (question, answer) =
    require_pair(&body.question, &body.answer).ok_or(ApiError::MissingFields(VALIDATE_FIELDS_REQUIRED))?;
  info!(target: "validate", question_len = question.len(), answer_len = answer.len(), "HTTP validate_answer received");

  let out = validate_answer(&state, question, answer).await?;
  Ok(Json(out))
}
