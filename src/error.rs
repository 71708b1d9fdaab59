//! API error type and its mapping to HTTP status + JSON body.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::error;

use crate::llm::ProviderError;
use crate::protocol::ErrorOut;

pub const MCQ_FIELDS_REQUIRED: &str = "Both 'subject' and 'chapter' are required fields.";
pub const VALIDATE_FIELDS_REQUIRED: &str = "Both 'question' and 'answer' are required fields.";
pub const INVALID_BODY: &str = "Request body must be a JSON object.";
pub const PROVIDER_FAILED: &str = "LLM provider request failed";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  #[error("{0}")]
  MissingFields(&'static str),
  #[error("invalid request body: {0}")]
  InvalidBody(String),
  #[error(transparent)]
  Provider(#[from] ProviderError),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::MissingFields(_) | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
      ApiError::Provider(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
      ApiError::Provider(_) => StatusCode::BAD_GATEWAY,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = match self {
      ApiError::MissingFields(msg) => ErrorOut { error: msg.to_string(), details: None },
      ApiError::InvalidBody(details) => ErrorOut { error: INVALID_BODY.to_string(), details: Some(details) },
      ApiError::Provider(e) => {
        error!(target: "mcq_backend", %status, error = %e, "Provider failure surfaced to client");
        ErrorOut { error: PROVIDER_FAILED.to_string(), details: Some(e.to_string()) }
      }
    };
    (status, Json(body)).into_response()
  }
}
