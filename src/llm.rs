//! LLM client adapter.
//!
//! `ChatCompleter` is the seam the generator and validator talk to; `OpenAI`
//! is the production implementation (one chat.completions call per request,
//! no retries, no caching). Tests substitute their own implementation.
//!
//! NOTE: We never log the API key, and only log lengths/previews of payloads.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::config::ProviderConfig;
use crate::util::trunc_for_log;

/// One system + user exchange with the provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ChatRequest {
  pub system: String,
  pub user: String,
  pub model: String,
  pub max_tokens: u32,
  pub temperature: f32,
  pub json_mode: bool,
}

impl ChatRequest {
  /// Enforce the adapter's input constraints before anything goes on the wire.
  pub fn check(&self) -> Result<(), ProviderError> {
    if self.system.trim().is_empty() {
      return Err(ProviderError::InvalidRequest("system prompt is empty".into()));
    }
    if self.user.trim().is_empty() {
      return Err(ProviderError::InvalidRequest("user prompt is empty".into()));
    }
    if self.model.trim().is_empty() {
      return Err(ProviderError::InvalidRequest("model id is empty".into()));
    }
    if self.max_tokens == 0 {
      return Err(ProviderError::InvalidRequest("max_tokens must be > 0".into()));
    }
    if !(0.0..=2.0).contains(&self.temperature) {
      return Err(ProviderError::InvalidRequest(format!("temperature {} outside 0..=2", self.temperature)));
    }
    Ok(())
  }
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
  #[error("invalid completion request: {0}")]
  InvalidRequest(String),
  #[error("provider request failed: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("provider returned HTTP {status}: {message}")]
  Status { status: StatusCode, message: String },
  #[error("malformed provider response: {0}")]
  MalformedEnvelope(String),
  #[error("provider returned an empty completion")]
  EmptyCompletion,
}

impl ProviderError {
  pub fn is_timeout(&self) -> bool {
    match self {
      ProviderError::Transport(e) => e.is_timeout(),
      ProviderError::Status { status, .. } => *status == StatusCode::GATEWAY_TIMEOUT,
      _ => false,
    }
  }
}

#[async_trait]
pub trait ChatCompleter: Send + Sync {
  /// Send `req` and return the assistant text, trimmed. Never returns an empty string.
  async fn complete(&self, req: &ChatRequest) -> Result<String, ProviderError>;
}

/// OpenAI-compatible chat.completions client. Built once at startup and shared read-only.
#[derive(Clone)]
pub struct OpenAI {
  client: reqwest::Client,
  api_key: String,
  base_url: String,
}

impl OpenAI {
  pub fn new(cfg: &ProviderConfig) -> Result<Self, ProviderError> {
    let client = reqwest::Client::builder().timeout(cfg.timeout).build()?;
    Ok(Self { client, api_key: cfg.api_key.clone(), base_url: cfg.base_url.clone() })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }
}

#[async_trait]
impl ChatCompleter for OpenAI {
  #[instrument(
    target = "llm",
    level = "info",
    skip(self, req),
    fields(model = %req.model, max_tokens = req.max_tokens, temperature = req.temperature, user_len = req.user.len())
  )]
  async fn complete(&self, req: &ChatRequest) -> Result<String, ProviderError> {
    req.check()?;

    let url = format!("{}/chat/completions", self.base_url);
    let body = ChatCompletionRequest {
      model: &req.model,
      messages: vec![
        ChatMessageReq { role: "system", content: &req.system },
        ChatMessageReq { role: "user", content: &req.user },
      ],
      temperature: req.temperature,
      max_tokens: req.max_tokens,
      response_format: req.json_mode.then_some(ResponseFormat { r#type: "json_object" }),
    };

    let start = Instant::now();
    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, concat!("mcq-backend/", env!("CARGO_PKG_VERSION")))
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&body)
      .send()
      .await
      .map_err(|e| {
        error!(target: "llm", elapsed = ?start.elapsed(), error = %e, "Provider request failed");
        ProviderError::from(e)
      })?;

    let status = res.status();
    if !status.is_success() {
      let raw = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&raw).unwrap_or_else(|| trunc_for_log(&raw, 300));
      warn!(target: "llm", %status, elapsed = ?start.elapsed(), %message, "Provider returned non-success status");
      return Err(ProviderError::Status { status, message });
    }

    let raw = res.text().await?;
    let text = parse_completion(&raw)?;
    info!(target: "llm", elapsed = ?start.elapsed(), response_len = text.len(), "Provider response received");
    Ok(text)
  }
}

/// Pull the assistant text out of a chat.completions envelope.
pub fn parse_completion(raw: &str) -> Result<String, ProviderError> {
  let body: ChatCompletionResponse = serde_json::from_str(raw)
    .map_err(|e| ProviderError::MalformedEnvelope(format!("{e}; body: {}", trunc_for_log(raw, 200))))?;

  if let Some(usage) = &body.usage {
    info!(target: "llm", prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Provider usage");
  }

  let text = body
    .choices
    .into_iter()
    .next()
    .and_then(|c| c.message.content)
    .map(|s| s.trim().to_string())
    .unwrap_or_default();

  if text.is_empty() {
    return Err(ProviderError::EmptyCompletion);
  }
  Ok(text)
}

/// Try to extract a clean error message from an OpenAI error body.
pub fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: EObj,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
  model: &'a str,
  messages: Vec<ChatMessageReq<'a>>,
  temperature: f32,
  max_tokens: u32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
}
#[derive(Serialize)]
struct ChatMessageReq<'a> {
  role: &'static str,
  content: &'a str,
}
#[derive(Serialize)]
struct ResponseFormat {
  #[serde(rename = "type")]
  r#type: &'static str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)]
  usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice {
  message: ChatMessageResp,
}
#[derive(Deserialize)]
struct ChatMessageResp {
  content: Option<String>,
}
#[derive(Deserialize)]
struct Usage {
  #[serde(default)]
  prompt_tokens: Option<u32>,
  #[serde(default)]
  completion_tokens: Option<u32>,
  #[serde(default)]
  total_tokens: Option<u32>,
}
