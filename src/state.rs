//! Application state: the injected LLM adapter plus the immutable prompts and
//! per-path call settings. Shared read-only across requests.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::{AppConfig, CallSettings, Prompts};
use crate::llm::{ChatCompleter, OpenAI, ProviderError};

/// Model id + call settings for one outbound path.
#[derive(Clone, Debug)]
pub struct CallProfile {
  pub model: String,
  pub settings: CallSettings,
}

#[derive(Clone)]
pub struct AppState {
  pub llm: Arc<dyn ChatCompleter>,
  pub prompts: Prompts,
  pub mcq: CallProfile,
  pub validate: CallProfile,
}

impl AppState {
  /// Build production state: one shared reqwest-backed OpenAI client.
  #[instrument(level = "info", skip_all)]
  pub fn from_config(cfg: &AppConfig) -> Result<Self, ProviderError> {
    let openai = OpenAI::new(&cfg.provider)?;
    info!(
      target: "mcq_backend",
      base_url = %openai.base_url(),
      mcq_model = %cfg.mcq_model,
      validate_model = %cfg.validate_model,
      "OpenAI client ready"
    );
    Ok(Self::with_client(Arc::new(openai), cfg))
  }

  /// Build state around any adapter; tests pass a stub here.
  pub fn with_client(llm: Arc<dyn ChatCompleter>, cfg: &AppConfig) -> Self {
    Self {
      llm,
      prompts: cfg.prompts.clone(),
      mcq: CallProfile { model: cfg.mcq_model.clone(), settings: cfg.mcq },
      validate: CallProfile { model: cfg.validate_model.clone(), settings: cfg.validate },
    }
  }
}
