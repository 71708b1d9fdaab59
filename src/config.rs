//! Process configuration: provider credential + endpoint from the environment,
//! prompts and per-path call settings from an optional TOML file.
//!
//! See `AppConfig`, `FileConfig` and `Prompts` for the expected schema.

use std::{net::SocketAddr, path::Path, str::FromStr, time::Duration};

use serde::Deserialize;
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("environment variable {0} is required")]
  MissingVar(&'static str),
  #[error("environment variable {name} has invalid value {value:?}")]
  InvalidVar { name: &'static str, value: String },
  #[error("failed to read config file {path}: {source}")]
  Read { path: String, source: std::io::Error },
  #[error("failed to parse config file {path}: {source}")]
  Parse { path: String, source: toml::de::Error },
  #[error("invalid [{section}] settings: {reason}")]
  InvalidSettings { section: &'static str, reason: String },
}

/// Fully resolved configuration, built once at startup and never mutated.
#[derive(Clone, Debug)]
pub struct AppConfig {
  pub provider: ProviderConfig,
  pub mcq_model: String,
  pub validate_model: String,
  pub prompts: Prompts,
  pub mcq: CallSettings,
  pub validate: CallSettings,
  pub listen: SocketAddr,
}

/// Provider endpoint and credential. `Debug` never prints the key.
#[derive(Clone)]
pub struct ProviderConfig {
  pub api_key: String,
  pub base_url: String,
  pub timeout: Duration,
}

impl std::fmt::Debug for ProviderConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ProviderConfig")
      .field("api_key", &"<redacted>")
      .field("base_url", &self.base_url)
      .field("timeout", &self.timeout)
      .finish()
  }
}

/// Token budget / sampling for one outbound call path.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CallSettings {
  pub max_tokens: u32,
  pub temperature: f32,
  /// Ask the provider for `response_format = json_object`.
  pub json_mode: bool,
}

impl Default for CallSettings {
  fn default() -> Self {
    Self { max_tokens: 300, temperature: 0.7, json_mode: false }
  }
}

impl CallSettings {
  fn check(&self, section: &'static str) -> Result<(), ConfigError> {
    if self.max_tokens == 0 {
      return Err(ConfigError::InvalidSettings { section, reason: "max_tokens must be > 0".into() });
    }
    if !(0.0..=2.0).contains(&self.temperature) {
      return Err(ConfigError::InvalidSettings {
        section,
        reason: format!("temperature {} outside 0..=2", self.temperature),
      });
    }
    Ok(())
  }
}

/// Optional TOML file. Every table and key may be omitted.
#[derive(Clone, Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
  pub prompts: Prompts,
  pub mcq: CallSettings,
  pub validate: CallSettings,
}

/// Prompts used by the generator and validator. `{subject}`, `{chapter}`,
/// `{question}` and `{answer}` are substituted verbatim.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Prompts {
  pub mcq_system: String,
  pub mcq_user_template: String,
  pub validate_system: String,
  pub validate_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      mcq_system: "You are an assistant that generates educational content related to CBSE boards 10th standard subjects like multiple-choice questions.".into(),
      mcq_user_template: "Generate a multiple-choice question (MCQ) with four options based on the CBSE 10th class subject '{subject}' and chapter '{chapter}'. Include the question, four options (A-D), and indicate the correct option. Return response as a json with 'question', 'options', and 'correct_option'. dont include any text to indicate its json or any other header data in the response".into(),
      validate_system: "You are an assistant that evaluates answers to multiple-choice questions.".into(),
      validate_user_template: "Validate the answer '{answer}' for the following question:\n\n'{question}'\n\nProvide feedback indicating if the answer is correct or incorrect and explain why.".into(),
    }
  }
}

impl Prompts {
  fn check(&self) -> Result<(), ConfigError> {
    let fields = [
      ("mcq_system", &self.mcq_system),
      ("mcq_user_template", &self.mcq_user_template),
      ("validate_system", &self.validate_system),
      ("validate_user_template", &self.validate_user_template),
    ];
    match fields.iter().find(|(_, v)| v.trim().is_empty()) {
      Some((name, _)) => Err(ConfigError::InvalidSettings { section: "prompts", reason: format!("{name} must not be blank") }),
      None => Ok(()),
    }
  }
}

impl FileConfig {
  pub fn from_toml_str(s: &str, path: &str) -> Result<Self, ConfigError> {
    let cfg: FileConfig =
      toml::from_str(s).map_err(|source| ConfigError::Parse { path: path.to_string(), source })?;
    cfg.prompts.check()?;
    cfg.mcq.check("mcq")?;
    cfg.validate.check("validate")?;
    Ok(cfg)
  }

  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let shown = path.display().to_string();
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: shown.clone(), source })?;
    let cfg = Self::from_toml_str(&s, &shown)?;
    info!(target: "mcq_backend", path = %shown, "Loaded prompts config (TOML)");
    Ok(cfg)
  }
}

impl AppConfig {
  /// Resolve configuration from process environment (after `.env` has been applied).
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_lookup(|k| std::env::var(k).ok())
  }

  /// Same as `from_env` but reads variables through `get`; lets tests avoid touching the real env.
  pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let non_empty = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let api_key = non_empty("OPENAI_API_KEY").ok_or(ConfigError::MissingVar("OPENAI_API_KEY"))?;
    let base_url = non_empty("OPENAI_BASE_URL")
      .unwrap_or_else(|| DEFAULT_BASE_URL.into())
      .trim_end_matches('/')
      .to_string();
    let timeout_secs: u64 = parse_var(&non_empty, "OPENAI_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);

    let file = match non_empty("PROMPTS_CONFIG_PATH") {
      Some(path) => FileConfig::load(Path::new(&path))?,
      None => FileConfig::default(),
    };

    let host: std::net::IpAddr =
      parse_var(&non_empty, "HOST")?.unwrap_or(std::net::IpAddr::from([127, 0, 0, 1]));
    let port: u16 = parse_var(&non_empty, "PORT")?.unwrap_or(DEFAULT_PORT);

    Ok(Self {
      provider: ProviderConfig { api_key, base_url, timeout: Duration::from_secs(timeout_secs) },
      mcq_model: non_empty("OPENAI_MCQ_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
      validate_model: non_empty("OPENAI_VALIDATE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
      prompts: file.prompts,
      mcq: file.mcq,
      validate: file.validate,
      listen: SocketAddr::new(host, port),
    })
  }
}

fn parse_var<T, F>(get: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
  T: FromStr,
  F: Fn(&str) -> Option<String>,
{
  match get(name) {
    None => Ok(None),
    Some(value) => value.parse::<T>().map(Some).map_err(|_| ConfigError::InvalidVar { name, value }),
  }
}
