//! Tracing setup for the service.
//!
//! - LOG_LEVEL holds `EnvFilter` directives (e.g. "debug" or
//!   "info,mcq=debug,llm=debug,tower_http=info"). Unparsable directives fall
//!   back to `DEFAULT_FILTER`.
//! - LOG_FORMAT is "pretty" (default) or "json".
//!
//! Log targets used by this crate: `mcq_backend` (startup/shutdown), `mcq`
//! (generator), `validate` (answer validator), `llm` (provider calls).

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,mcq_backend=debug,mcq=debug,validate=debug,llm=info,tower_http=info,axum=info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl LogFormat {
  pub fn from_setting(value: Option<&str>) -> Self {
    match value.map(str::trim) {
      Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
      _ => LogFormat::Pretty,
    }
  }
}

fn filter_from(directives: Option<String>) -> EnvFilter {
  directives
    .and_then(|d| EnvFilter::try_new(d).ok())
    .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. A second call keeps the first subscriber.
pub fn init_tracing() {
  let filter = filter_from(std::env::var("LOG_LEVEL").ok());
  let format = LogFormat::from_setting(std::env::var("LOG_FORMAT").ok().as_deref());

  let fmt = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(true)
    .with_file(true)
    .with_line_number(true);

  let installed = match format {
    LogFormat::Json => fmt.json().try_init(),
    LogFormat::Pretty => fmt.try_init(),
  };
  if let Err(e) = installed {
    eprintln!("tracing subscriber not installed: {e}");
  }
}
