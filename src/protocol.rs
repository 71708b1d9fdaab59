//! Public HTTP request/response structs (serde ready).
//!
//! Request fields are optional at the serde level so that an absent field and
//! an empty one reach the same required-field check.

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct McqIn {
  #[serde(default)]
  pub subject: Option<String>,
  #[serde(default)]
  pub chapter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ValidateIn {
  #[serde(default)]
  pub question: Option<String>,
  #[serde(default)]
  pub answer: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ValidateOut {
  pub validation_result: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
  pub error: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub details: Option<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}

/// Both values present and non-blank, returned trimmed.
pub fn require_pair<'a>(a: &'a Option<String>, b: &'a Option<String>) -> Option<(&'a str, &'a str)> {
  let present = |v: &'a Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty());
  Some((present(a)?, present(b)?))
}
