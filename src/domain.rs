//! Domain models: the multiple-choice question, its option labels, and the
//! strict parser that turns raw model text into either an `Mcq` or a
//! `SchemaViolation`.

use serde::Serialize;
use serde_json::{Map, Value};

/// The four option labels, in presentation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum OptionLabel {
  A,
  B,
  C,
  D,
}

impl OptionLabel {
  pub fn as_str(self) -> &'static str {
    match self {
      OptionLabel::A => "A",
      OptionLabel::B => "B",
      OptionLabel::C => "C",
      OptionLabel::D => "D",
    }
  }

  fn from_char(c: char) -> Option<Self> {
    match c.to_ascii_uppercase() {
      'A' => Some(OptionLabel::A),
      'B' => Some(OptionLabel::B),
      'C' => Some(OptionLabel::C),
      'D' => Some(OptionLabel::D),
      _ => None,
    }
  }

  /// Read a label from what a model typically writes for `correct_option`:
  /// `"A"`, `"b"`, `"A)"`, `"(C)"`, `"D. Newton"`, `"A) 3x10^8 m/s"`, `"Option B"`.
  pub fn parse_loose(raw: &str) -> Option<Self> {
    let s = raw.trim();
    let s = strip_prefix_ignore_case(s, "option").map(str::trim_start).unwrap_or(s);
    let s = s.strip_prefix('(').unwrap_or(s);
    let mut chars = s.chars();
    let label = OptionLabel::from_char(chars.next()?)?;
    match chars.next() {
      None => Some(label),
      Some(c) if !c.is_alphanumeric() => Some(label),
      Some(_) => None,
    }
  }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
  let head = s.get(..prefix.len())?;
  head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// A well-formed multiple-choice question. `options` are in A, B, C, D order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Mcq {
  pub question: String,
  pub options: [String; 4],
  pub correct_option: OptionLabel,
}

/// Structured failure reported in place of an `Mcq`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct McqError {
  pub error: String,
  pub details: String,
}

pub const MCQ_PARSE_ERROR: &str = "Error parsing response from LLM";

impl From<SchemaViolation> for McqError {
  fn from(v: SchemaViolation) -> Self {
    McqError { error: MCQ_PARSE_ERROR.to_string(), details: v.to_string() }
  }
}

/// What the generator hands back: a question or a parse failure, never both.
/// Serialized untagged so the wire body is either `{question, options, correct_option}`
/// or `{error, details}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum McqOutcome {
  Question(Mcq),
  Failed(McqError),
}

impl McqOutcome {
  pub fn is_question(&self) -> bool {
    matches!(self, McqOutcome::Question(_))
  }
}

/// Why model text could not become an `Mcq`.
#[derive(Debug, thiserror::Error)]
pub enum SchemaViolation {
  #[error("response is not valid JSON: {0}")]
  InvalidJson(#[from] serde_json::Error),
  #[error("response JSON is not an object")]
  NotAnObject,
  #[error("missing field '{0}'")]
  MissingField(&'static str),
  #[error("field '{field}' must be {expected}")]
  WrongType { field: &'static str, expected: &'static str },
  #[error("expected 4 options (A-D), got {0}")]
  OptionCount(usize),
  #[error("correct_option {0:?} is not one of A, B, C, D")]
  UnknownLabel(String),
}

/// Strictly parse model output as an MCQ. Surrounding whitespace is ignored;
/// any prose or markdown fence around the JSON is a syntax failure.
pub fn parse_mcq(text: &str) -> Result<Mcq, SchemaViolation> {
  let value: Value = serde_json::from_str(text.trim())?;
  let obj = value.as_object().ok_or(SchemaViolation::NotAnObject)?;

  let question = required(obj, "question")?
    .as_str()
    .map(str::trim)
    .filter(|q| !q.is_empty())
    .ok_or(SchemaViolation::WrongType { field: "question", expected: "a non-empty string" })?
    .to_string();

  let options = parse_options(required(obj, "options")?)?;

  let raw_label = required(obj, "correct_option")?
    .as_str()
    .ok_or(SchemaViolation::WrongType { field: "correct_option", expected: "a string" })?;
  let correct_option =
    OptionLabel::parse_loose(raw_label).ok_or_else(|| SchemaViolation::UnknownLabel(raw_label.to_string()))?;

  Ok(Mcq { question, options, correct_option })
}

fn required<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, SchemaViolation> {
  match obj.get(field) {
    None | Some(Value::Null) => Err(SchemaViolation::MissingField(field)),
    Some(v) => Ok(v),
  }
}

fn parse_options(v: &Value) -> Result<[String; 4], SchemaViolation> {
  let items = v
    .as_array()
    .ok_or(SchemaViolation::WrongType { field: "options", expected: "an array of 4 strings" })?;
  if items.len() != 4 {
    return Err(SchemaViolation::OptionCount(items.len()));
  }
  let mut out: [String; 4] = Default::default();
  for (slot, item) in out.iter_mut().zip(items) {
    *slot = item
      .as_str()
      .ok_or(SchemaViolation::WrongType { field: "options", expected: "an array of 4 strings" })?
      .to_string();
  }
  Ok(out)
}
