//! Core behaviors behind the HTTP handlers:
//!   - MCQ generation: templated prompt, one provider call, strict parse
//!   - Answer validation: templated prompt, one provider call, text passthrough
//!
//! Provider failures propagate as `ProviderError`; only the MCQ path turns
//! malformed model output into a structured `McqError`.

use tracing::{info, instrument, warn};

use crate::domain::{parse_mcq, McqOutcome};
use crate::llm::{ChatRequest, ProviderError};
use crate::protocol::ValidateOut;
use crate::state::{AppState, CallProfile};
use crate::util::{fill_template, trunc_for_log};

fn build_request(profile: &CallProfile, system: String, user: String) -> ChatRequest {
  ChatRequest {
    system,
    user,
    model: profile.model.clone(),
    max_tokens: profile.settings.max_tokens,
    temperature: profile.settings.temperature,
    json_mode: profile.settings.json_mode,
  }
}

/// Prompt pair for an MCQ about `chapter` of `subject`.
pub fn mcq_request(state: &AppState, subject: &str, chapter: &str) -> ChatRequest {
  let pairs = [("subject", subject), ("chapter", chapter)];
  build_request(
    &state.mcq,
    fill_template(&state.prompts.mcq_system, &pairs),
    fill_template(&state.prompts.mcq_user_template, &pairs),
  )
}

/// Prompt pair asking whether `answer` is right for `question`, and why.
pub fn validate_request(state: &AppState, question: &str, answer: &str) -> ChatRequest {
  let pairs = [("question", question), ("answer", answer)];
  build_request(
    &state.validate,
    fill_template(&state.prompts.validate_system, &pairs),
    fill_template(&state.prompts.validate_user_template, &pairs),
  )
}

#[instrument(target = "mcq", level = "info", skip(state), fields(%subject, %chapter))]
pub async fn generate_mcq(
  state: &AppState,
  subject: &str,
  chapter: &str,
) -> Result<McqOutcome, ProviderError> {
  let req = mcq_request(state, subject, chapter);
  let text = state.llm.complete(&req).await?;

  match parse_mcq(&text) {
    Ok(mcq) => {
      info!(
        target: "mcq",
        question_preview = %mcq.question.chars().take(60).collect::<String>(),
        correct = mcq.correct_option.as_str(),
        "MCQ generated"
      );
      Ok(McqOutcome::Question(mcq))
    }
    Err(violation) => {
      warn!(
        target: "mcq",
        error = %violation,
        response = %trunc_for_log(&text, 200),
        "Model output failed MCQ schema"
      );
      Ok(McqOutcome::Failed(violation.into()))
    }
  }
}

#[instrument(target = "validate", level = "info", skip(state, question, answer), fields(question_len = question.len(), answer_len = answer.len()))]
pub async fn validate_answer(
  state: &AppState,
  question: &str,
  answer: &str,
) -> Result<ValidateOut, ProviderError> {
  let req = validate_request(state, question, answer);
  let validation_result = state.llm.complete(&req).await?;
  info!(target: "validate", feedback_len = validation_result.len(), "Answer feedback received");
  Ok(ValidateOut { validation_result })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::AppConfig;
  use crate::domain::OptionLabel;
  use crate::llm::ChatCompleter;
  use async_trait::async_trait;
  use std::sync::{Arc, Mutex};

  /// Replays a fixed reply and records every request it sees.
  struct Canned {
    reply: Result<String, fn() -> ProviderError>,
    seen: Mutex<Vec<ChatRequest>>,
  }

  impl Canned {
    fn ok(text: &str) -> Self {
      Self { reply: Ok(text.to_string()), seen: Mutex::new(Vec::new()) }
    }
    fn failing(f: fn() -> ProviderError) -> Self {
      Self { reply: Err(f), seen: Mutex::new(Vec::new()) }
    }
  }

  #[async_trait]
  impl ChatCompleter for Canned {
    async fn complete(&self, req: &ChatRequest) -> Result<String, ProviderError> {
      self.seen.lock().unwrap().push(req.clone());
      match &self.reply {
        Ok(t) => Ok(t.clone()),
        Err(f) => Err(f()),
      }
    }
  }

  fn state(llm: &Arc<Canned>) -> AppState {
    let cfg = AppConfig::from_lookup(|k| (k == "OPENAI_API_KEY").then(|| "sk-test".to_string())).unwrap();
    AppState::with_client(llm.clone(), &cfg)
  }

  #[tokio::test]
  async fn mcq_prompt_interpolates_subject_and_chapter() {
    let llm = Arc::new(Canned::ok(r#"{"question":"Q?","options":["a","b","c","d"],"correct_option":"B"}"#));
    let out = generate_mcq(&state(&llm), "Science", "Light").await.unwrap();
    assert!(matches!(&out, McqOutcome::Question(m) if m.correct_option == OptionLabel::B));

    let seen = llm.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let req = &seen[0];
    assert!(req.user.contains("subject 'Science'"));
    assert!(req.user.contains("chapter 'Light'"));
    assert!(req.system.contains("multiple-choice"));
    assert_eq!(req.model, "gpt-4o-mini");
    assert_eq!(req.max_tokens, 300);
    assert_eq!(req.temperature, 0.7);
  }

  #[tokio::test]
  async fn unparsable_output_degrades_to_error_outcome() {
    let llm = Arc::new(Canned::ok("Sure! Here is your question: What is light?"));
    let out = generate_mcq(&state(&llm), "Science", "Light").await.unwrap();
    match out {
      McqOutcome::Failed(e) => {
        assert_eq!(e.error, "Error parsing response from LLM");
        assert!(e.details.starts_with("response is not valid JSON"), "{}", e.details);
      }
      other => panic!("expected failure, got {other:?}"),
    }
  }

  #[tokio::test]
  async fn provider_failure_propagates_from_generator() {
    let llm = Arc::new(Canned::failing(|| ProviderError::EmptyCompletion));
    let err = generate_mcq(&state(&llm), "Maths", "Algebra").await.unwrap_err();
    assert!(matches!(err, ProviderError::EmptyCompletion));
  }

  #[tokio::test]
  async fn validator_returns_feedback_verbatim() {
    let llm = Arc::new(Canned::ok("Correct. Light travels at about 3x10^8 m/s in vacuum."));
    let out = validate_answer(&state(&llm), "What is the speed of light?", "A").await.unwrap();
    assert_eq!(out.validation_result, "Correct. Light travels at about 3x10^8 m/s in vacuum.");

    let seen = llm.seen.lock().unwrap();
    assert!(seen[0].user.contains("Validate the answer 'A'"));
    assert!(seen[0].user.contains("'What is the speed of light?'"));
  }

  #[tokio::test]
  async fn provider_failure_propagates_from_validator() {
    let llm = Arc::new(Canned::failing(|| ProviderError::MalformedEnvelope("eof".into())));
    let err = validate_answer(&state(&llm), "Q?", "A").await.unwrap_err();
    assert!(matches!(err, ProviderError::MalformedEnvelope(_)));
  }
}
