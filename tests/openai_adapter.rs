//! Drives the reqwest-backed adapter against a local mock provider.

use std::{
  net::SocketAddr,
  sync::{Arc, Mutex},
  time::Duration,
};

use axum::{
  extract::State,
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
  routing::post,
  Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use mcq_backend::config::ProviderConfig;
use mcq_backend::error::ApiError;
use mcq_backend::llm::{ChatCompleter, ChatRequest, OpenAI, ProviderError};

#[derive(Clone)]
struct Mock {
  status: StatusCode,
  body: String,
  seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn chat_completions(State(mock): State<Mock>, headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
  let auth = headers
    .get("authorization")
    .and_then(|v| v.to_str().ok())
    .map(str::to_string);
  mock.seen.lock().unwrap().push((auth, body));
  (mock.status, [("content-type", "application/json")], mock.body.clone())
}

async fn spawn_mock(status: StatusCode, body: &str) -> (SocketAddr, Arc<Mutex<Vec<(Option<String>, Value)>>>) {
  let seen = Arc::new(Mutex::new(Vec::new()));
  let mock = Mock { status, body: body.to_string(), seen: seen.clone() };
  let app = Router::new().route("/v1/chat/completions", post(chat_completions)).with_state(mock);
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  (addr, seen)
}

fn client(addr: SocketAddr) -> OpenAI {
  OpenAI::new(&ProviderConfig {
    api_key: "sk-mock".into(),
    base_url: format!("http://{addr}/v1"),
    timeout: Duration::from_secs(5),
  })
  .unwrap()
}

fn request(json_mode: bool) -> ChatRequest {
  ChatRequest {
    system: "You write MCQs.".into(),
    user: "Subject 'Science', chapter 'Light'.".into(),
    model: "gpt-4o-mini".into(),
    max_tokens: 300,
    temperature: 0.7,
    json_mode,
  }
}

#[tokio::test]
async fn sends_chat_completion_and_returns_trimmed_text() {
  let envelope = json!({
    "id": "chatcmpl-1",
    "choices": [{"index": 0, "message": {"role": "assistant", "content": "\n  {\"question\":\"Q?\"}  "}}],
    "usage": {"prompt_tokens": 40, "completion_tokens": 8, "total_tokens": 48}
  });
  let (addr, seen) = spawn_mock(StatusCode::OK, &envelope.to_string()).await;

  let text = client(addr).complete(&request(false)).await.unwrap();
  assert_eq!(text, r#"{"question":"Q?"}"#);

  let seen = seen.lock().unwrap();
  assert_eq!(seen.len(), 1);
  let (auth, body) = &seen[0];
  assert_eq!(auth.as_deref(), Some("Bearer sk-mock"));
  assert_eq!(body["model"], "gpt-4o-mini");
  assert_eq!(body["max_tokens"], 300);
  assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
  assert_eq!(body["messages"][0], json!({"role": "system", "content": "You write MCQs."}));
  assert_eq!(body["messages"][1]["role"], "user");
  assert!(body.get("response_format").is_none());
}

#[tokio::test]
async fn json_mode_requests_json_object_format() {
  let envelope = json!({"choices": [{"message": {"content": "{}"}}]});
  let (addr, seen) = spawn_mock(StatusCode::OK, &envelope.to_string()).await;

  client(addr).complete(&request(true)).await.unwrap();
  let seen = seen.lock().unwrap();
  assert_eq!(seen[0].1["response_format"], json!({"type": "json_object"}));
}

#[tokio::test]
async fn non_success_status_carries_provider_message() {
  let err_body = json!({"error": {"message": "You exceeded your current quota", "type": "insufficient_quota"}});
  let (addr, _) = spawn_mock(StatusCode::TOO_MANY_REQUESTS, &err_body.to_string()).await;

  let err = client(addr).complete(&request(false)).await.unwrap_err();
  match err {
    ProviderError::Status { status, message } => {
      assert_eq!(status.as_u16(), 429);
      assert_eq!(message, "You exceeded your current quota");
    }
    other => panic!("expected status error, got {other:?}"),
  }
}

#[tokio::test]
async fn malformed_envelope_is_reported() {
  let (addr, _) = spawn_mock(StatusCode::OK, r#"{"unexpected":true}"#).await;
  let err = client(addr).complete(&request(false)).await.unwrap_err();
  assert!(matches!(err, ProviderError::MalformedEnvelope(_)), "{err:?}");
}

#[tokio::test]
async fn invalid_request_is_rejected_without_network_call() {
  let (addr, seen) = spawn_mock(StatusCode::OK, "{}").await;
  let bad = ChatRequest { max_tokens: 0, ..request(false) };
  let err = client(addr).complete(&bad).await.unwrap_err();
  assert!(matches!(err, ProviderError::InvalidRequest(_)));
  assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_provider_is_a_transport_error() {
  // Bind then drop to get a port nobody listens on.
  let addr = {
    let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
    l.local_addr().unwrap()
  };
  let err = client(addr).complete(&request(false)).await.unwrap_err();
  assert!(matches!(err, ProviderError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn slow_provider_times_out_and_maps_to_gateway_timeout() {
  async fn stall() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3)).await;
    "{}"
  }
  let app = Router::new().route("/v1/chat/completions", post(stall));
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });

  let impatient = OpenAI::new(&ProviderConfig {
    api_key: "sk-mock".into(),
    base_url: format!("http://{addr}/v1"),
    timeout: Duration::from_millis(300),
  })
  .unwrap();

  let err = impatient.complete(&request(false)).await.unwrap_err();
  assert!(matches!(err, ProviderError::Transport(_)), "{err:?}");
  assert!(err.is_timeout());
  assert_eq!(ApiError::from(err).status(), StatusCode::GATEWAY_TIMEOUT);
}
