//! MCQ backend: a small HTTP service that proxies MCQ generation and answer
//! validation to an OpenAI-compatible chat-completions API.

pub mod config;
pub mod domain;
pub mod error;
pub mod llm;
pub mod logic;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod util;

pub use routes::build_router;
pub use state::AppState;
