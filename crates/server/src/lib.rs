//! HTTP front end for the LoanMate collections agent
//!
//! Thin adapter over the orchestrator: routes, state, and the mapping from
//! agent errors to HTTP responses. All call logic lives in `loanmate-agent`.

pub mod http;
pub mod state;

pub use http::create_router;
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use loanmate_agent::AgentError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("no audio supplied")]
    NoAudio,

    #[error("speech synthesis failed: {0}")]
    SpeechSynthesis(String),
}

impl From<AgentError> for ServerError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::NoAudio => ServerError::NoAudio,
            AgentError::SpeechSynthesis(reason) => ServerError::SpeechSynthesis(reason),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ServerError::NoAudio => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": "no audio supplied" }),
            ),
            ServerError::SpeechSynthesis(reason) => (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({ "error": "speech synthesis failed", "details": reason }),
            ),
        };
        (status, Json(body)).into_response()
    }
}
