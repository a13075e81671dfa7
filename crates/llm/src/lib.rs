//! Prompt composition and dialogue backends
//!
//! This crate owns everything between the call session and the language
//! model: the deterministic system-prompt composer, the backend strategy
//! trait with its live and mock implementations, and the dialogue engine
//! that turns backend outcomes into speakable reply text.

pub mod backend;
pub mod engine;
pub mod prompt;

pub use backend::{
    DialogueBackend, DialogueReply, DialogueRequest, FinishReason, GeminiBackend, GeminiConfig,
    IdentityHint, MockDialogueBackend,
};
pub use engine::DialogueEngine;
pub use prompt::{
    compose_system_prompt, format_currency, uses_unknown_customer_branch,
    UNKNOWN_CUSTOMER_PLACEHOLDER,
};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(e.to_string())
        }
    }
}
