//! Call-session state machine and turn orchestration
//!
//! This crate owns the only stateful part of the system: the single call
//! session with its identity-resolution state and bounded history, and the
//! orchestrator that sequences transcription, prompt composition, dialogue
//! and synthesis for each turn.

pub mod agent;
pub mod classifier;
pub mod session;

pub use agent::{AgentConfig, AgentTurn, CollectionsAgent};
pub use classifier::is_name_request;
pub use session::{CallSession, IdentityState};

use thiserror::Error;

/// Orchestration errors
///
/// Everything recoverable becomes a spoken fallback inside the turn; only
/// what the HTTP layer must report as a structured error surfaces here.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("no audio supplied")]
    NoAudio,

    #[error("speech synthesis failed: {0}")]
    SpeechSynthesis(String),
}
