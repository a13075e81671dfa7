//! Error types shared across the workspace
//!
//! Each crate carries its own error enum for its own concern; this module
//! holds only the speech pipeline taxonomy, which lives next to the
//! `Transcriber`/`Synthesizer` traits it belongs to.

use thiserror::Error;

/// Speech pipeline errors (STT/TTS adapters)
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("STT error: {0}")]
    Stt(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}
