//! Speech adapters for the LoanMate collections agent
//!
//! Turns are complete utterances, so both directions are single REST calls
//! against the speech provider: an audio buffer in for a transcript, a text
//! string in for an audio buffer. The `SpeechAdapter` wraps synthesis with
//! the two-attempt fallback policy the orchestrator relies on.

use std::time::Duration;

pub mod stt;
pub mod tts;

pub use stt::DeepgramTranscriber;
pub use tts::{DeepgramSynthesizer, SpeechAdapter, SynthesisOutcome};

/// Speech provider configuration, shared by both adapters
#[derive(Debug, Clone)]
pub struct DeepgramConfig {
    /// Provider endpoint base URL
    pub endpoint: String,
    /// API key; the adapters refuse to construct without one
    pub api_key: String,
    /// Transcription model
    pub stt_model: String,
    /// Synthesis voice model
    pub tts_model: String,
    /// Transcription language tag
    pub language: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for DeepgramConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.deepgram.com".to_string(),
            api_key: String::new(),
            stt_model: "nova-2".to_string(),
            tts_model: "aura-asteria-en".to_string(),
            language: "en-US".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}
