//! Core traits and types for the LoanMate collections agent
//!
//! This crate provides the foundational types used across all other crates:
//! - Audio buffer type passed between the HTTP layer and the speech adapters
//! - Conversation types (utterances, bounded history)
//! - Customer record produced by directory lookup
//! - Traits for pluggable speech backends (STT, TTS)
//! - Error types

pub mod audio;
pub mod conversation;
pub mod customer;
pub mod error;
pub mod traits;

pub use audio::AudioClip;
pub use conversation::{ConversationHistory, Role, Utterance};
pub use customer::CustomerRecord;
pub use error::PipelineError;
pub use traits::{Synthesizer, Transcriber, Transcript};
