//! Speech processing traits
//!
//! Boundary interfaces wrapping a single external capability each, so the
//! orchestrator can be driven by mocks in tests and by provider-backed
//! implementations in production.

use async_trait::async_trait;

use crate::audio::AudioClip;
use crate::error::PipelineError;

/// A transcription result
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    /// Recognized text; may be empty when no usable speech was found
    pub text: String,
}

impl Transcript {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// True when the provider found no usable speech
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Speech-to-text interface
///
/// Implementations:
/// - `DeepgramTranscriber` - provider REST transcription
///
/// An empty transcript is a valid result, not an error; the caller decides
/// how to react to silence.
#[async_trait]
pub trait Transcriber: Send + Sync + 'static {
    /// Transcribe one complete utterance
    async fn transcribe(&self, audio: &AudioClip) -> Result<Transcript, PipelineError>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

/// Text-to-speech interface
///
/// Implementations:
/// - `DeepgramSynthesizer` - provider REST synthesis
#[async_trait]
pub trait Synthesizer: Send + Sync + 'static {
    /// Synthesize text into an encoded audio clip
    async fn synthesize(&self, text: &str) -> Result<AudioClip, PipelineError>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockTranscriber;

    #[async_trait]
    impl Transcriber for MockTranscriber {
        async fn transcribe(&self, _audio: &AudioClip) -> Result<Transcript, PipelineError> {
            Ok(Transcript::new("test transcription"))
        }

        fn model_name(&self) -> &str {
            "mock-stt"
        }
    }

    #[tokio::test]
    async fn test_mock_transcriber() {
        let stt = MockTranscriber;
        let transcript = stt.transcribe(&AudioClip::mpeg(vec![1, 2, 3])).await.unwrap();
        assert_eq!(transcript.text, "test transcription");
        assert_eq!(stt.model_name(), "mock-stt");
    }

    #[test]
    fn test_transcript_emptiness() {
        assert!(Transcript::new("   ").is_empty());
        assert!(!Transcript::new("hello").is_empty());
    }
}
