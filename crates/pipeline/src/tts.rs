//! Text-to-speech adapter and the two-attempt speech policy

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use loanmate_core::{AudioClip, PipelineError, Synthesizer};

use crate::DeepgramConfig;

/// REST synthesis over the provider's `speak` endpoint
pub struct DeepgramSynthesizer {
    client: Client,
    config: DeepgramConfig,
}

impl DeepgramSynthesizer {
    /// Create a new synthesizer
    pub fn new(config: DeepgramConfig) -> Result<Self, PipelineError> {
        if config.api_key.is_empty() {
            return Err(PipelineError::Configuration(
                "speech API key is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                PipelineError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    fn api_url(&self) -> String {
        format!("{}/v1/speak", self.config.endpoint)
    }
}

#[derive(Debug, Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
}

#[async_trait]
impl Synthesizer for DeepgramSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioClip, PipelineError> {
        tracing::debug!(
            model = %self.config.tts_model,
            chars = text.len(),
            "sending text for synthesis"
        );

        let response = self
            .client
            .post(self.api_url())
            .query(&[
                ("model", self.config.tts_model.as_str()),
                ("encoding", "mp3"),
            ])
            .header("Authorization", format!("Token {}", self.config.api_key))
            .json(&SpeakRequest { text })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PipelineError::Timeout(self.config.timeout.as_millis() as u64)
                } else {
                    PipelineError::Tts(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(PipelineError::Tts(format!("{status}: {error}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Tts(e.to_string()))?;

        if bytes.is_empty() {
            return Err(PipelineError::Tts("provider returned empty audio".to_string()));
        }

        tracing::debug!(bytes = bytes.len(), "synthesis complete");
        Ok(AudioClip::mpeg(bytes.to_vec()))
    }

    fn model_name(&self) -> &str {
        &self.config.tts_model
    }
}

/// Outcome of a speech attempt
#[derive(Debug)]
pub enum SynthesisOutcome {
    /// Audio was produced, possibly for the fallback phrase
    Spoken(AudioClip),
    /// Both the requested text and the fallback phrase failed
    Exhausted { reason: String },
}

/// Two-attempt speech policy over a synthesizer
///
/// The first attempt synthesizes the requested text; if it fails, exactly one
/// retry is made with a fixed fallback phrase so the caller still hears
/// something. Only when the fallback also fails does the adapter report
/// exhaustion.
pub struct SpeechAdapter {
    synthesizer: Arc<dyn Synthesizer>,
}

impl SpeechAdapter {
    /// Fixed phrase used for the retry attempt
    pub const FALLBACK_UTTERANCE: &'static str =
        "I'm having trouble speaking at the moment. Please try again later.";

    /// Substitute for an empty input text; synthesizing nothing is never valid
    const EMPTY_TEXT_UTTERANCE: &'static str =
        "I encountered an internal error and cannot respond right now.";

    /// Create an adapter over the given synthesizer
    pub fn new(synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self { synthesizer }
    }

    /// Synthesize `text`, falling back once on failure
    pub async fn speak(&self, text: &str) -> SynthesisOutcome {
        let text = if text.trim().is_empty() {
            tracing::warn!("asked to speak empty text; substituting internal-error utterance");
            Self::EMPTY_TEXT_UTTERANCE
        } else {
            text
        };

        let first_error = match self.synthesizer.synthesize(text).await {
            Ok(audio) => return SynthesisOutcome::Spoken(audio),
            Err(e) => e,
        };

        tracing::warn!(
            model = self.synthesizer.model_name(),
            error = %first_error,
            "synthesis failed; retrying with the fallback phrase"
        );

        match self.synthesizer.synthesize(Self::FALLBACK_UTTERANCE).await {
            Ok(audio) => SynthesisOutcome::Spoken(audio),
            Err(second_error) => {
                tracing::error!(
                    model = self.synthesizer.model_name(),
                    error = %second_error,
                    "fallback synthesis also failed"
                );
                SynthesisOutcome::Exhausted {
                    reason: format!(
                        "first attempt: {first_error}; fallback attempt: {second_error}"
                    ),
                }
            }
        }
    }
}
