//! Speech-to-text adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use loanmate_core::{AudioClip, PipelineError, Transcriber, Transcript};

use crate::DeepgramConfig;

/// REST transcription over the provider's `listen` endpoint
///
/// Sends the complete utterance in one request. An empty transcript is a
/// valid result here; deciding how to react to silence belongs to the
/// orchestrator, not the adapter.
pub struct DeepgramTranscriber {
    client: Client,
    config: DeepgramConfig,
}

impl DeepgramTranscriber {
    /// Create a new transcriber
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
        format!("{}/v1/listen", self.config.endpoint)
    }
}

#[async_trait]
impl Transcriber for DeepgramTranscriber {
    async fn transcribe(&self, audio: &AudioClip) -> Result<Transcript, PipelineError> {
        tracing::debug!(
            model = %self.config.stt_model,
            bytes = audio.len(),
            "sending audio for transcription"
        );

        let response = self
            .client
            .post(self.api_url())
            .query(&[
                ("model", self.config.stt_model.as_str()),
                ("smart_format", "true"),
                ("language", self.config.language.as_str()),
            ])
            .header("Authorization", format!("Token {}", self.config.api_key))
            .header("Content-Type", &audio.mime_type)
            .body(audio.bytes.clone())
            .send()
            .await
            .map_err(|e| map_request_error(e, self.config.timeout.as_millis() as u64))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(PipelineError::Stt(format!("{status}: {error}")));
        }

        let parsed: ListenResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::InvalidResponse(e.to_string()))?;

        let transcript = parsed.first_transcript();
        tracing::debug!(transcript = %transcript.text, "transcription complete");
        Ok(transcript)
    }

    fn model_name(&self) -> &str {
        &self.config.stt_model
    }
}

fn map_request_error(e: reqwest::Error, timeout_ms: u64) -> PipelineError {
    if e.is_timeout() {
        PipelineError::Timeout(timeout_ms)
    } else {
        PipelineError::Stt(e.to_string())
    }
}

// listen API response types

#[derive(Debug, Deserialize)]
struct ListenResponse {
    #[serde(default)]
    results: Option<ListenResults>,
}

impl ListenResponse {
    /// Transcript of the first alternative of the first channel, or empty
    fn first_transcript(&self) -> Transcript {
        self.results
            .as_ref()
            .and_then(|r| r.channels.first())
            .and_then(|c| c.alternatives.first())
            .map(|a| Transcript::new(a.transcript.clone()))
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    #[serde(default)]
    channels: Vec<ListenChannel>,
}

#[derive(Debug, Deserialize)]
struct ListenChannel {
    #[serde(default)]
    alternatives: Vec<ListenAlternative>,
}

#[derive(Debug, Deserialize)]
struct ListenAlternative {
    #[serde(default)]
    transcript: String,
}
