//! Dialogue backend implementations
//!
//! The backend is a strategy selected once at construction: `GeminiBackend`
//! talks to the live generateContent REST API, `MockDialogueBackend` returns
//! deterministic replies so the pipeline and test suite run without a model.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use loanmate_core::{Role, Utterance};

use crate::LlmError;

/// Identity-resolution snapshot handed to the backend
///
/// Only the mock backend acts on this; the live backend derives everything
/// it needs from the system prompt and history.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityHint {
    /// The agent just asked for the caller's name
    AwaitingName,
    /// Identity unresolved, no name request outstanding
    Unknown,
    /// A directory record is attached
    Known { name: String },
}

/// A generation request
#[derive(Debug, Clone)]
pub struct DialogueRequest {
    /// Composed system prompt
    pub system_prompt: String,
    /// Conversation so far, oldest first; never empty (the engine inserts
    /// a trigger turn on the first exchange)
    pub history: Vec<Utterance>,
    /// Identity snapshot for mock reply selection
    pub identity: IdentityHint,
}

/// Why generation stopped
#[derive(Debug, Clone, PartialEq)]
pub enum FinishReason {
    /// Normal completion
    Stop,
    /// The provider's content filter intervened
    ContentFiltered { reason: Option<String> },
}

/// A generation result
#[derive(Debug, Clone)]
pub struct DialogueReply {
    /// Generated text; may be empty
    pub text: String,
    pub finish_reason: FinishReason,
}

impl DialogueReply {
    /// A plain completed reply
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            text: content.into(),
            finish_reason: FinishReason::Stop,
        }
    }
}

/// Dialogue backend strategy
#[async_trait]
pub trait DialogueBackend: Send + Sync + 'static {
    /// Generate a reply for the given prompt and history
    async fn generate(&self, request: DialogueRequest) -> Result<DialogueReply, LlmError>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Live backend configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API endpoint base URL
    pub endpoint: String,
    /// API key
    pub api_key: String,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            api_key: String::new(),
            model: "gemini-1.5-flash-latest".to_string(),
            temperature: 0.7,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Live generateContent backend
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    /// Create a new live backend
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Configuration("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn api_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint, self.config.model
        )
    }
}

#[async_trait]
impl DialogueBackend for GeminiBackend {
    async fn generate(&self, request: DialogueRequest) -> Result<DialogueReply, LlmError> {
        let body = GenerateContentRequest::from_dialogue(&request, self.config.temperature);

        tracing::debug!(
            model = %self.config.model,
            history_len = request.history.len(),
            "sending generation request"
        );

        let response = self
            .client
            .post(self.api_url())
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{status}: {error}")));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        // Prompt-level block: no candidate was produced at all
        if let Some(feedback) = &parsed.prompt_feedback {
            if feedback.block_reason.is_some() {
                return Ok(DialogueReply {
                    text: String::new(),
                    finish_reason: FinishReason::ContentFiltered {
                        reason: feedback.reason_text(),
                    },
                });
            }
        }

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            return Ok(DialogueReply {
                text: String::new(),
                finish_reason: FinishReason::ContentFiltered { reason: None },
            });
        };

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Ok(DialogueReply {
                text: String::new(),
                finish_reason: FinishReason::ContentFiltered {
                    reason: candidate.finish_reason,
                },
            });
        }

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(DialogueReply::text(text))
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

/// Deterministic mock backend
///
/// Used when the live backend is disabled or unconfigured; replies are
/// chosen by the identity snapshot so the rest of the pipeline and the test
/// suite behave the same on every call.
pub struct MockDialogueBackend;

impl MockDialogueBackend {
    /// Mock reply while a provided name is being resolved
    pub const AWAITING_NAME_REPLY: &'static str =
        "Thank you. Could you confirm the spelling of your name so I can look up your account?";

    /// Mock greeting once a customer record is attached
    pub fn known_customer_reply(name: &str) -> String {
        format!(
            "Hello {name}, this is LoanMate from Global Finance Solutions. \
             I'm calling regarding your loan account. Is this a good time to talk?"
        )
    }

    /// Mock greeting when identity is unresolved
    pub const UNKNOWN_CUSTOMER_REPLY: &'static str =
        "Hello, this is LoanMate from Global Finance Solutions. Could you please tell me \
         your full name so I can bring up your account details?";
}

#[async_trait]
impl DialogueBackend for MockDialogueBackend {
    async fn generate(&self, request: DialogueRequest) -> Result<DialogueReply, LlmError> {
        let text = match &request.identity {
            IdentityHint::AwaitingName => Self::AWAITING_NAME_REPLY.to_string(),
            IdentityHint::Known { name } => Self::known_customer_reply(name),
            IdentityHint::Unknown => Self::UNKNOWN_CUSTOMER_REPLY.to_string(),
        };
        Ok(DialogueReply::text(text))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// generateContent API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: ContentDto,
    contents: Vec<ContentDto>,
    generation_config: GenerationConfigDto,
}

impl GenerateContentRequest {
    fn from_dialogue(request: &DialogueRequest, temperature: f32) -> Self {
        Self {
            system_instruction: ContentDto {
                role: None,
                parts: vec![PartDto {
                    text: Some(request.system_prompt.clone()),
                }],
            },
            contents: request
                .history
                .iter()
                .map(|u| ContentDto {
                    role: Some(
                        match u.role {
                            Role::Customer => "user",
                            Role::Agent => "model",
                        }
                        .to_string(),
                    ),
                    parts: vec![PartDto {
                        text: Some(u.text.clone()),
                    }],
                })
                .collect(),
            generation_config: GenerationConfigDto { temperature },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<PartDto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PartDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerationConfigDto {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<CandidateDto>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedbackDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidateDto {
    #[serde(default)]
    content: Option<ContentDto>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedbackDto {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

impl PromptFeedbackDto {
    fn reason_text(&self) -> Option<String> {
        self.block_reason_message
            .clone()
            .or_else(|| self.block_reason.clone())
    }
}
