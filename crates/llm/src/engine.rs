//! Dialogue engine
//!
//! Sits between the call session and the backend strategy. Every backend
//! outcome, including errors, is converted into a speakable reply string:
//! the caller always gets something the speech adapter can say.

use std::sync::Arc;

use loanmate_core::Utterance;

use crate::backend::{DialogueBackend, DialogueRequest, FinishReason, IdentityHint};

/// Turn input supplied when the conversation has no history yet
///
/// The backend requires a non-empty turn input distinct from the system
/// prompt, so the first exchange is triggered with this neutral instruction.
pub const TRIGGER_INSTRUCTION: &str =
    "Please begin the conversation according to your system instructions.";

/// Spoken when the backend returns a reply that trims to nothing
const EMPTY_REPLY_UTTERANCE: &str =
    "I seem to be at a loss for words. Could you try that again?";

/// Spoken when the backend errors (timeout, transport, API)
const CONNECTION_TROUBLE_UTTERANCE: &str = "I'm sorry, I'm having trouble connecting to my \
     main system right now. Please try again in a moment.";

/// Prefix of the apology spoken when the provider's content filter intervenes
const CONTENT_FILTER_APOLOGY: &str =
    "My apologies, my response was prevented due to a content filter.";

/// Turns prompts and history into agent replies
pub struct DialogueEngine {
    backend: Arc<dyn DialogueBackend>,
}

impl DialogueEngine {
    /// Create an engine over the given backend strategy
    pub fn new(backend: Arc<dyn DialogueBackend>) -> Self {
        Self { backend }
    }

    /// Name of the underlying backend, for logging
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Generate the agent's next reply
    ///
    /// Infallible: backend errors and filtered or empty replies all map to
    /// fixed utterances, never to an error the caller must handle.
    pub async fn respond(
        &self,
        system_prompt: &str,
        history: &[Utterance],
        identity: IdentityHint,
    ) -> String {
        let history = if history.is_empty() {
            tracing::debug!("history is empty; inserting the trigger instruction");
            vec![Utterance::customer(TRIGGER_INSTRUCTION)]
        } else {
            history.to_vec()
        };

        let request = DialogueRequest {
            system_prompt: system_prompt.to_string(),
            history,
            identity,
        };

        match self.backend.generate(request).await {
            Ok(reply) => match reply.finish_reason {
                FinishReason::Stop => {
                    let text = reply.text.trim();
                    if text.is_empty() {
                        tracing::warn!(
                            backend = self.backend.name(),
                            "backend returned an empty reply"
                        );
                        EMPTY_REPLY_UTTERANCE.to_string()
                    } else {
                        text.to_string()
                    }
                }
                FinishReason::ContentFiltered { reason } => {
                    tracing::warn!(
                        backend = self.backend.name(),
                        reason = reason.as_deref().unwrap_or("unspecified"),
                        "reply blocked by content filter"
                    );
                    content_filter_apology(reason.as_deref())
                }
            },
            Err(e) => {
                tracing::warn!(
                    backend = self.backend.name(),
                    error = %e,
                    "backend call failed; using connection-trouble apology"
                );
                CONNECTION_TROUBLE_UTTERANCE.to_string()
            }
        }
    }
}

fn content_filter_apology(reason: Option<&str>) -> String {
    match reason {
        Some(reason) => format!(
            "{CONTENT_FILTER_APOLOGY} Reason: {reason}. Could we try rephrasing or \
             discussing a different aspect?"
        ),
        None => format!(
            "{CONTENT_FILTER_APOLOGY} Could we try rephrasing or discussing a \
             different aspect?"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DialogueReply;
    use crate::LlmError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Backend that records requests and replays programmed outcomes
    struct ScriptedBackend {
        outcome: Mutex<Option<Result<DialogueReply, LlmError>>>,
        requests: Mutex<Vec<DialogueRequest>>,
    }

    impl ScriptedBackend {
        fn replying(reply: DialogueReply) -> Self {
            Self {
                outcome: Mutex::new(Some(Ok(reply))),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: LlmError) -> Self {
            Self {
                outcome: Mutex::new(Some(Err(error))),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DialogueBackend for ScriptedBackend {
        async fn generate(&self, request: DialogueRequest) -> Result<DialogueReply, LlmError> {
            self.requests.lock().unwrap().push(request);
            self.outcome
                .lock()
                .unwrap()
                .take()
                .expect("scripted outcome already consumed")
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    async fn respond_with(backend: ScriptedBackend, history: &[Utterance]) -> (String, Vec<DialogueRequest>) {
        let backend = Arc::new(backend);
        let engine = DialogueEngine::new(backend.clone());
        let reply = engine.respond("prompt", history, IdentityHint::Unknown).await;
        let requests = backend.requests.lock().unwrap().clone();
        (reply, requests)
    }

    #[tokio::test]
    async fn test_empty_history_gets_trigger_instruction() {
        let backend = ScriptedBackend::replying(DialogueReply::text("Hello there."));
        let (reply, requests) = respond_with(backend, &[]).await;

        assert_eq!(reply, "Hello there.");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].history.len(), 1);
        assert_eq!(requests[0].history[0].text, TRIGGER_INSTRUCTION);
    }

    #[tokio::test]
    async fn test_nonempty_history_passed_through() {
        let backend = ScriptedBackend::replying(DialogueReply::text("ok"));
        let history = vec![Utterance::agent("hi"), Utterance::customer("hello")];
        let (_, requests) = respond_with(backend, &history).await;

        assert_eq!(requests[0].history.len(), 2);
        assert_eq!(requests[0].history[1].text, "hello");
    }

    #[tokio::test]
    async fn test_reply_is_trimmed() {
        let backend = ScriptedBackend::replying(DialogueReply::text("  spaced out \n"));
        let (reply, _) = respond_with(backend, &[]).await;
        assert_eq!(reply, "spaced out");
    }

    #[tokio::test]
    async fn test_empty_reply_becomes_clarification() {
        let backend = ScriptedBackend::replying(DialogueReply::text("   \n  "));
        let (reply, _) = respond_with(backend, &[]).await;
        assert_eq!(reply, EMPTY_REPLY_UTTERANCE);
    }

    #[tokio::test]
    async fn test_backend_error_becomes_apology() {
        let backend = ScriptedBackend::failing(LlmError::Timeout);
        let (reply, _) = respond_with(backend, &[]).await;
        assert_eq!(reply, CONNECTION_TROUBLE_UTTERANCE);
    }

    #[tokio::test]
    async fn test_content_filter_apology_includes_reason() {
        let backend = ScriptedBackend::replying(DialogueReply {
            text: String::new(),
            finish_reason: FinishReason::ContentFiltered {
                reason: Some("SAFETY".to_string()),
            },
        });
        let (reply, _) = respond_with(backend, &[]).await;

        assert!(reply.starts_with(CONTENT_FILTER_APOLOGY));
        assert!(reply.contains("Reason: SAFETY."));
    }

    #[tokio::test]
    async fn test_content_filter_apology_without_reason() {
        let backend = ScriptedBackend::replying(DialogueReply {
            text: String::new(),
            finish_reason: FinishReason::ContentFiltered { reason: None },
        });
        let (reply, _) = respond_with(backend, &[]).await;

        assert!(reply.starts_with(CONTENT_FILTER_APOLOGY));
        assert!(!reply.contains("Reason:"));
    }
}
