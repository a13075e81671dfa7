//! Turn orchestration
//!
//! `CollectionsAgent` owns the directory, the dialogue engine, both speech
//! adapters and the single call session. Each public operation runs one
//! complete turn under the session lock, so concurrent requests queue
//! rather than interleave.

use std::sync::Arc;

use tokio::sync::Mutex;

use loanmate_core::{AudioClip, Transcriber, Transcript};
use loanmate_directory::CustomerDirectory;
use loanmate_llm::{
    compose_system_prompt, uses_unknown_customer_branch, DialogueEngine, IdentityHint,
};
use loanmate_pipeline::{SpeechAdapter, SynthesisOutcome};

use crate::classifier::is_name_request;
use crate::session::CallSession;
use crate::AgentError;

/// Spoken when transcription produced no usable speech; the session is left
/// exactly as it was before the turn
pub const REPROMPT_UTTERANCE: &str =
    "I'm sorry, I didn't catch that. Could you please repeat?";

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Conversation history bound, in turn-pairs
    pub max_history_turns: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_history_turns: 10,
        }
    }
}

/// One completed agent turn: the reply text and its synthesized audio
#[derive(Debug)]
pub struct AgentTurn {
    pub text: String,
    pub audio: AudioClip,
}

/// The collections agent
pub struct CollectionsAgent {
    directory: CustomerDirectory,
    engine: DialogueEngine,
    transcriber: Arc<dyn Transcriber>,
    speech: SpeechAdapter,
    session: Mutex<CallSession>,
}

impl CollectionsAgent {
    /// Create an agent with all collaborators injected
    pub fn new(
        directory: CustomerDirectory,
        engine: DialogueEngine,
        transcriber: Arc<dyn Transcriber>,
        speech: SpeechAdapter,
        config: AgentConfig,
    ) -> Self {
        Self {
            directory,
            engine,
            transcriber,
            speech,
            session: Mutex::new(CallSession::new(config.max_history_turns)),
        }
    }

    /// Start a new call, discarding any previous session state
    ///
    /// If a name was supplied and resolves in the directory the session
    /// starts identified; otherwise the greeting prompt asks for a name and
    /// the session enters the awaiting-name state.
    pub async fn start_call(&self, supplied_name: Option<&str>) -> Result<AgentTurn, AgentError> {
        let mut session = self.session.lock().await;
        session.reset();
        tracing::info!(call_id = %session.call_id(), "call started");

        if let Some(name) = supplied_name.map(str::trim).filter(|n| !n.is_empty()) {
            match self.directory.lookup(name) {
                Some(record) => {
                    tracing::info!(
                        call_id = %session.call_id(),
                        customer = %record.name,
                        "caller identified at call start"
                    );
                    session.attach_customer(record);
                }
                None => {
                    tracing::info!(
                        call_id = %session.call_id(),
                        name,
                        "supplied name not found; proceeding unidentified"
                    );
                }
            }
        }

        let prompt = compose_system_prompt(session.customer());
        let hint = match session.customer() {
            Some(record) => IdentityHint::Known {
                name: record.name.clone(),
            },
            None => IdentityHint::Unknown,
        };
        let reply = self
            .engine
            .respond(&prompt, session.history().entries(), hint)
            .await;
        session.append_agent_utterance(&reply);
        session.trim_history();

        // The unknown-customer prompt instructs the agent to open by asking
        // for a name, so using that branch is taken as "a name request is
        // now outstanding" without inspecting the greeting text.
        if session.customer().is_none() && uses_unknown_customer_branch(&prompt) {
            session.mark_awaiting_name();
        }

        self.speak(reply).await
    }

    /// Process one customer audio turn and return the spoken reply
    pub async fn process_turn(&self, audio: AudioClip) -> Result<AgentTurn, AgentError> {
        if audio.is_empty() {
            return Err(AgentError::NoAudio);
        }

        let mut session = self.session.lock().await;

        // Transcription runs before any session mutation: a silent or failed
        // turn must leave the session exactly as it was.
        let transcript = match self.transcriber.transcribe(&audio).await {
            Ok(transcript) => transcript,
            Err(e) => {
                tracing::warn!(
                    call_id = %session.call_id(),
                    error = %e,
                    "transcription failed; re-prompting the caller"
                );
                Transcript::default()
            }
        };
        if transcript.is_empty() {
            tracing::info!(call_id = %session.call_id(), "no usable speech in turn");
            return self.speak(REPROMPT_UTTERANCE.to_string()).await;
        }

        let text = transcript.text.trim().to_string();
        tracing::info!(call_id = %session.call_id(), transcript = %text, "customer turn");
        session.append_customer_utterance(&text);

        let was_awaiting = session.is_awaiting_name();
        if was_awaiting && session.customer().is_none() {
            // The whole utterance is the candidate name
            match self.directory.lookup(&text) {
                Some(record) => {
                    tracing::info!(
                        call_id = %session.call_id(),
                        customer = %record.name,
                        "caller identified from transcript"
                    );
                    session.attach_customer(record);
                }
                None => {
                    tracing::info!(
                        call_id = %session.call_id(),
                        candidate = %text,
                        "candidate name not found; continuing without identity"
                    );
                    session.mark_not_awaiting();
                }
            }
        }

        let prompt = compose_system_prompt(session.customer());
        let hint = match session.customer() {
            Some(record) => IdentityHint::Known {
                name: record.name.clone(),
            },
            None if was_awaiting => IdentityHint::AwaitingName,
            None => IdentityHint::Unknown,
        };
        let reply = self
            .engine
            .respond(&prompt, session.history().entries(), hint)
            .await;
        session.append_agent_utterance(&reply);

        // Re-derive the pending-name flag from the reply while identity is
        // unresolved; a polite re-ask re-enters the awaiting state even
        // after a candidate name was rejected.
        if session.customer().is_none() && uses_unknown_customer_branch(&prompt) {
            if is_name_request(&reply) {
                session.mark_awaiting_name();
            } else {
                session.mark_not_awaiting();
            }
        }

        session.trim_history();

        self.speak(reply).await
    }

    async fn speak(&self, text: String) -> Result<AgentTurn, AgentError> {
        match self.speech.speak(&text).await {
            SynthesisOutcome::Spoken(audio) => Ok(AgentTurn { text, audio }),
            SynthesisOutcome::Exhausted { reason } => Err(AgentError::SpeechSynthesis(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::IdentityState;
    use async_trait::async_trait;
    use loanmate_core::{CustomerRecord, PipelineError, Synthesizer};
    use loanmate_llm::{
        DialogueBackend, DialogueReply, DialogueRequest, LlmError, MockDialogueBackend,
    };

    struct FixedTranscriber(&'static str);

    #[async_trait]
    impl Transcriber for FixedTranscriber {
        async fn transcribe(&self, _audio: &AudioClip) -> Result<Transcript, PipelineError> {
            Ok(Transcript::new(self.0))
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingTranscriber;

    #[async_trait]
    impl Transcriber for FailingTranscriber {
        async fn transcribe(&self, _audio: &AudioClip) -> Result<Transcript, PipelineError> {
            Err(PipelineError::Stt("boom".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    struct FixedSynthesizer;

    #[async_trait]
    impl Synthesizer for FixedSynthesizer {
        async fn synthesize(&self, _text: &str) -> Result<AudioClip, PipelineError> {
            Ok(AudioClip::mpeg(vec![0xff, 0xfb]))
        }

        fn model_name(&self) -> &str {
            "fixed-tts"
        }
    }

    struct FailingSynthesizer;

    #[async_trait]
    impl Synthesizer for FailingSynthesizer {
        async fn synthesize(&self, _text: &str) -> Result<AudioClip, PipelineError> {
            Err(PipelineError::Tts("down".to_string()))
        }

        fn model_name(&self) -> &str {
            "failing-tts"
        }
    }

    /// Backend that always replies with the same text
    struct FixedBackend(&'static str);

    #[async_trait]
    impl DialogueBackend for FixedBackend {
        async fn generate(&self, _request: DialogueRequest) -> Result<DialogueReply, LlmError> {
            Ok(DialogueReply::text(self.0))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn directory() -> CustomerDirectory {
        CustomerDirectory::from_records([CustomerRecord::new("John Doe", 700, 500.0, 10_000.0)])
    }

    fn agent_with(
        backend: Arc<dyn DialogueBackend>,
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn Synthesizer>,
        config: AgentConfig,
    ) -> CollectionsAgent {
        CollectionsAgent::new(
            directory(),
            DialogueEngine::new(backend),
            transcriber,
            SpeechAdapter::new(synthesizer),
            config,
        )
    }

    fn mock_agent(transcript: &'static str) -> CollectionsAgent {
        agent_with(
            Arc::new(MockDialogueBackend),
            Arc::new(FixedTranscriber(transcript)),
            Arc::new(FixedSynthesizer),
            AgentConfig::default(),
        )
    }

    fn clip() -> AudioClip {
        AudioClip::mpeg(vec![1, 2, 3])
    }

    #[tokio::test]
    async fn test_start_call_with_resolvable_name() {
        let agent = mock_agent("unused");
        let turn = agent.start_call(Some("  john DOE ")).await.unwrap();

        assert!(turn.text.contains("John Doe"));
        let session = agent.session.lock().await;
        assert_eq!(session.identity(), IdentityState::Resolved);
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_start_call_without_name_enters_awaiting() {
        let agent = mock_agent("unused");
        let turn = agent.start_call(None).await.unwrap();

        assert!(turn.text.to_lowercase().contains("name"));
        let session = agent.session.lock().await;
        assert_eq!(session.identity(), IdentityState::AwaitingName);
        assert!(session.customer().is_none());
    }

    #[tokio::test]
    async fn test_start_call_with_blank_name_enters_awaiting() {
        let agent = mock_agent("unused");
        agent.start_call(Some("   ")).await.unwrap();

        let session = agent.session.lock().await;
        assert_eq!(session.identity(), IdentityState::AwaitingName);
        assert!(session.customer().is_none());
    }

    #[tokio::test]
    async fn test_start_call_with_unresolvable_name_enters_awaiting() {
        let agent = mock_agent("unused");
        agent.start_call(Some("Nobody Known")).await.unwrap();

        let session = agent.session.lock().await;
        assert_eq!(session.identity(), IdentityState::AwaitingName);
        assert!(session.customer().is_none());
    }

    #[tokio::test]
    async fn test_start_call_resets_previous_session() {
        let agent = mock_agent("unused");
        agent.start_call(Some("john doe")).await.unwrap();
        agent.start_call(None).await.unwrap();

        let session = agent.session.lock().await;
        assert_eq!(session.identity(), IdentityState::AwaitingName);
        assert!(session.customer().is_none());
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_name_resolved_mid_call() {
        let agent = mock_agent("John Doe");
        agent.start_call(None).await.unwrap();
        let turn = agent.process_turn(clip()).await.unwrap();

        assert!(turn.text.contains("John Doe"));
        let session = agent.session.lock().await;
        assert_eq!(session.identity(), IdentityState::Resolved);
        assert_eq!(session.history().len(), 3);
    }

    #[tokio::test]
    async fn test_rejected_name_proceeds_without_identity() {
        let agent = mock_agent("Jane Smith");
        agent.start_call(None).await.unwrap();
        agent.process_turn(clip()).await.unwrap();

        let session = agent.session.lock().await;
        // Mock clarification reply does not match the name-request rule
        assert_eq!(session.identity(), IdentityState::Unknown);
        assert!(session.customer().is_none());
        // Greeting plus exactly one customer and one agent utterance
        assert_eq!(session.history().len(), 3);
    }

    #[tokio::test]
    async fn test_name_request_reply_reenters_awaiting() {
        let agent = agent_with(
            Arc::new(FixedBackend("Sorry, could you tell me your name once more?")),
            Arc::new(FixedTranscriber("Jane Smith")),
            Arc::new(FixedSynthesizer),
            AgentConfig::default(),
        );
        agent.start_call(None).await.unwrap();
        agent.process_turn(clip()).await.unwrap();

        let session = agent.session.lock().await;
        assert_eq!(session.identity(), IdentityState::AwaitingName);
    }

    #[tokio::test]
    async fn test_empty_transcript_leaves_session_untouched() {
        let agent = agent_with(
            Arc::new(MockDialogueBackend),
            Arc::new(FixedTranscriber("   ")),
            Arc::new(FixedSynthesizer),
            AgentConfig::default(),
        );
        agent.start_call(None).await.unwrap();
        let turn = agent.process_turn(clip()).await.unwrap();

        assert_eq!(turn.text, REPROMPT_UTTERANCE);
        let session = agent.session.lock().await;
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.identity(), IdentityState::AwaitingName);
    }

    #[tokio::test]
    async fn test_failed_transcription_treated_as_silence() {
        let agent = agent_with(
            Arc::new(MockDialogueBackend),
            Arc::new(FailingTranscriber),
            Arc::new(FixedSynthesizer),
            AgentConfig::default(),
        );
        agent.start_call(None).await.unwrap();
        let turn = agent.process_turn(clip()).await.unwrap();

        assert_eq!(turn.text, REPROMPT_UTTERANCE);
        let session = agent.session.lock().await;
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_audio_rejected_without_mutation() {
        let agent = mock_agent("unused");
        agent.start_call(None).await.unwrap();
        let result = agent.process_turn(AudioClip::mpeg(Vec::new())).await;

        assert!(matches!(result, Err(AgentError::NoAudio)));
        let session = agent.session.lock().await;
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_synthesis_exhaustion_is_fatal_for_turn_only() {
        let agent = agent_with(
            Arc::new(MockDialogueBackend),
            Arc::new(FixedTranscriber("unused")),
            Arc::new(FailingSynthesizer),
            AgentConfig::default(),
        );
        let result = agent.start_call(None).await;

        assert!(matches!(result, Err(AgentError::SpeechSynthesis(_))));
        // The turn transition itself completed before synthesis
        let session = agent.session.lock().await;
        assert_eq!(session.identity(), IdentityState::AwaitingName);
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_history_stays_bounded() {
        let agent = agent_with(
            Arc::new(FixedBackend("Let's talk about your payment.")),
            Arc::new(FixedTranscriber("I need more time")),
            Arc::new(FixedSynthesizer),
            AgentConfig {
                max_history_turns: 2,
            },
        );
        agent.start_call(Some("john doe")).await.unwrap();
        for _ in 0..4 {
            agent.process_turn(clip()).await.unwrap();
        }

        let session = agent.session.lock().await;
        assert_eq!(session.history().len(), 4);
        assert_eq!(
            session.history().entries().last().unwrap().text,
            "Let's talk about your payment."
        );
    }
}
