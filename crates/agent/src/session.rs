//! The call session
//!
//! One session exists per process; it is reset at each call start and
//! mutated by every turn. Identity resolution is a small one-way state
//! machine: once a customer record is attached the session is resolved for
//! the rest of the call.

use uuid::Uuid;

use loanmate_core::{ConversationHistory, CustomerRecord, Utterance};

/// Identity-resolution state of the current call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityState {
    /// The agent's most recent utterance asked the caller for their name
    AwaitingName,
    /// Identity unresolved, no name request outstanding
    Unknown,
    /// A directory record is attached; terminal for the session
    Resolved,
}

/// Mutable state of the one active call
#[derive(Debug)]
pub struct CallSession {
    call_id: Uuid,
    customer: Option<CustomerRecord>,
    history: ConversationHistory,
    identity: IdentityState,
}

impl CallSession {
    /// Create a fresh session bounded to `max_turn_pairs` history pairs
    pub fn new(max_turn_pairs: usize) -> Self {
        Self {
            call_id: Uuid::new_v4(),
            customer: None,
            history: ConversationHistory::new(max_turn_pairs),
            identity: IdentityState::Unknown,
        }
    }

    /// Reset for a new call: history, identity and customer all cleared
    pub fn reset(&mut self) {
        self.call_id = Uuid::new_v4();
        self.customer = None;
        self.history.clear();
        self.identity = IdentityState::Unknown;
    }

    /// Identifier of the current call, for log correlation
    pub fn call_id(&self) -> Uuid {
        self.call_id
    }

    /// The resolved customer, if any
    pub fn customer(&self) -> Option<&CustomerRecord> {
        self.customer.as_ref()
    }

    /// Current identity-resolution state
    pub fn identity(&self) -> IdentityState {
        self.identity
    }

    /// True while the agent's last utterance requested the caller's name
    pub fn is_awaiting_name(&self) -> bool {
        self.identity == IdentityState::AwaitingName
    }

    /// Attach a directory record, resolving identity for the session
    ///
    /// Replaces any previous record wholesale. Resolution is terminal: the
    /// awaiting/unknown transitions below become no-ops afterwards.
    pub fn attach_customer(&mut self, record: CustomerRecord) {
        self.customer = Some(record);
        self.identity = IdentityState::Resolved;
    }

    /// Enter the awaiting-name state; no-op once resolved
    pub fn mark_awaiting_name(&mut self) {
        if self.customer.is_none() {
            self.identity = IdentityState::AwaitingName;
        }
    }

    /// Leave the awaiting-name state without resolving; no-op once resolved
    pub fn mark_not_awaiting(&mut self) {
        if self.customer.is_none() {
            self.identity = IdentityState::Unknown;
        }
    }

    /// Record a customer utterance
    pub fn append_customer_utterance(&mut self, text: &str) {
        self.history.push(Utterance::customer(text));
    }

    /// Record an agent utterance
    pub fn append_agent_utterance(&mut self, text: &str) {
        self.history.push(Utterance::agent(text));
    }

    /// Bound the history after an agent-turn append
    pub fn trim_history(&mut self) {
        self.history.trim();
    }

    /// Conversation so far
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CustomerRecord {
        CustomerRecord::new("John Doe", 700, 500.0, 10_000.0)
    }

    #[test]
    fn test_new_session_is_unknown() {
        let session = CallSession::new(10);
        assert_eq!(session.identity(), IdentityState::Unknown);
        assert!(session.customer().is_none());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_attach_customer_resolves() {
        let mut session = CallSession::new(10);
        session.mark_awaiting_name();
        session.attach_customer(record());

        assert_eq!(session.identity(), IdentityState::Resolved);
        assert_eq!(session.customer().unwrap().name, "John Doe");
    }

    #[test]
    fn test_resolution_is_terminal() {
        let mut session = CallSession::new(10);
        session.attach_customer(record());

        session.mark_awaiting_name();
        assert_eq!(session.identity(), IdentityState::Resolved);

        session.mark_not_awaiting();
        assert_eq!(session.identity(), IdentityState::Resolved);
    }

    #[test]
    fn test_awaiting_requires_absent_customer() {
        let mut session = CallSession::new(10);
        session.mark_awaiting_name();
        assert!(session.is_awaiting_name());

        session.mark_not_awaiting();
        assert_eq!(session.identity(), IdentityState::Unknown);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut session = CallSession::new(10);
        let old_call_id = session.call_id();
        session.attach_customer(record());
        session.append_agent_utterance("hello");
        session.append_customer_utterance("hi");
        session.reset();

        assert_eq!(session.identity(), IdentityState::Unknown);
        assert!(session.customer().is_none());
        assert!(session.history().is_empty());
        assert_ne!(session.call_id(), old_call_id);
    }
}
