//! Conversation types
//!
//! A call is an alternating sequence of customer and agent utterances.
//! History is bounded: once it grows past the configured number of
//! turn-pairs, the oldest entries are dropped first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker of an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The automated collections agent
    Agent,
    /// The caller
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Agent => "agent",
            Role::Customer => "customer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single utterance in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    /// Who spoke
    pub role: Role,
    /// What was said
    pub text: String,
    /// When the utterance was recorded
    pub timestamp: DateTime<Utc>,
}

impl Utterance {
    /// Create a new utterance
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create an agent utterance
    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Role::Agent, text)
    }

    /// Create a customer utterance
    pub fn customer(text: impl Into<String>) -> Self {
        Self::new(Role::Customer, text)
    }
}

/// Ordered, bounded conversation history
///
/// Append-only within a call; insertion order is turn order. The history is
/// capped at `max_turn_pairs` pairs (both roles counted); trimming keeps the
/// trailing window so the most recent exchanges survive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    entries: Vec<Utterance>,
    max_turn_pairs: usize,
}

impl ConversationHistory {
    /// Create an empty history bounded to `max_turn_pairs` pairs
    pub fn new(max_turn_pairs: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_turn_pairs,
        }
    }

    /// Append an utterance
    pub fn push(&mut self, utterance: Utterance) {
        self.entries.push(utterance);
    }

    /// Drop the oldest entries until at most `max_turn_pairs * 2` remain
    ///
    /// Called after each agent-turn append. Entries always alternate, so
    /// trimming a trailing window never breaks alternation.
    pub fn trim(&mut self) {
        let cap = self.max_turn_pairs * 2;
        if self.entries.len() > cap {
            let excess = self.entries.len() - cap;
            self.entries.drain(..excess);
            tracing::debug!(
                dropped = excess,
                remaining = self.entries.len(),
                "conversation history trimmed"
            );
        }
    }

    /// Clear all entries (call start)
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// All utterances, oldest first
    pub fn entries(&self) -> &[Utterance] {
        &self.entries
    }

    /// Number of utterances currently held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no utterance has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent agent utterance, if any
    pub fn last_agent_utterance(&self) -> Option<&Utterance> {
        self.entries.iter().rev().find(|u| u.role == Role::Agent)
    }

    /// Configured bound, in turn-pairs
    pub fn max_turn_pairs(&self) -> usize {
        self.max_turn_pairs
    }
}
