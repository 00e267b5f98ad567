//! Per-session conversation memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions.
    User,
    /// The policy assistant.
    Assistant,
}

/// One utterance in the session, never mutated after append.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    /// Who spoke.
    pub role: Role,
    /// What was said.
    pub content: String,
    /// When the turn was recorded.
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Create a turn timestamped now.
    pub fn now(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into(), timestamp: Utc::now() }
    }
}

/// An append-only, ordered log of conversation turns for one session.
///
/// Unbounded by default; with [`with_max_turns`](ConversationMemory::with_max_turns)
/// the oldest turns are evicted first once the cap is exceeded. Purely
/// in-process, discarded with the session.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: Vec<ConversationTurn>,
    max_turns: Option<usize>,
}

impl ConversationMemory {
    /// Create an unbounded memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory retaining at most `max_turns` turns.
    pub fn with_max_turns(max_turns: usize) -> Self {
        Self { turns: Vec::new(), max_turns: Some(max_turns) }
    }

    /// Append a turn, evicting the oldest turns if the cap is exceeded.
    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        if let Some(cap) = self.max_turns {
            if self.turns.len() > cap {
                let excess = self.turns.len() - cap;
                self.turns.drain(..excess);
            }
        }
    }

    /// All retained turns, oldest first.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Number of retained turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turns are retained.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Discard all retained turns.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
