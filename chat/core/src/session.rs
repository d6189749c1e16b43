//! Session State
//!
//! The conversation log and the composer owned by a chat controller.
//!
//! Turns are immutable once appended and the log only grows: there is no
//! way to edit, reorder, or remove a turn.

use serde::{Deserialize, Serialize};

use crate::messages::Origin;

/// One conversational entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    origin: Origin,
    content: String,
}

impl Turn {
    /// Create a participant turn
    pub fn participant(content: impl Into<String>) -> Self {
        Self {
            origin: Origin::Participant,
            content: content.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            origin: Origin::Assistant,
            content: content.into(),
        }
    }

    /// Who authored this turn
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Raw content, possibly Markdown for assistant turns
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Append-only, chronologically ordered sequence of turns
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationLog {
    turns: Vec<Turn>,
}

impl ConversationLog {
    /// Create an empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn, returning its index
    pub(crate) fn append(&mut self, turn: Turn) -> usize {
        self.turns.push(turn);
        self.turns.len() - 1
    }

    /// All turns in insertion order
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Turn at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Turn> {
        self.turns.get(index)
    }

    /// Most recent turn
    #[must_use]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of turns
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the log has no turns
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Iterate over turns in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }
}

impl FromIterator<Turn> for ConversationLog {
    fn from_iter<I: IntoIterator<Item = Turn>>(iter: I) -> Self {
        Self {
            turns: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ConversationLog {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

/// Text currently being authored
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Composer {
    text: String,
}

impl Composer {
    /// Current text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the whole text
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Type one character
    pub fn push(&mut self, c: char) {
        self.text.push(c);
    }

    /// Delete the last character
    pub fn pop(&mut self) -> Option<char> {
        self.text.pop()
    }

    /// Whether there is nothing to submit after trimming
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Reset to empty
    pub fn clear(&mut self) {
        self.text.clear();
    }
}
