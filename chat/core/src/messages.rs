//! Chat Events
//!
//! Events sent from the chat controller to UI surfaces. A surface (the TUI,
//! the headless CLI, a test harness) listens on the receiving half of the
//! controller's channel and redraws whatever changed.
//!
//! The controller never talks to a surface any other way, so a surface can
//! be swapped without touching the conversation logic.

use serde::{Deserialize, Serialize};

/// Who authored a turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// The person typing into the composer
    Participant,
    /// The answer service
    Assistant,
}

impl Origin {
    /// Label used when a surface prints turns as plain text
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Participant => "You",
            Self::Assistant => "Nutritionist",
        }
    }
}

/// Controller operational states
///
/// This is the request lifecycle flag: `Awaiting` while exactly one answer
/// request is in flight, `Idle` otherwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerState {
    /// Ready for a submission
    #[default]
    Idle,
    /// A submission was accepted and its answer has not settled yet
    Awaiting,
}

impl ControllerState {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Awaiting => "Thinking...",
        }
    }

    /// Whether a request is in flight
    #[must_use]
    pub fn is_awaiting(&self) -> bool {
        matches!(self, Self::Awaiting)
    }
}

/// How an assistant turn came about
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerKind {
    /// The service returned a non-empty answer
    Answered,
    /// The service replied but the answer field was empty or missing
    Empty,
    /// Transport or parse failure
    Failed,
}

/// Events from the controller to a UI surface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatEvent {
    /// A turn was appended to the conversation log
    TurnAppended {
        /// Position of the turn in the log
        index: usize,
        /// Who authored it
        origin: Origin,
        /// Set for assistant turns only
        answer: Option<AnswerKind>,
    },

    /// The request lifecycle flag changed
    State {
        /// New state
        state: ControllerState,
    },
}
