/// Planning Poker Kernel: Error Kinds
///
/// Every rejected command leaves the input state untouched, so callers
/// can surface any of these without rolling anything back.

use thiserror::Error;

use crate::domain::GameStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Malformed input: unknown card, bad import record, mismatched snapshot.
    #[error("validation error: {0}")]
    Validation(String),

    /// The operation cannot run in the current state (empty roster,
    /// no pending feature, discussion still open).
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The game lifecycle does not allow `action` from `from`.
    #[error("invalid transition: cannot {action} a game that is {from}")]
    InvalidTransition {
        from: GameStatus,
        action: &'static str,
    },

    /// A post-transition consistency check failed. Indicates a kernel bug.
    #[error("invariant violation: [{check}] {detail}")]
    Invariant { check: &'static str, detail: String },
}

impl GameError {
    pub fn validation(detail: impl Into<String>) -> Self {
        GameError::Validation(detail.into())
    }

    pub fn precondition(detail: impl Into<String>) -> Self {
        GameError::Precondition(detail.into())
    }
}
