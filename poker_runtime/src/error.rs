//! Runtime errors: kernel rejections plus everything that touches disk.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use poker_engine::error::GameError;

/// Coarse classification surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Precondition,
    InvalidTransition,
    Persistence,
    NotFound,
    Config,
    Internal,
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Game(#[from] GameError),

    /// A durable write or read failed. The in-memory game was not changed.
    #[error("persistence failed for {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A JSON document did not match its expected shape.
    #[error("malformed {what}: {source}")]
    Malformed {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown game {0:?}")]
    UnknownGame(String),

    #[error("game {0:?} is already registered")]
    DuplicateGame(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl RuntimeError {
    pub fn persistence(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RuntimeError::Persistence {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::Game(GameError::Validation(_)) => ErrorKind::Validation,
            RuntimeError::Game(GameError::Precondition(_)) => ErrorKind::Precondition,
            RuntimeError::Game(GameError::InvalidTransition { .. }) => {
                ErrorKind::InvalidTransition
            }
            RuntimeError::Game(GameError::Invariant { .. }) => ErrorKind::Internal,
            RuntimeError::Persistence { .. } => ErrorKind::Persistence,
            RuntimeError::Malformed { .. } => ErrorKind::Validation,
            RuntimeError::UnknownGame(_) => ErrorKind::NotFound,
            RuntimeError::DuplicateGame(_) => ErrorKind::Precondition,
            RuntimeError::Config(_) => ErrorKind::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
