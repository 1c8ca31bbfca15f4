//! Error types for the state container.

use thiserror::Error;

/// Failure raised by a reducer.
///
/// Reducers are pure, so this only ever describes a programming error or an
/// action whose payload the reducer cannot accept. The store never commits a
/// state produced alongside one.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ReducerError {
    message: String,
}

impl ReducerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<StoreError> for ReducerError {
    fn from(e: StoreError) -> Self {
        ReducerError::new(e.to_string())
    }
}

/// Main error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Reducer failed on {action_type}: {source}")]
    Reducer {
        action_type: String,
        #[source]
        source: ReducerError,
    },

    #[error("Slice {slice} does not hold a {expected}")]
    SliceType { slice: String, expected: &'static str },

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Middleware error: {0}")]
    Middleware(String),

    #[error("Persist error: {0}")]
    Persist(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
