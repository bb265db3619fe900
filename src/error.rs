use thiserror::Error;

use crate::db::StoreError;

/// Errors surfaced by lifecycle operations. Callers are expected to show a
/// short message and leave their displayed state untouched; nothing in here
/// is retried automatically.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The session does not exist, or belongs to a different owner.
    #[error("session not found")]
    NotFound,

    /// The requested transition is illegal for the session's current state.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("session store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => EngineError::NotFound,
            StoreError::ActiveSessionExists => {
                EngineError::InvalidState("an active session already exists for this owner")
            }
            other => EngineError::Store(other),
        }
    }
}
