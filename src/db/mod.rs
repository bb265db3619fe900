mod connection;
mod helpers;
mod migrations;
mod repositories;

pub use connection::Database;

use thiserror::Error;

/// Store-boundary error type. Raw persistence failures never cross this
/// boundary untyped; "no matching record" always surfaces as [`NotFound`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// The partial unique index on non-completed sessions rejected an
    /// insert: the owner already has a running or paused session.
    #[error("an active session already exists for this owner")]
    ActiveSessionExists,

    /// A stored value failed to parse back into its domain type.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database worker unavailable")]
    WorkerClosed,
}
