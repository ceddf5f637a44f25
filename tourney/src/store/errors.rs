//! Store error types.

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport or backend failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Conditional update kept losing to concurrent writers
    #[error("Conditional update on {path} did not commit after {attempts} attempts")]
    Contended { path: String, attempts: u32 },

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed path
    #[error("Invalid path: {0:?}")]
    InvalidPath(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Outcome of a failed conditional update.
///
/// `Aborted` carries the error raised by the update function; no write
/// was performed in that case.
#[derive(Debug, Error)]
pub enum UpdateError<E> {
    #[error("Update aborted: {0}")]
    Aborted(E),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
