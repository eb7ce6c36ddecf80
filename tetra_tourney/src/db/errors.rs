//! Store error types.

use crate::rank::RankError;
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value that no longer parses
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// A stored tier outside the rank scale
    #[error(transparent)]
    Rank(#[from] RankError),

    /// TETR.IO account already linked to another Discord user
    #[error("TETR.IO account {0} is linked to another user")]
    AccountLinked(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
