// Error taxonomy for the ranking core and its stores.
//
// PrestigeError is what the core operations return; StoreError is what a
// store implementation returns. The HTTP layer decides status codes.

use thiserror::Error;

/// Failure of an underlying store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store lock poisoned")]
    Poisoned,

    /// A stored row could not be decoded into a record
    #[error("corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// Insert of a key that is already stored
    #[error("record {0} already exists")]
    Duplicate(String),

    /// A statistics update addressed a company that is not stored
    #[error("company {0} not present in store")]
    MissingCompany(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by matchup creation, vote resolution and ranking.
#[derive(Debug, Error)]
pub enum PrestigeError {
    /// Request content is well-formed but not acceptable
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Unknown, consumed, or raced verification code. Carries no detail so
    /// callers cannot tell which of those it was.
    #[error("verification code rejected")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, PrestigeError>;
