//! Common error types for HTL

use thiserror::Error;

/// Common result type for HTL operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the HTL service
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A vote for this (visitor, round) pair already exists.
    ///
    /// Benign: the unique constraint on the votes table fired, meaning the
    /// vote is already recorded. Callers treat this as success.
    #[error("Vote already recorded for this visitor and round")]
    DuplicateVote,

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for Error {
    /// Classify sqlx errors, separating the benign unique-constraint
    /// rejection on duplicate votes from real database failures.
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref dbe) = e {
            if dbe.is_unique_violation() {
                return Error::DuplicateVote;
            }
        }
        Error::Database(e)
    }
}

impl Error {
    /// Whether this error is the benign already-recorded case
    pub fn is_duplicate_vote(&self) -> bool {
        matches!(self, Error::DuplicateVote)
    }
}
