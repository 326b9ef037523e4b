//! Store error types
//!
//! Defines all errors that can occur in the persistence layer.

use thiserror::Error;

/// Errors that can occur in the poll store
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O operation failed (creating the data directory)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON column could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// User input rejected before touching the database
    #[error("{0}")]
    Validation(String),

    /// Requested poll does not exist
    #[error("Poll not found: {0}")]
    PollNotFound(String),

    /// Vote targeted an option index outside the poll
    #[error("Invalid option {index}: poll has {options} options")]
    InvalidOption { index: usize, options: usize },

    /// This voter IP already voted on the poll
    #[error("You've already voted!")]
    AlreadyVoted,

    /// Requester does not own the document
    #[error("Only the poll creator can do that")]
    Forbidden,

    /// Sign-up with an e-mail that already has an account
    #[error("Email already in use: {0}")]
    EmailTaken(String),

    /// Connection mutex was poisoned
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::PollNotFound("abc".to_string());
        assert_eq!(err.to_string(), "Poll not found: abc");

        let err = StoreError::InvalidOption {
            index: 4,
            options: 2,
        };
        assert_eq!(err.to_string(), "Invalid option 4: poll has 2 options");

        assert_eq!(StoreError::AlreadyVoted.to_string(), "You've already voted!");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let store_err: StoreError = io_err.into();
        assert!(matches!(store_err, StoreError::Io(_)));
    }
}
