//! Error types for relrank.

use thiserror::Error;

/// Result type alias using relrank's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for relrank operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Table, column or annotation name is not a safe SQL identifier
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Expression references an annotation that was never attached
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Field path does not exist on the record type
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Expression could not be evaluated (type mismatch, division by zero)
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
