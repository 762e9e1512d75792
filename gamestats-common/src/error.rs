//! Common error types for GameStats

use thiserror::Error;

/// Common result type for GameStats operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across GameStats tools
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Source record decode error, tagged with the file it came from
    #[error("Decode error in {file}: {message}")]
    Decode { file: String, message: String },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Decode error constructor used by the fixture loader
    pub fn decode(file: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Decode {
            file: file.into(),
            message: message.into(),
        }
    }
}
