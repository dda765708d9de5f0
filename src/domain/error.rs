//! Domain-level error types for svn-auth-manager.
//!
//! Every failure is a typed variant surfaced to the immediate caller so that
//! callers can branch on the kind without parsing message text. Nothing is
//! recovered silently except the notification attempt during a cache-reset
//! rollback, which is logged and swallowed by its caller.

use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// Non-success status from the native `SQLite` layer, with the message
    /// taken from the native error accessor.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    /// A column read came back with a non-text affinity. The store writes
    /// and reads text columns only.
    #[error("Column {index} is not text (found {actual})")]
    ColumnType { index: usize, actual: String },

    /// Lookup matched no record.
    #[error("{entity} not in database")]
    NotFound { entity: String },

    /// Lookup matched more than one record.
    #[error("Multiple records for {entity} in database")]
    AmbiguousRecord { entity: String },

    /// Malformed or empty user input.
    #[error("{message}")]
    Validation { message: String },

    /// `svn info` exited non-zero; carries the masked diagnostic text.
    #[error("{detail}")]
    CacheReset { detail: String },

    /// The external command could not be started at all.
    #[error("Failed to run `{command}`: {source}")]
    ProcessSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Mail message building or delivery failed.
    #[error("Mail error: {message}")]
    Mail { message: String },
}

impl AppError {
    /// Create a database error from a rusqlite error.
    pub fn database(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
