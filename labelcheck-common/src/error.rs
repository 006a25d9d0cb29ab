//! Common error types for labelcheck

use thiserror::Error;

/// Common result type for labelcheck operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across labelcheck crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// External call failed after the retry policy gave up
    #[error("{operation} failed after {attempts} attempt(s): {source}")]
    Transport {
        operation: String,
        attempts: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wrap an exhausted external call, keeping its cause
    pub fn transport<E>(operation: impl Into<String>, attempts: u32, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Transport {
            operation: operation.into(),
            attempts,
            source: Box::new(source),
        }
    }

    /// True for database failures worth retrying (lock contention, pool exhaustion, I/O)
    pub fn is_transient_db(&self) -> bool {
        match self {
            Error::Database(db_err) => is_transient_sqlx(db_err),
            _ => false,
        }
    }
}

/// Classify a sqlx error as transient
pub fn is_transient_sqlx(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(db_err) => {
            let message = db_err.message();
            message.contains("database is locked") || message.contains("database is busy")
        }
        _ => false,
    }
}
