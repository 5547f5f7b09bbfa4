//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Receipt serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An identifier lookup with a value that is not a 64-hex digest.
    #[error("invalid receipt identifier: {0:?}")]
    InvalidId(String),

    /// Background task failed (spawn_blocking join error).
    #[error("background task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
