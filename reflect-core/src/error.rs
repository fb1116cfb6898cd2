//! Error types for reflect-core

use thiserror::Error;

/// Main error type for the reflect-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Entry validation error
    #[error("validation error: {0}")]
    Validation(String),

    /// Analysis provider error
    #[error("provider error: {0}")]
    Provider(String),

    /// Entry not found
    #[error("entry not found: {0}")]
    EntryNotFound(String),
}

/// Result type alias for reflect-core
pub type Result<T> = std::result::Result<T, Error>;
