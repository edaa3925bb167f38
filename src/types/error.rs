//! Unified error types for the application
//!
//! One enum covers every layer so handlers can map variants to HTTP
//! statuses in a single place. All errors are serializable and carry
//! user-actionable messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error type for the store, scanner, and API layers
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ShelfError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad caller input (invalid id, page, limit, missing parameters).
    /// Surfaced as 400, never retried.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A single message file that cannot be parsed as mail at all.
    /// Recovered locally by the scanner: recorded as a skip, scan continues.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The scan target does not exist or is not a directory.
    /// Aborts the whole scan; there is nothing to ingest.
    #[error("Invalid root directory: {0}")]
    InvalidRoot(String),

    #[error("IO error: {0}")]
    Io(String),

    /// Durability layer failure (disk, corruption, pool exhaustion).
    /// Surfaced as 500; the caller must retry the whole operation.
    #[error("Store error: {0}")]
    Store(String),

    #[error("{0}")]
    Other(String),
}

// Implement From for common error types

impl From<std::io::Error> for ShelfError {
    fn from(err: std::io::Error) -> Self {
        ShelfError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ShelfError {
    fn from(err: toml::de::Error) -> Self {
        ShelfError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for ShelfError {
    fn from(err: serde_json::Error) -> Self {
        ShelfError::Parse(err.to_string())
    }
}

impl From<rusqlite::Error> for ShelfError {
    fn from(err: rusqlite::Error) -> Self {
        ShelfError::Store(err.to_string())
    }
}

impl From<r2d2::Error> for ShelfError {
    fn from(err: r2d2::Error) -> Self {
        ShelfError::Store(err.to_string())
    }
}

/// Result type alias using ShelfError
pub type Result<T> = std::result::Result<T, ShelfError>;
