//! Error types for storage backends.

use thiserror::Error;

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur in a storage backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Path not found.
    #[error("path not found: {0}")]
    NotFound(String),

    /// Listing was requested for a path that is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),
}
