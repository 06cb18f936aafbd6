//! Error types for the watcher core.

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, WatchError>;

/// Errors that can occur driving a watch.
#[derive(Error, Debug)]
pub enum WatchError {
    /// `start` was called on a monitor that is already running.
    #[error("monitor is already running")]
    AlreadyRunning,

    /// `stop` was called on a monitor that is not running.
    #[error("monitor is not running")]
    NotRunning,

    /// The storage backend failed while establishing a baseline snapshot.
    #[error("storage error: {0}")]
    Storage(#[from] pollwatch_storage::StorageError),
}
