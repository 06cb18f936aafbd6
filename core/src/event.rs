//! Typed change events.
//!
//! The observer's primary surface is the callback-based
//! [`ChangeListener`](crate::listener::ChangeListener); these types exist
//! for consumers that want the same information as data, e.g. forwarded over
//! a channel by [`ChannelListener`](crate::listener::ChannelListener).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of detected change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Directory appeared.
    DirectoryCreate,

    /// Directory metadata changed.
    DirectoryChange,

    /// Directory disappeared.
    DirectoryDelete,

    /// File appeared.
    FileCreate,

    /// File metadata changed.
    FileChange,

    /// File disappeared.
    FileDelete,
}

impl ChangeKind {
    /// Whether this kind concerns a directory.
    pub fn is_directory(self) -> bool {
        matches!(
            self,
            Self::DirectoryCreate | Self::DirectoryChange | Self::DirectoryDelete
        )
    }

    /// Whether this is a creation.
    pub fn is_create(self) -> bool {
        matches!(self, Self::DirectoryCreate | Self::FileCreate)
    }

    /// Whether this is a metadata change.
    pub fn is_change(self) -> bool {
        matches!(self, Self::DirectoryChange | Self::FileChange)
    }

    /// Whether this is a deletion.
    pub fn is_delete(self) -> bool {
        matches!(self, Self::DirectoryDelete | Self::FileDelete)
    }
}

/// A single detected change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent<P> {
    /// What happened.
    pub kind: ChangeKind,

    /// The affected path.
    pub path: P,

    /// When the change was detected (not when it happened on the backend).
    pub timestamp: DateTime<Utc>,
}

impl<P> ChangeEvent<P> {
    /// Create an event stamped with the current time.
    pub fn new(kind: ChangeKind, path: P) -> Self {
        Self {
            kind,
            path,
            timestamp: Utc::now(),
        }
    }
}
