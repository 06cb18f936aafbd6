//! The storage provider interface the watcher core polls.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata snapshot for a single path.
///
/// `is_directory` is meaningful only when `exists` is true; `modified` is
/// `None` when the path is gone or its timestamp is unreadable; `size` is 0
/// for directories and missing paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMeta {
    /// Whether the path currently exists.
    pub exists: bool,

    /// Whether the path is a directory.
    pub is_directory: bool,

    /// Last modification time, if readable.
    pub modified: Option<DateTime<Utc>>,

    /// Size in bytes for regular files.
    pub size: u64,
}

impl PathMeta {
    /// Metadata for a path that does not exist.
    pub fn missing() -> Self {
        Self {
            exists: false,
            is_directory: false,
            modified: None,
            size: 0,
        }
    }
}

/// A hierarchical storage backend.
///
/// This is the entire surface the watcher needs: existence, type,
/// modification time, size, and a flat child listing. Backends that have no
/// native change notification are fine; the watcher polls.
#[async_trait]
pub trait StorageProvider: Send + Sync + 'static {
    /// Backend path type. Opaque to the watcher beyond cloning, equality,
    /// and the name exposed by [`file_name`](StorageProvider::file_name).
    type Path: Clone + Eq + Send + Sync + fmt::Debug + 'static;

    /// Whether the path currently exists.
    async fn exists(&self, path: &Self::Path) -> bool;

    /// Whether the path is a directory. Meaningful only when it exists.
    async fn is_directory(&self, path: &Self::Path) -> bool;

    /// Last modification time, or `None` when missing or unreadable.
    async fn modified(&self, path: &Self::Path) -> Option<DateTime<Utc>>;

    /// Size in bytes, or `None` on error. Meaningful only for existing
    /// regular files.
    async fn size(&self, path: &Self::Path) -> Option<u64>;

    /// List the direct children of a directory, in no particular order.
    async fn list_children(&self, path: &Self::Path) -> Result<Vec<Self::Path>>;

    /// The last path segment, or `None` for a root-like path with no final
    /// segment.
    fn file_name(&self, path: &Self::Path) -> Option<String>;

    /// Whether the backend considers the path hidden. Intended for filters;
    /// backends without the concept keep the default.
    fn is_hidden(&self, _path: &Self::Path) -> bool {
        false
    }

    /// Fetch a full metadata snapshot for a path.
    ///
    /// The default composes the four metadata primitives: type is only
    /// consulted for existing paths, size only for existing non-directories.
    /// Backends with a cheaper combined stat call may override.
    async fn stat(&self, path: &Self::Path) -> PathMeta {
        let exists = self.exists(path).await;
        let is_directory = exists && self.is_directory(path).await;
        let modified = if exists { self.modified(path).await } else { None };
        let size = if exists && !is_directory {
            self.size(path).await.unwrap_or(0)
        } else {
            0
        };

        PathMeta {
            exists,
            is_directory,
            modified,
            size,
        }
    }
}
