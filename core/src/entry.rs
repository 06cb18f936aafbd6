//! Snapshot nodes for the retained directory tree.

use chrono::{DateTime, Utc};
use pollwatch_storage::PathMeta;

/// Name used for a root entry whose path has no final segment.
pub const ROOT_NAME: &str = "/";

/// A snapshot node capturing one path's last-known metadata and children.
///
/// An observer owns one root entry and, through it, the whole retained tree.
/// Scalar fields are overwritten in place by [`refresh`](FileEntry::refresh);
/// the `children` array is replaced wholesale by each diff pass and is always
/// kept sorted ascending by name, which the sorted-merge comparison relies
/// on. A non-directory entry always has an empty `children` array.
#[derive(Debug, Clone)]
pub struct FileEntry<P> {
    path: P,
    name: String,
    exists: bool,
    is_directory: bool,
    modified: Option<DateTime<Utc>>,
    size: u64,
    children: Vec<FileEntry<P>>,
    level: usize,
}

impl<P> FileEntry<P> {
    fn new(path: P, name: String, level: usize) -> Self {
        Self {
            path,
            name,
            exists: false,
            is_directory: false,
            modified: None,
            size: 0,
            children: Vec::new(),
            level,
        }
    }

    /// Create an unrefreshed root entry. `name` is the path's final segment;
    /// a path without one gets the [`ROOT_NAME`] sentinel.
    pub fn new_root(path: P, name: Option<String>) -> Self {
        Self::new(path, name.unwrap_or_else(|| ROOT_NAME.to_string()), 0)
    }

    /// Create an unrefreshed child entry one level below this one.
    pub fn new_child(&self, path: P, name: String) -> Self {
        Self::new(path, name, self.level + 1)
    }

    /// Overwrite the scalar fields from a freshly fetched metadata snapshot
    /// and report whether any of existence, directory-ness, modification
    /// time, or size differs from the previous refresh.
    ///
    /// This is the sole driver of "changed" notifications. Fields dependent
    /// on existence reset to their zero values when the path is gone.
    pub fn refresh(&mut self, meta: &PathMeta) -> bool {
        let orig_exists = self.exists;
        let orig_directory = self.is_directory;
        let orig_modified = self.modified;
        let orig_size = self.size;

        self.exists = meta.exists;
        self.is_directory = meta.exists && meta.is_directory;
        self.modified = if meta.exists { meta.modified } else { None };
        self.size = if meta.exists && !self.is_directory {
            meta.size
        } else {
            0
        };

        self.exists != orig_exists
            || self.is_directory != orig_directory
            || self.modified != orig_modified
            || self.size != orig_size
    }

    /// The path this entry snapshots.
    pub fn path(&self) -> &P {
        &self.path
    }

    /// The last path segment, or [`ROOT_NAME`] for a segment-less root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the path existed at the last refresh.
    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Whether the path was a directory at the last refresh. Meaningful only
    /// when [`exists`](FileEntry::exists) is true.
    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// Modification time at the last refresh, if readable.
    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    /// Size in bytes at the last refresh; 0 for directories and missing
    /// paths.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Depth below the observed root (the root itself is level 0).
    pub fn level(&self) -> usize {
        self.level
    }

    /// The retained children, sorted ascending by name.
    pub fn children(&self) -> &[FileEntry<P>] {
        &self.children
    }

    /// Replace the children array. Callers keep it name-sorted.
    pub fn set_children(&mut self, children: Vec<FileEntry<P>>) {
        self.children = children;
    }

    /// Take ownership of the children, leaving this entry childless.
    pub fn take_children(&mut self) -> Vec<FileEntry<P>> {
        std::mem::take(&mut self.children)
    }
}
