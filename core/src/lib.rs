//! # Pollwatch Core
//!
//! Polling change detection for hierarchical storage. An observer retains a
//! snapshot tree of a watched directory, re-lists it on every poll, and
//! reports created, changed, and deleted files and directories to its
//! listeners. A monitor drives one or more observers from a background task
//! at a fixed interval.
//!
//! No native change-notification facility (inotify, FSEvents) is involved,
//! so this works against any backend that implements
//! [`StorageProvider`](pollwatch_storage::StorageProvider): local disks,
//! network filesystems, or object-storage emulations.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                        PollingMonitor                          │
//! │   tick ──► DirectoryObserver ──► sorted-merge diff             │
//! │                 │                     │                        │
//! │                 ▼                     ▼                        │
//! │            FileEntry tree       ChangeListener callbacks       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Changes that happen and revert between two polls are invisible; the diff
//! looks at metadata only (existence, directory-ness, mtime, size), never at
//! file contents.

pub mod entry;
pub mod error;
pub mod event;
pub mod filter;
pub mod listener;
pub mod monitor;
pub mod observer;

pub use entry::FileEntry;
pub use error::{Result, WatchError};
pub use event::{ChangeEvent, ChangeKind};
pub use filter::PathFilter;
pub use listener::{ChangeListener, ChannelListener};
pub use monitor::{DEFAULT_INTERVAL, PollingMonitor};
pub use observer::DirectoryObserver;
