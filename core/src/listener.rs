//! The listener contract and ready-made listeners.

use tokio::sync::mpsc;

use pollwatch_storage::StorageProvider;

use crate::event::{ChangeEvent, ChangeKind};
use crate::observer::DirectoryObserver;

/// Callbacks fired by a [`DirectoryObserver`] during one poll.
///
/// Every method defaults to a no-op, so implementations override only the
/// events they care about. Callbacks run synchronously on the observer's
/// tick, in listener registration order: `on_start` first, then per-node
/// events (creates parent-before-children, deletes children-before-parent),
/// then `on_stop`. A callback that panics takes the tick down with it; the
/// observer does not isolate listeners from each other.
pub trait ChangeListener<S: StorageProvider>: Send + Sync {
    /// The observer is about to start a check.
    fn on_start(&self, _observer: &DirectoryObserver<S>) {}

    /// A directory appeared.
    fn on_directory_create(&self, _path: &S::Path) {}

    /// A directory's metadata changed.
    fn on_directory_change(&self, _path: &S::Path) {}

    /// A directory disappeared.
    fn on_directory_delete(&self, _path: &S::Path) {}

    /// A file appeared.
    fn on_file_create(&self, _path: &S::Path) {}

    /// A file's metadata changed.
    fn on_file_change(&self, _path: &S::Path) {}

    /// A file disappeared.
    fn on_file_delete(&self, _path: &S::Path) {}

    /// The observer finished a check.
    fn on_stop(&self, _observer: &DirectoryObserver<S>) {}
}

/// A [`ChangeListener`] that forwards every per-node callback as a
/// [`ChangeEvent`] on an unbounded channel.
///
/// Useful for consumers that want a stream of changes instead of callbacks.
/// Events produced after the receiver is dropped are silently discarded.
pub struct ChannelListener<S: StorageProvider> {
    tx: mpsc::UnboundedSender<ChangeEvent<S::Path>>,
}

impl<S: StorageProvider> ChannelListener<S> {
    /// Create a listener and the receiving half of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChangeEvent<S::Path>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, kind: ChangeKind, path: &S::Path) {
        let _ = self.tx.send(ChangeEvent::new(kind, path.clone()));
    }
}

impl<S: StorageProvider> ChangeListener<S> for ChannelListener<S> {
    fn on_directory_create(&self, path: &S::Path) {
        self.forward(ChangeKind::DirectoryCreate, path);
    }

    fn on_directory_change(&self, path: &S::Path) {
        self.forward(ChangeKind::DirectoryChange, path);
    }

    fn on_directory_delete(&self, path: &S::Path) {
        self.forward(ChangeKind::DirectoryDelete, path);
    }

    fn on_file_create(&self, path: &S::Path) {
        self.forward(ChangeKind::FileCreate, path);
    }

    fn on_file_change(&self, path: &S::Path) {
        self.forward(ChangeKind::FileChange, path);
    }

    fn on_file_delete(&self, path: &S::Path) {
        self.forward(ChangeKind::FileDelete, path);
    }
}
