//! Directory observer: retains a snapshot tree and diffs it per poll.

use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use pollwatch_storage::StorageProvider;

use crate::entry::{FileEntry, ROOT_NAME};
use crate::error::Result;
use crate::filter::PathFilter;
use crate::listener::ChangeListener;

type Listeners<S> = Vec<Arc<dyn ChangeListener<S>>>;

/// A freshly listed child: its backend path plus the name it sorts by.
type Listed<P> = (P, String);

/// Watches one root path by diffing fresh listings against a retained
/// [`FileEntry`] tree and firing listener callbacks for the differences.
///
/// The observer exclusively owns its tree; it is only mutated by
/// [`initialize`](Self::initialize), [`check_and_notify`](Self::check_and_notify)
/// and [`destroy`](Self::destroy), which serialize on an internal lock.
/// Listeners can be added and removed concurrently with a running check; the
/// change takes effect at the next notification pass.
pub struct DirectoryObserver<S: StorageProvider> {
    provider: Arc<S>,
    directory: S::Path,
    root: Mutex<FileEntry<S::Path>>,
    listeners: RwLock<Listeners<S>>,
    filter: Option<Box<dyn PathFilter<S::Path>>>,
}

impl<S: StorageProvider> DirectoryObserver<S> {
    /// Create an observer for the given root path.
    pub fn new(provider: Arc<S>, directory: S::Path) -> Self {
        Self::build(provider, directory, None)
    }

    /// Create an observer that only sees paths accepted by `filter`.
    ///
    /// The filter applies at listing time: rejected paths never become
    /// entries and never produce events.
    pub fn with_filter(
        provider: Arc<S>,
        directory: S::Path,
        filter: impl PathFilter<S::Path> + 'static,
    ) -> Self {
        Self::build(provider, directory, Some(Box::new(filter)))
    }

    fn build(
        provider: Arc<S>,
        directory: S::Path,
        filter: Option<Box<dyn PathFilter<S::Path>>>,
    ) -> Self {
        let name = provider.file_name(&directory);
        let root = FileEntry::new_root(directory.clone(), name);
        Self {
            provider,
            directory,
            root: Mutex::new(root),
            listeners: RwLock::new(Vec::new()),
            filter,
        }
    }

    /// The root path being observed.
    pub fn directory(&self) -> &S::Path {
        &self.directory
    }

    /// The storage provider this observer polls.
    pub fn provider(&self) -> &Arc<S> {
        &self.provider
    }

    /// Register a listener. Takes effect from the next notification pass.
    pub async fn add_listener(&self, listener: Arc<dyn ChangeListener<S>>) {
        self.listeners.write().await.push(listener);
    }

    /// Remove a previously registered listener (matched by identity).
    pub async fn remove_listener(&self, listener: &Arc<dyn ChangeListener<S>>) {
        self.listeners
            .write()
            .await
            .retain(|registered| !Arc::ptr_eq(registered, listener));
    }

    /// Snapshot of the registered listeners, in registration order.
    pub async fn listeners(&self) -> Listeners<S> {
        self.listeners.read().await.clone()
    }

    /// Establish the baseline snapshot: refresh the root and recursively
    /// list its tree. Must complete before the first
    /// [`check_and_notify`](Self::check_and_notify).
    ///
    /// Fails if the root itself cannot be listed. Failures below the root
    /// degrade that directory to an empty listing, exactly as they do during
    /// a poll.
    pub async fn initialize(&self) -> Result<()> {
        let mut root = self.root.lock().await;
        let meta = self.provider.stat(&self.directory).await;
        root.refresh(&meta);

        let mut children = Vec::new();
        if root.is_directory() {
            for (path, name) in self.list_sorted(&self.directory).await? {
                children.push(self.build_entry(&root, path, name).await);
            }
        }
        root.set_children(children);

        debug!("established baseline for {:?}", self.directory);
        Ok(())
    }

    /// Final processing when a monitor stops: drop the retained snapshot.
    /// A later [`initialize`](Self::initialize) rebuilds the baseline.
    pub async fn destroy(&self) {
        let mut root = self.root.lock().await;
        root.set_children(Vec::new());
        debug!("dropped retained snapshot for {:?}", self.directory);
    }

    /// Run one poll: diff the retained tree against fresh listings and fire
    /// listener callbacks for every difference.
    ///
    /// Fires `on_start` to every listener before any diff work and `on_stop`
    /// after it, whether or not the root still exists. Backend failures
    /// never surface here: a directory that fails to list is treated as
    /// empty for this tick and is retried by the next one.
    pub async fn check_and_notify(&self) {
        let listeners = self.listeners().await;
        for listener in &listeners {
            listener.on_start(self);
        }

        let mut root = self.root.lock().await;
        if self.provider.exists(&self.directory).await {
            let current = self.list_sorted_lenient(&self.directory).await;
            let previous = root.take_children();
            let children = self.diff(&root, previous, current, &listeners).await;
            root.set_children(children);
        } else if root.exists() {
            // Root is gone: flood deletions through the retained subtree.
            let previous = root.take_children();
            let children = self.diff(&root, previous, Vec::new(), &listeners).await;
            root.set_children(children);
        }
        // Never existed and still doesn't: nothing to report.
        drop(root);

        for listener in &listeners {
            listener.on_stop(self);
        }
    }

    /// Sorted-merge of the retained entries against a fresh listing,
    /// recursing into matched directories. Returns the replacement children
    /// array, name-sorted.
    ///
    /// Creates fire parent-before-children, deletes children-before-parent.
    fn diff<'a>(
        &'a self,
        parent: &'a FileEntry<S::Path>,
        previous: Vec<FileEntry<S::Path>>,
        current: Vec<Listed<S::Path>>,
        listeners: &'a [Arc<dyn ChangeListener<S>>],
    ) -> BoxFuture<'a, Vec<FileEntry<S::Path>>> {
        async move {
            let mut output = Vec::with_capacity(current.len());
            let mut current = current.into_iter().peekable();

            for mut entry in previous {
                // Fresh names sorting strictly before this retained entry
                // are paths inserted ahead of it.
                while let Some((path, name)) =
                    current.next_if(|(_, name)| name.as_str() < entry.name())
                {
                    let created = self.build_entry(parent, path, name).await;
                    self.fire_create(&created, listeners);
                    output.push(created);
                }

                if let Some((path, _)) =
                    current.next_if(|(_, name)| name.as_str() == entry.name())
                {
                    // Same name, same logical path: refresh in place and
                    // descend.
                    self.refresh_match(&mut entry, &path, listeners).await;
                    let grandchildren = entry.take_children();
                    let fresh = self.list_sorted_lenient(&path).await;
                    let children = self.diff(&entry, grandchildren, fresh, listeners).await;
                    entry.set_children(children);
                    output.push(entry);
                } else {
                    // Gone: report the subtree bottom-up, then the entry
                    // itself.
                    let grandchildren = entry.take_children();
                    self.diff(&entry, grandchildren, Vec::new(), listeners).await;
                    self.fire_delete(&entry, listeners);
                }
            }

            // Anything left in the fresh listing sorts after every retained
            // entry and is new.
            for (path, name) in current {
                let created = self.build_entry(parent, path, name).await;
                self.fire_create(&created, listeners);
                output.push(created);
            }

            output
        }
        .boxed()
    }

    /// Refresh a matched entry and fire a change event if its metadata
    /// moved. The event flavor follows the refreshed directory-ness.
    async fn refresh_match(
        &self,
        entry: &mut FileEntry<S::Path>,
        path: &S::Path,
        listeners: &[Arc<dyn ChangeListener<S>>],
    ) {
        let meta = self.provider.stat(path).await;
        if entry.refresh(&meta) {
            for listener in listeners {
                if entry.is_directory() {
                    listener.on_directory_change(path);
                } else {
                    listener.on_file_change(path);
                }
            }
        }
    }

    /// Build an entry for a newly seen path, descending into its whole
    /// subtree so nested content is captured (and reported) with it.
    fn build_entry<'a>(
        &'a self,
        parent: &'a FileEntry<S::Path>,
        path: S::Path,
        name: String,
    ) -> BoxFuture<'a, FileEntry<S::Path>> {
        async move {
            let mut entry = parent.new_child(path, name);
            let meta = self.provider.stat(entry.path()).await;
            entry.refresh(&meta);

            let mut children = Vec::new();
            for (child_path, child_name) in self.list_sorted_lenient(entry.path()).await {
                children.push(self.build_entry(&entry, child_path, child_name).await);
            }
            entry.set_children(children);
            entry
        }
        .boxed()
    }

    /// Fire create callbacks for an entry and its subtree, parent before
    /// children.
    fn fire_create(&self, entry: &FileEntry<S::Path>, listeners: &[Arc<dyn ChangeListener<S>>]) {
        for listener in listeners {
            if entry.is_directory() {
                listener.on_directory_create(entry.path());
            } else {
                listener.on_file_create(entry.path());
            }
        }
        for child in entry.children() {
            self.fire_create(child, listeners);
        }
    }

    /// Fire the delete callback for a single entry. Descendants are handled
    /// by the diff recursion, which reaches them first.
    fn fire_delete(&self, entry: &FileEntry<S::Path>, listeners: &[Arc<dyn ChangeListener<S>>]) {
        for listener in listeners {
            if entry.is_directory() {
                listener.on_directory_delete(entry.path());
            } else {
                listener.on_file_delete(entry.path());
            }
        }
    }

    /// List, filter, and name-sort the children of `path`. Non-directories
    /// list as empty without touching the backend listing call.
    async fn list_sorted(&self, path: &S::Path) -> Result<Vec<Listed<S::Path>>> {
        if !self.provider.is_directory(path).await {
            return Ok(Vec::new());
        }

        let mut children = Vec::new();
        for child in self.provider.list_children(path).await? {
            if let Some(filter) = &self.filter {
                if !filter.accept(&child) {
                    continue;
                }
            }
            let name = self
                .provider
                .file_name(&child)
                .unwrap_or_else(|| ROOT_NAME.to_string());
            children.push((child, name));
        }
        children.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(children)
    }

    /// Lenient listing for poll time: a backend failure degrades the
    /// directory to an empty listing for this tick only, which can surface
    /// as deletions until the next healthy tick re-creates the subtree.
    async fn list_sorted_lenient(&self, path: &S::Path) -> Vec<Listed<S::Path>> {
        match self.list_sorted(path).await {
            Ok(children) => children,
            Err(err) => {
                warn!("failed to list {path:?}: {err}");
                Vec::new()
            }
        }
    }
}

impl<S: StorageProvider> fmt::Debug for DirectoryObserver<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryObserver")
            .field("directory", &self.directory)
            .field("filtered", &self.filter.is_some())
            .finish_non_exhaustive()
    }
}
