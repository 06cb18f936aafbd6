//! Background scheduler driving observers at a fixed interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pollwatch_storage::StorageProvider;

use crate::error::{Result, WatchError};
use crate::observer::DirectoryObserver;

/// Polling interval used by [`PollingMonitor::default`].
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Drives a set of [`DirectoryObserver`]s from a background task at a fixed
/// interval.
///
/// One task per monitor: observers are polled sequentially in registration
/// order within a tick, with no overlap. The observer set can be changed
/// while running; the loop re-reads it at every tick. Lifecycle is strict:
/// `start` on a running monitor and `stop` on a stopped one both fail
/// loudly instead of silently doing nothing.
pub struct PollingMonitor<S: StorageProvider> {
    interval: Duration,
    observers: Arc<RwLock<Vec<Arc<DirectoryObserver<S>>>>>,
    runtime: Option<Handle>,
    running: Mutex<Option<RunningLoop>>,
}

struct RunningLoop {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl<S: StorageProvider> PollingMonitor<S> {
    /// Create a monitor with the given inter-tick interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            observers: Arc::new(RwLock::new(Vec::new())),
            runtime: None,
            running: Mutex::new(None),
        }
    }

    /// Create a monitor with an initial set of observers.
    pub fn with_observers(interval: Duration, observers: Vec<Arc<DirectoryObserver<S>>>) -> Self {
        Self {
            interval,
            observers: Arc::new(RwLock::new(observers)),
            runtime: None,
            running: Mutex::new(None),
        }
    }

    /// Spawn the polling loop on the given runtime instead of the ambient
    /// one.
    pub fn spawn_on(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// The configured inter-tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Register an observer. A loop that is already running picks it up on
    /// its next tick; the monitor does not initialize it retroactively.
    pub async fn add_observer(&self, observer: Arc<DirectoryObserver<S>>) {
        self.observers.write().await.push(observer);
    }

    /// Remove a previously registered observer (matched by identity).
    pub async fn remove_observer(&self, observer: &Arc<DirectoryObserver<S>>) {
        self.observers
            .write()
            .await
            .retain(|registered| !Arc::ptr_eq(registered, observer));
    }

    /// Snapshot of the registered observers, in registration order.
    pub async fn observers(&self) -> Vec<Arc<DirectoryObserver<S>>> {
        self.observers.read().await.clone()
    }

    /// Whether the polling loop is currently running.
    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Initialize every registered observer and start the polling loop.
    ///
    /// Fails with [`WatchError::AlreadyRunning`] if already started. An
    /// observer that cannot establish its baseline fails the whole call and
    /// the loop is not started.
    pub async fn start(&self) -> Result<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            return Err(WatchError::AlreadyRunning);
        }

        for observer in self.observers.read().await.iter() {
            observer.initialize().await?;
        }

        let cancel = CancellationToken::new();
        let poll_loop = {
            let observers = Arc::clone(&self.observers);
            let interval = self.interval;
            let cancel = cancel.clone();
            async move {
                loop {
                    let snapshot = observers.read().await.clone();
                    for observer in snapshot {
                        observer.check_and_notify().await;
                    }
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(interval) => {}
                    }
                }
                debug!("polling loop exited");
            }
        };
        let task = match &self.runtime {
            Some(handle) => handle.spawn(poll_loop),
            None => tokio::spawn(poll_loop),
        };

        *running = Some(RunningLoop { cancel, task });
        info!("monitor started, polling every {:?}", self.interval);
        Ok(())
    }

    /// Signal the loop to stop, wait for it to exit, and run final
    /// processing on every observer.
    ///
    /// A zero `timeout` waits for the loop indefinitely; otherwise the join
    /// is abandoned after `timeout` and the call still succeeds, with the
    /// task winding down on its own shortly after. The inter-tick sleep is
    /// interrupted immediately, so shutdown latency does not include a
    /// partial interval. Fails with [`WatchError::NotRunning`] if the
    /// monitor is not started.
    pub async fn stop(&self, timeout: Duration) -> Result<()> {
        let RunningLoop { cancel, task } = {
            let mut running = self.running.lock().await;
            running.take().ok_or(WatchError::NotRunning)?
        };

        cancel.cancel();
        if timeout.is_zero() {
            if let Err(err) = task.await {
                warn!("polling loop task failed: {err}");
            }
        } else {
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!("polling loop task failed: {err}"),
                Err(_) => warn!("polling loop did not exit within {timeout:?}"),
            }
        }

        for observer in self.observers.read().await.iter() {
            observer.destroy().await;
        }
        info!("monitor stopped");
        Ok(())
    }
}

impl<S: StorageProvider> Default for PollingMonitor<S> {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}
