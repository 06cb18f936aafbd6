//! Integration tests for the polling monitor: lifecycle rules, prompt
//! shutdown, and end-to-end change delivery through a running loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tokio::sync::mpsc;

use pollwatch_core::{
    ChangeEvent, ChangeKind, ChannelListener, DirectoryObserver, PollingMonitor, WatchError,
};
use pollwatch_storage::LocalStorage;

type Events = mpsc::UnboundedReceiver<ChangeEvent<PathBuf>>;

async fn watched(
    root: &Path,
    interval: Duration,
) -> (PollingMonitor<LocalStorage>, Arc<DirectoryObserver<LocalStorage>>, Events) {
    let observer = Arc::new(DirectoryObserver::new(
        Arc::new(LocalStorage::new()),
        root.to_path_buf(),
    ));
    let (listener, events) = ChannelListener::new();
    observer.add_listener(Arc::new(listener)).await;

    let monitor = PollingMonitor::with_observers(interval, vec![Arc::clone(&observer)]);
    (monitor, observer, events)
}

async fn next_event(events: &mut Events) -> ChangeEvent<PathBuf> {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event channel closed")
}

#[tokio::test]
async fn detects_a_file_lifecycle_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let (monitor, _observer, mut events) =
        watched(temp_dir.path(), Duration::from_millis(50)).await;
    monitor.start().await.unwrap();

    let file = temp_dir.path().join("a.txt");
    std::fs::write(&file, b"hello").unwrap();
    let event = next_event(&mut events).await;
    assert_eq!((event.kind, event.path), (ChangeKind::FileCreate, file.clone()));

    std::fs::write(&file, b"hello, world").unwrap();
    let event = next_event(&mut events).await;
    assert_eq!((event.kind, event.path), (ChangeKind::FileChange, file.clone()));

    std::fs::remove_file(&file).unwrap();
    // A write racing the poll can produce extra change events first.
    let mut event = next_event(&mut events).await;
    while event.kind == ChangeKind::FileChange {
        event = next_event(&mut events).await;
    }
    assert_eq!((event.kind, event.path), (ChangeKind::FileDelete, file));

    monitor.stop(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn second_start_fails_without_stopping_the_loop() {
    let temp_dir = TempDir::new().unwrap();
    let (monitor, _observer, mut events) =
        watched(temp_dir.path(), Duration::from_millis(50)).await;
    monitor.start().await.unwrap();

    assert!(matches!(monitor.start().await, Err(WatchError::AlreadyRunning)));

    // The loop must still be ticking.
    std::fs::write(temp_dir.path().join("alive.txt"), b"ok").unwrap();
    let event = next_event(&mut events).await;
    assert_eq!(event.kind, ChangeKind::FileCreate);

    monitor.stop(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn stop_of_a_stopped_monitor_fails() {
    let temp_dir = TempDir::new().unwrap();
    let (monitor, _observer, _events) =
        watched(temp_dir.path(), Duration::from_millis(50)).await;

    assert!(matches!(
        monitor.stop(Duration::ZERO).await,
        Err(WatchError::NotRunning)
    ));

    monitor.start().await.unwrap();
    monitor.stop(Duration::from_secs(1)).await.unwrap();
    assert!(matches!(
        monitor.stop(Duration::from_secs(1)).await,
        Err(WatchError::NotRunning)
    ));
}

#[tokio::test]
async fn stop_interrupts_a_long_inter_tick_sleep() {
    let temp_dir = TempDir::new().unwrap();
    let (monitor, _observer, _events) =
        watched(temp_dir.path(), Duration::from_secs(30)).await;
    monitor.start().await.unwrap();

    // Let the loop finish its first pass and settle into the sleep.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let started = Instant::now();
    monitor.stop(Duration::from_secs(10)).await.unwrap();
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "stop took {:?}, sleep was not interrupted",
        started.elapsed()
    );
}

#[tokio::test]
async fn stop_with_zero_timeout_waits_for_the_loop() {
    let temp_dir = TempDir::new().unwrap();
    let (monitor, _observer, _events) =
        watched(temp_dir.path(), Duration::from_millis(50)).await;

    monitor.start().await.unwrap();
    monitor.stop(Duration::ZERO).await.unwrap();
    assert!(!monitor.is_running().await);
}

#[tokio::test]
async fn restart_detects_changes_again() {
    let temp_dir = TempDir::new().unwrap();
    let (monitor, _observer, mut events) =
        watched(temp_dir.path(), Duration::from_millis(50)).await;

    monitor.start().await.unwrap();
    let file = temp_dir.path().join("a.txt");
    std::fs::write(&file, b"hello").unwrap();
    assert_eq!(next_event(&mut events).await.kind, ChangeKind::FileCreate);
    monitor.stop(Duration::from_secs(1)).await.unwrap();

    // Drain anything the first run produced before it stopped.
    while events.try_recv().is_ok() {}

    monitor.start().await.unwrap();
    std::fs::write(&file, b"hello again, world").unwrap();
    assert_eq!(next_event(&mut events).await.kind, ChangeKind::FileChange);
    monitor.stop(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test]
async fn observer_added_while_running_is_polled() {
    let temp_dir = TempDir::new().unwrap();
    let monitor = PollingMonitor::<LocalStorage>::new(Duration::from_millis(50));
    monitor.start().await.unwrap();

    let observer = Arc::new(DirectoryObserver::new(
        Arc::new(LocalStorage::new()),
        temp_dir.path().to_path_buf(),
    ));
    let (listener, mut events) = ChannelListener::new();
    observer.add_listener(Arc::new(listener)).await;
    observer.initialize().await.unwrap();
    monitor.add_observer(Arc::clone(&observer)).await;

    std::fs::write(temp_dir.path().join("late.txt"), b"late").unwrap();
    let event = next_event(&mut events).await;
    assert_eq!(event.kind, ChangeKind::FileCreate);

    monitor.stop(Duration::from_secs(1)).await.unwrap();
}

#[test]
fn spawn_on_runs_the_loop_on_an_injected_runtime() {
    let driver = tokio::runtime::Runtime::new().unwrap();
    let worker = tokio::runtime::Runtime::new().unwrap();

    driver.block_on(async {
        let temp_dir = TempDir::new().unwrap();
        let (monitor, _observer, mut events) =
            watched(temp_dir.path(), Duration::from_millis(50)).await;
        let monitor = monitor.spawn_on(worker.handle().clone());

        monitor.start().await.unwrap();
        std::fs::write(temp_dir.path().join("a.txt"), b"hello").unwrap();
        let event = next_event(&mut events).await;
        assert_eq!(event.kind, ChangeKind::FileCreate);
        monitor.stop(Duration::from_secs(1)).await.unwrap();
    });
}
