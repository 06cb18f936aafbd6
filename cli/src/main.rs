//! Command-line driver: watch a local directory tree by polling and report
//! every detected change until interrupted.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use pollwatch_core::{ChangeListener, ChannelListener, DirectoryObserver, PollingMonitor};
use pollwatch_storage::{LocalStorage, StorageProvider};

/// How long `stop` waits for the polling loop on shutdown.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Watch a directory tree by polling and print every detected change.
#[derive(Debug, Parser)]
#[command(name = "pollwatch", version, about)]
struct Args {
    /// Directory to watch.
    path: PathBuf,

    /// Seconds between polls.
    #[arg(long, default_value_t = 10)]
    interval: u64,

    /// Emit events as JSON lines instead of log output.
    #[arg(long)]
    json: bool,

    /// Skip hidden files and directories.
    #[arg(long)]
    ignore_hidden: bool,
}

/// Reports every change through the log.
struct LogListener;

impl ChangeListener<LocalStorage> for LogListener {
    fn on_start(&self, observer: &DirectoryObserver<LocalStorage>) {
        debug!("checking {}", observer.directory().display());
    }

    fn on_directory_create(&self, path: &PathBuf) {
        info!("{} was created", path.display());
    }

    fn on_directory_change(&self, path: &PathBuf) {
        info!("{} was modified", path.display());
    }

    fn on_directory_delete(&self, path: &PathBuf) {
        info!("{} was deleted", path.display());
    }

    fn on_file_create(&self, path: &PathBuf) {
        info!("{} was created", path.display());
    }

    fn on_file_change(&self, path: &PathBuf) {
        info!("{} was modified", path.display());
    }

    fn on_file_delete(&self, path: &PathBuf) {
        info!("{} was deleted", path.display());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let provider = Arc::new(LocalStorage::new());
    let observer = if args.ignore_hidden {
        let hidden_check = Arc::clone(&provider);
        Arc::new(DirectoryObserver::with_filter(
            Arc::clone(&provider),
            args.path.clone(),
            move |path: &PathBuf| !hidden_check.is_hidden(path),
        ))
    } else {
        Arc::new(DirectoryObserver::new(
            Arc::clone(&provider),
            args.path.clone(),
        ))
    };

    let mut events = None;
    if args.json {
        let (listener, receiver) = ChannelListener::new();
        observer.add_listener(Arc::new(listener)).await;
        events = Some(receiver);
    } else {
        observer.add_listener(Arc::new(LogListener)).await;
    }

    let monitor = PollingMonitor::with_observers(
        Duration::from_secs(args.interval),
        vec![Arc::clone(&observer)],
    );
    monitor
        .start()
        .await
        .with_context(|| format!("failed to start watching {}", args.path.display()))?;
    info!(
        "watching {} every {}s, press Ctrl-C to stop",
        args.path.display(),
        args.interval
    );

    match events {
        Some(mut receiver) => loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                Some(event) = receiver.recv() => {
                    println!("{}", serde_json::to_string(&event)?);
                }
            }
        },
        None => {
            tokio::signal::ctrl_c().await?;
        }
    }

    monitor.stop(STOP_TIMEOUT).await?;
    Ok(())
}
