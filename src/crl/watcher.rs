//! Config file watcher for automatic reload.
//!
//! Watches the directory holding the config file, so atomic saves (write to a
//! temp file, then rename) and ConfigMap symlink swaps are picked up as well as
//! in-place edits. Bursts of events are debounced into a single reload.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::errors::ConfigError;
use super::store::ConfigStore;

/// Delay used to coalesce the several events a single save produces
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Reloads a [`ConfigStore`] whenever its file changes on disk.
///
/// Watching stops when this value is dropped.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for ConfigWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWatcher").finish_non_exhaustive()
    }
}

impl ConfigWatcher {
    /// Start watching the store's config file. Must be called within a tokio
    /// runtime.
    pub fn spawn(store: Arc<ConfigStore>, debounce: Duration) -> Result<Self, ConfigError> {
        let (parent_dir, file_name) = watch_target(store.path())?;
        let (tx, rx) = mpsc::unbounded_channel::<()>();

        let watched_name = file_name.clone();
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) => {
                    if is_relevant(&event, &watched_name) {
                        debug!("Config file event: {:?}", event.kind);
                        // The receiver only goes away together with the watcher
                        let _ = tx.send(());
                    }
                }
                Err(e) => warn!("Config watch error: {}", e),
            }
        })?;
        watcher.watch(&parent_dir, RecursiveMode::NonRecursive)?;

        info!(
            "Watching {} for changes",
            parent_dir.join(&file_name).display()
        );

        let task = tokio::spawn(reload_on_change(store, rx, debounce));

        Ok(Self {
            _watcher: watcher,
            task,
        })
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn reload_on_change(
    store: Arc<ConfigStore>,
    mut events: UnboundedReceiver<()>,
    debounce: Duration,
) {
    while events.recv().await.is_some() {
        tokio::time::sleep(debounce).await;
        while events.try_recv().is_ok() {}

        info!("Config changed, reloading {}", store.path().display());
        // Failures are logged by the store; the previous config stays active
        let _ = store.reload();
    }
}

fn watch_target(path: &Path) -> Result<(PathBuf, OsString), ConfigError> {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let file_name = absolute
        .file_name()
        .map(OsString::from)
        .ok_or_else(|| ConfigError::InvalidPath(path.to_path_buf()))?;
    let parent_dir = absolute
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| ConfigError::InvalidPath(path.to_path_buf()))?;

    Ok((parent_dir, file_name))
}

fn is_relevant(event: &Event, file_name: &OsString) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }

    event.paths.iter().any(|p| {
        p.file_name().is_some_and(|name| name == file_name.as_os_str())
            // Kubernetes ConfigMaps swap a `..data` symlink instead of the file
            || p.file_name().is_some_and(|name| name == "..data")
    })
}
