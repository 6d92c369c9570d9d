//! Configuration file watcher for hot reload.
//!
//! # Responsibilities
//! - Notice changes to the config file, including atomic replace-by-rename
//! - Coalesce the burst of events a single save produces
//! - Forward each new, valid revision to the server
//!
//! # Design Decisions
//! - Watches the parent directory and filters by file name; a watch on the
//!   file itself is lost when an editor renames a new file over it
//! - A revision equal to the last forwarded one is dropped
//! - Invalid revisions are logged and the running routes are kept

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::RouterConfig;

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Monitors the configuration file and forwards every valid revision.
pub struct ConfigWatcher {
    path: PathBuf,
    debounce: Duration,
    update_tx: mpsc::UnboundedSender<RouterConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RouterConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                debounce: DEFAULT_DEBOUNCE,
                update_tx,
            },
            update_rx,
        )
    }

    /// Quiet period after the last event before the file is reloaded.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start watching. Must be called inside a Tokio runtime; the returned
    /// handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let file_name = self
            .path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| notify::Error::generic("config path has no file name"))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches_file(&event, &file_name) => {
                    let _ = event_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        // The startup config is the baseline; an identical save is not a change
        let baseline = load_config(&self.path).ok();
        tokio::spawn(forward_changes(
            self.path.clone(),
            event_rx,
            self.update_tx,
            self.debounce,
            baseline,
        ));

        tracing::info!(path = ?self.path, debounce_ms = self.debounce.as_millis() as u64, "Config watcher started");
        Ok(watcher)
    }
}

/// True if `event` creates or modifies a file named `file_name`.
fn touches_file(event: &Event, file_name: &OsString) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

async fn forward_changes(
    path: PathBuf,
    mut events: mpsc::UnboundedReceiver<()>,
    updates: mpsc::UnboundedSender<RouterConfig>,
    debounce: Duration,
    mut last: Option<RouterConfig>,
) {
    while events.recv().await.is_some() {
        // Wait until the file has been quiet for `debounce`
        let mut closed = false;
        loop {
            match tokio::time::timeout(debounce, events.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => {
                    closed = true;
                    break;
                }
                Err(_) => break,
            }
        }

        tracing::info!("Config file change detected, reloading...");
        match load_config(&path) {
            Ok(config) if last.as_ref() == Some(&config) => {
                tracing::debug!("Config file unchanged, nothing to apply");
            }
            Ok(config) => {
                last = Some(config.clone());
                if updates.send(config).is_err() {
                    return;
                }
            }
            Err(e) => {
                tracing::error!("Failed to reload config: {}. Keeping current routes.", e);
            }
        }

        if closed {
            return;
        }
    }
}
