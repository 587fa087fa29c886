// File: src/watcher.rs
// Purpose: Dev-mode catalog rebuilds when the page tree changes

use crate::page_loader::PageLoader;
use crate::store::CatalogStore;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Outcome of a rebuild triggered by file changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    /// A new snapshot is live
    Rebuilt { version: u64 },
    /// The previous snapshot stays live
    Failed { error: String },
}

/// Watches the page root and swaps in a fresh catalog after each burst of
/// changes
///
/// Must be spawned inside a tokio runtime. Dropping the watcher stops it.
pub struct CatalogWatcher {
    events: broadcast::Sender<CatalogEvent>,
    task: JoinHandle<()>,
    _watcher: RecommendedWatcher,
}

impl CatalogWatcher {
    pub fn spawn(
        store: Arc<CatalogStore>,
        loader: PageLoader,
        debounce: Duration,
    ) -> notify::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(16);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    for path in event.paths {
                        let _ = tx.send(path);
                    }
                }
            }
            Err(e) => error!(error = %e, "watch error"),
        })?;

        // A page root created after startup would otherwise never be watched
        if !loader.pages_dir().exists() {
            warn!(pages_dir = ?loader.pages_dir(), "pages directory does not exist, creating it");
            std::fs::create_dir_all(loader.pages_dir())
                .map_err(|e| notify::Error::io(e).add_path(loader.pages_dir().to_path_buf()))?;
        }
        watcher.watch(loader.pages_dir(), RecursiveMode::Recursive)?;
        info!(pages_dir = ?loader.pages_dir(), "watching pages for changes");

        let task = tokio::spawn(rebuild_loop(store, loader, debounce, rx, events.clone()));

        Ok(Self {
            events,
            task,
            _watcher: watcher,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }
}

impl Drop for CatalogWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Waits for a change, drains the burst until `debounce` passes quietly,
/// then rebuilds once
async fn rebuild_loop(
    store: Arc<CatalogStore>,
    loader: PageLoader,
    debounce: Duration,
    mut changes: mpsc::UnboundedReceiver<PathBuf>,
    events: broadcast::Sender<CatalogEvent>,
) {
    while let Some(first) = changes.recv().await {
        debug!(path = ?first, "page tree changed");
        let mut count = 1usize;
        loop {
            match tokio::time::timeout(debounce, changes.recv()).await {
                Ok(Some(path)) => {
                    debug!(path = ?path, "page tree changed");
                    count += 1;
                }
                Ok(None) | Err(_) => break,
            }
        }

        let rebuild_store = store.clone();
        let rebuild_loader = loader.clone();
        let result =
            tokio::task::spawn_blocking(move || rebuild_store.rebuild(&rebuild_loader)).await;

        let event = match result {
            Ok(Ok(version)) => {
                info!(version, changes = count, "catalog rebuilt");
                CatalogEvent::Rebuilt { version }
            }
            Ok(Err(e)) => CatalogEvent::Failed {
                error: e.to_string(),
            },
            Err(e) => {
                error!(error = %e, "catalog rebuild task failed");
                CatalogEvent::Failed {
                    error: e.to_string(),
                }
            }
        };

        // No subscribers is fine
        let _ = events.send(event);
    }
}
