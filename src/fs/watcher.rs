use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use tokio::sync::mpsc;

use crate::event::Event;
use crate::fs::listing::NameFilter;

/// Default debounce interval in milliseconds.
pub const DEFAULT_WATCH_DEBOUNCE_MS: u64 = 300;

/// Watches the currently displayed directory and asks for a re-list when
/// one of its visible children changes.
pub struct DirWatcher {
    /// Directory currently watched, shared with the debouncer callback.
    current: Arc<Mutex<Option<PathBuf>>>,
    /// Handle to the debouncer (dropped to stop watching).
    debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
}

impl DirWatcher {
    /// Create a watcher. Nothing is watched until [`DirWatcher::watch`].
    ///
    /// Changes are debounced by `debounce_duration`; each burst produces one
    /// `Event::FsChange` carrying the watched directory.
    pub fn new(
        debounce_duration: Duration,
        filter: NameFilter,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> notify::Result<Self> {
        let current: Arc<Mutex<Option<PathBuf>>> = Arc::new(Mutex::new(None));
        let current_cb = current.clone();

        let debouncer = new_debouncer(
            debounce_duration,
            move |result: Result<Vec<notify_debouncer_mini::DebouncedEvent>, notify::Error>| {
                let Ok(events) = result else {
                    // Watcher errors are non-fatal
                    return;
                };
                let Some(dir) = current_cb.lock().ok().and_then(|g| g.clone()) else {
                    return;
                };
                let paths: Vec<PathBuf> = events
                    .iter()
                    .filter(|e| e.kind == DebouncedEventKind::Any)
                    .map(|e| e.path.clone())
                    .collect();
                if has_visible_change(&dir, &paths, &filter) {
                    let _ = event_tx.send(Event::FsChange(dir));
                }
            },
        )?;

        Ok(Self { current, debouncer })
    }

    /// Switch the watch to `dir`, dropping the previous one.
    pub fn watch(&mut self, dir: &Path) -> notify::Result<()> {
        let previous = self.current.lock().ok().and_then(|mut g| g.take());
        if let Some(previous) = previous {
            let _ = self.debouncer.watcher().unwatch(&previous);
        }
        self.debouncer
            .watcher()
            .watch(dir, notify::RecursiveMode::NonRecursive)?;
        if let Ok(mut guard) = self.current.lock() {
            *guard = Some(dir.to_path_buf());
        }
        tracing::debug!(dir = %dir.display(), "watching directory");
        Ok(())
    }

    pub fn watched(&self) -> Option<PathBuf> {
        self.current.lock().ok().and_then(|g| g.clone())
    }
}

/// Whether any changed path is `dir` itself or a visible direct child of it.
pub fn has_visible_change(dir: &Path, paths: &[PathBuf], filter: &NameFilter) -> bool {
    paths.iter().any(|p| {
        if p == dir {
            return true;
        }
        if p.parent() != Some(dir) {
            return false;
        }
        p.file_name()
            .map(|n| filter.is_visible(&n.to_string_lossy()))
            .unwrap_or(false)
    })
}
