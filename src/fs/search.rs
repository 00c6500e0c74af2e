use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::event::Event;
use crate::fs::entry::Entry;
use crate::fs::listing::{self, NameFilter};
use crate::fs::storage::Storage;

/// Default delay before a changed query starts a search.
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;

/// Result of a recursive search.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Matches in depth-first pre-order.
    pub entries: Vec<Entry>,
    /// Directories that could not be read and were skipped.
    pub skipped_dirs: usize,
}

/// Depth-first, case-insensitive substring search on names below `root`.
///
/// A directory's own match precedes the matches of its descendants, which
/// precede the next sibling. Unreadable directories are skipped and counted.
/// A blank query yields no results.
pub async fn search(root: &Path, query: &str, filter: &NameFilter) -> SearchOutcome {
    let mut outcome = SearchOutcome::default();
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return outcome;
    }

    let real_root = tokio::fs::canonicalize(root)
        .await
        .unwrap_or_else(|_| root.to_path_buf());
    let mut visited = HashSet::new();
    visit(
        root.to_path_buf(),
        &real_root,
        &needle,
        filter,
        &mut visited,
        &mut outcome,
    )
    .await;

    tracing::debug!(
        query = %needle,
        matches = outcome.entries.len(),
        skipped = outcome.skipped_dirs,
        "search finished"
    );
    outcome
}

fn visit<'a>(
    dir: PathBuf,
    real_root: &'a Path,
    needle: &'a str,
    filter: &'a NameFilter,
    visited: &'a mut HashSet<PathBuf>,
    outcome: &'a mut SearchOutcome,
) -> BoxFuture<'a, ()> {
    async move {
        // Symlinked directories can loop back to an ancestor or lead out of
        // the root.
        let key = tokio::fs::canonicalize(&dir).await.unwrap_or_else(|_| dir.clone());
        if !key.starts_with(real_root) {
            tracing::debug!(dir = %dir.display(), "not descending outside the root");
            return;
        }
        if !visited.insert(key) {
            return;
        }

        let children = match listing::list(&dir, filter).await {
            Ok(children) => children,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                outcome.skipped_dirs += 1;
                return;
            }
        };

        for child in children {
            let subdir = child.is_directory.then(|| child.path.clone());
            if child.name.to_lowercase().contains(needle) {
                outcome.entries.push(child);
            }
            if let Some(subdir) = subdir {
                visit(subdir, real_root, needle, filter, visited, outcome).await;
            }
        }
    }
    .boxed()
}

/// Ephemeral state of one search interaction.
#[derive(Debug, Default)]
pub struct SearchSession {
    pub query: String,
    pub results: Vec<Entry>,
    /// Whether results are being shown instead of the directory listing.
    pub active: bool,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the query. Returns the trimmed query when a search should run;
    /// a blank query exits search mode and returns `None`.
    pub fn set_query(&mut self, query: &str) -> Option<String> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            self.close();
            return None;
        }
        self.query = trimmed.to_string();
        Some(self.query.clone())
    }

    /// Install results if they belong to the current query.
    pub fn apply_results(&mut self, query: &str, results: Vec<Entry>) -> bool {
        if query != self.query {
            return false;
        }
        self.results = results;
        self.active = true;
        true
    }

    /// Discard the query and results.
    pub fn close(&mut self) {
        self.query.clear();
        self.results.clear();
        self.active = false;
    }
}

/// Restarts a delayed search every time the query changes.
///
/// Only the most recently scheduled search is kept alive; results arrive on
/// the event channel as [`Event::SearchComplete`] tagged with the generation
/// they were scheduled under.
pub struct SearchDebouncer {
    delay: Duration,
    generation: u64,
    handle: Option<JoinHandle<()>>,
    event_tx: mpsc::UnboundedSender<Event>,
}

impl SearchDebouncer {
    pub fn new(delay: Duration, event_tx: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            delay,
            generation: 0,
            handle: None,
            event_tx,
        }
    }

    /// Abort any pending search and schedule a new one for `query`.
    pub fn schedule(&mut self, storage: Storage, query: String) -> u64 {
        self.cancel();
        let generation = self.generation;
        let delay = self.delay;
        let tx = self.event_tx.clone();

        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let outcome = storage.search(&query).await;
            let _ = tx.send(Event::SearchComplete {
                generation,
                query,
                outcome,
            });
        }));
        generation
    }

    /// Abort the pending search, if any. Results already sent become stale.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    /// Whether results tagged with `generation` are still wanted.
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && self.handle.is_some()
    }
}
