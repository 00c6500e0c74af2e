use std::path::{Path, PathBuf};

use crate::fs::entry::Entry;

/// Multi-select state: the chosen paths and their aggregate size.
///
/// The size is recomputed against the currently displayed list on every
/// membership change. Paths that are not in that list count as 0 bytes but
/// stay selected until cleared.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    paths: Vec<PathBuf>,
    size: u64,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter multi-select with a single entry (long press).
    pub fn begin(&mut self, entry: &Entry) {
        self.paths = vec![entry.path.clone()];
        self.size = entry.size;
    }

    /// Add `path` if absent, remove it if present. Removing the last member
    /// leaves the selection inactive.
    pub fn toggle(&mut self, path: &Path, visible: &[Entry]) {
        if let Some(pos) = self.paths.iter().position(|p| p == path) {
            self.paths.remove(pos);
        } else {
            self.paths.push(path.to_path_buf());
        }

        if self.paths.is_empty() {
            self.clear();
        } else {
            self.refresh(visible);
        }
    }

    /// Select every visible entry. An empty list leaves the selection as is.
    pub fn select_all(&mut self, visible: &[Entry]) {
        if visible.is_empty() {
            return;
        }
        self.paths = visible.iter().map(|e| e.path.clone()).collect();
        self.refresh(visible);
    }

    pub fn clear(&mut self) {
        self.paths.clear();
        self.size = 0;
    }

    /// Recompute the aggregate size against `visible`.
    pub fn refresh(&mut self, visible: &[Entry]) {
        self.size = visible
            .iter()
            .filter(|e| self.contains(&e.path))
            .map(|e| e.size)
            .sum();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// Whether multi-select mode is on.
    pub fn is_active(&self) -> bool {
        !self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// The selected entries of `visible`, in display order.
    pub fn selected_entries(&self, visible: &[Entry]) -> Vec<Entry> {
        visible
            .iter()
            .filter(|e| self.contains(&e.path))
            .cloned()
            .collect()
    }
}
