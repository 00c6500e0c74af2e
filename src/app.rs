use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::filetype::{self, FileCategory};
use crate::format::{format_bytes, format_timestamp};
use crate::fs::clipboard::{ClipboardState, TransferAction};
use crate::fs::entry::Entry;
use crate::fs::operations::{self, ImportReport};
use crate::fs::search::{SearchOutcome, SearchSession};
use crate::fs::selection::Selection;
use crate::fs::sort::{sort_entries, SortConfig, SortKey};
use crate::fs::storage::Storage;
use crate::fs::transfer::PasteReport;

/// Human-readable summary of one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryDetails {
    pub name: String,
    /// "Folder" or "File".
    pub kind: &'static str,
    pub size: String,
    pub modified: String,
    pub path: String,
    pub mime_type: &'static str,
    pub category: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
}

impl EntryDetails {
    pub fn from_entry(entry: &Entry) -> Self {
        let category = FileCategory::from_extension(&entry.extension);
        Self {
            name: entry.name.clone(),
            kind: if entry.is_directory { "Folder" } else { "File" },
            size: format_bytes(entry.size, 2),
            modified: format_timestamp(entry.modification_time),
            path: entry.uri(),
            mime_type: if entry.is_directory {
                filetype::GENERIC_MIME
            } else {
                filetype::mime_type(&entry.extension)
            },
            category: if entry.is_directory {
                "folder"
            } else {
                category.label()
            },
            icon: if entry.is_directory {
                filetype::FOLDER_ICON
            } else {
                category.icon()
            },
            color: if entry.is_directory {
                filetype::FOLDER_COLOR
            } else {
                category.color()
            },
        }
    }
}

/// Session state: the directory being viewed plus selection, clipboard and
/// search records. Each record is owned independently so one can be reset
/// without touching the others.
pub struct App {
    pub storage: Storage,
    pub current_dir: PathBuf,
    /// Unsorted children of `current_dir` as last listed.
    pub listing: Vec<Entry>,
    pub sort: SortConfig,
    pub selection: Selection,
    pub clipboard: ClipboardState,
    pub search: SearchSession,
    pub should_quit: bool,
}

impl App {
    /// Create a session positioned at the storage root. Call
    /// [`App::refresh`] to populate the listing.
    pub fn new(storage: Storage, sort: SortConfig) -> Self {
        let current_dir = storage.root().to_path_buf();
        Self {
            storage,
            current_dir,
            listing: Vec::new(),
            sort,
            selection: Selection::new(),
            clipboard: ClipboardState::new(),
            search: SearchSession::new(),
            should_quit: false,
        }
    }

    /// Re-list the current directory and drop search results that vanished.
    pub async fn refresh(&mut self) -> Result<()> {
        let listing = self.storage.list_directory(&self.current_dir).await;
        match listing {
            Ok(entries) => self.listing = entries,
            Err(e) => {
                self.listing.clear();
                self.selection.refresh(&[]);
                return Err(e);
            }
        }

        if self.search.active {
            let mut kept = Vec::with_capacity(self.search.results.len());
            for entry in self.search.results.drain(..) {
                if operations::path_exists(&entry.path).await.unwrap_or(false) {
                    kept.push(entry);
                }
            }
            self.search.results = kept;
        }

        let visible = self.visible_entries();
        self.selection.refresh(&visible);
        Ok(())
    }

    /// Re-list after a mutation. A listing failure is logged and leaves the
    /// listing empty; it never replaces the mutation's own result.
    async fn relist(&mut self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!(dir = %self.current_dir.display(), error = %e, "re-listing failed");
        }
    }

    /// Entries currently displayed, sorted: search results while a search is
    /// showing, otherwise the directory listing.
    pub fn visible_entries(&self) -> Vec<Entry> {
        if self.search.active {
            sort_entries(&self.search.results, self.sort)
        } else {
            sort_entries(&self.listing, self.sort)
        }
    }

    /// Look up a displayed entry by name.
    pub fn find(&self, name: &str) -> Result<Entry> {
        let name = name.trim();
        self.visible_entries()
            .into_iter()
            .find(|e| e.name == name)
            .ok_or_else(|| AppError::NotFound(name.to_string()))
    }

    pub fn folder_name(&self) -> String {
        self.storage.folder_name(&self.current_dir)
    }

    pub fn is_at_root(&self) -> bool {
        self.storage.is_root(&self.current_dir)
    }

    // ── Navigation ──────────────────────────────────────────────────────

    /// Enter the named directory. Leaves search and selection behind.
    pub async fn navigate_into(&mut self, name: &str) -> Result<()> {
        let entry = self.find(name)?;
        if !entry.is_directory {
            return Err(AppError::InvalidPath(format!("'{}' is not a folder", entry.name)));
        }
        self.change_dir(entry.path).await
    }

    /// Go to the parent directory, never above the root.
    pub async fn navigate_up(&mut self) -> Result<()> {
        let parent = self.storage.parent_of(&self.current_dir);
        self.change_dir(parent).await
    }

    async fn change_dir(&mut self, dir: PathBuf) -> Result<()> {
        let previous = std::mem::replace(&mut self.current_dir, self.storage.resolve(&dir)?);
        self.search.close();
        self.selection.clear();
        if let Err(e) = self.refresh().await {
            self.current_dir = previous;
            let _ = self.refresh().await;
            return Err(e);
        }
        tracing::debug!(dir = %self.current_dir.display(), "changed directory");
        Ok(())
    }

    /// Pick a sort key; picking the active key flips the direction.
    pub fn set_sort(&mut self, key: SortKey) {
        self.sort.select_key(key);
    }

    // ── Selection ───────────────────────────────────────────────────────

    /// Start multi-select with `name`, or toggle it when already selecting.
    pub fn select(&mut self, name: &str) -> Result<()> {
        let entry = self.find(name)?;
        if self.selection.is_active() {
            let visible = self.visible_entries();
            self.selection.toggle(&entry.path, &visible);
        } else {
            self.selection.begin(&entry);
        }
        Ok(())
    }

    pub fn select_all(&mut self) {
        let visible = self.visible_entries();
        self.selection.select_all(&visible);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ── Clipboard ───────────────────────────────────────────────────────

    /// Stage `name`, or the current selection when `name` is `None`.
    /// Returns how many entries were staged. Exits multi-select.
    pub fn stage(&mut self, action: TransferAction, name: Option<&str>) -> Result<usize> {
        let items = match name {
            Some(name) => vec![self.find(name)?],
            None => self.selection.selected_entries(&self.visible_entries()),
        };
        if items.is_empty() {
            return Ok(0);
        }
        let count = items.len();
        self.clipboard.stage(items, action);
        self.selection.clear();
        tracing::debug!(count, action = action.verb(), "staged items");
        Ok(count)
    }

    /// Paste the clipboard into the current directory and re-list it,
    /// whether or not the paste succeeded.
    pub async fn paste(&mut self) -> Result<PasteReport> {
        let result = self
            .storage
            .paste_transfer(&mut self.clipboard, &self.current_dir)
            .await;
        self.relist().await;
        result
    }

    pub fn cancel_transfer(&mut self) {
        self.clipboard.clear();
    }

    // ── Mutations ───────────────────────────────────────────────────────

    pub async fn create_folder(&mut self, name: &str) -> Result<PathBuf> {
        let created = self
            .storage
            .create_directory(&self.current_dir, name)
            .await?;
        self.relist().await;
        Ok(created)
    }

    pub async fn rename(&mut self, name: &str, new_name: &str) -> Result<PathBuf> {
        let entry = self.find(name)?;
        let renamed = self.storage.rename(&entry, new_name).await?;
        self.relist().await;
        Ok(renamed)
    }

    pub async fn delete(&mut self, name: &str) -> Result<()> {
        let entry = self.find(name)?;
        let result = self.storage.delete_entry(&entry.path).await;
        self.relist().await;
        result
    }

    /// Delete every selected entry concurrently and leave multi-select.
    /// Returns how many paths were attempted.
    pub async fn delete_selected(&mut self) -> Result<usize> {
        let paths = self.selection.paths().to_vec();
        if paths.is_empty() {
            return Ok(0);
        }
        let result = self.storage.delete_many(&paths).await;
        self.selection.clear();
        self.relist().await;
        result.map(|_| paths.len())
    }

    /// Copy external files into the current directory.
    pub async fn import(&mut self, sources: &[PathBuf]) -> Result<ImportReport> {
        let result = self.storage.import_files(sources, &self.current_dir).await;
        self.relist().await;
        result
    }

    pub fn details(&self, name: &str) -> Result<EntryDetails> {
        self.find(name).map(|e| EntryDetails::from_entry(&e))
    }

    // ── Search ──────────────────────────────────────────────────────────

    /// Update the search query. Returns the query to search for, or `None`
    /// when the query was blank and search mode was left.
    pub fn set_query(&mut self, query: &str) -> Option<String> {
        let query = self.search.set_query(query);
        if query.is_none() {
            let visible = self.visible_entries();
            self.selection.refresh(&visible);
        }
        query
    }

    /// Install finished search results if they match the current query.
    pub fn apply_search(&mut self, query: &str, outcome: SearchOutcome) -> bool {
        if !self.search.apply_results(query, outcome.entries) {
            return false;
        }
        let visible = self.visible_entries();
        self.selection.refresh(&visible);
        true
    }

    pub fn close_search(&mut self) {
        self.search.close();
        let visible = self.visible_entries();
        self.selection.refresh(&visible);
    }

    /// Whether `dir` is the directory being displayed.
    pub fn is_current_dir(&self, dir: &Path) -> bool {
        self.current_dir == dir
    }

    /// Quit the application.
    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
