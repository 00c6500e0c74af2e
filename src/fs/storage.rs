//! The sandboxed storage root.
//!
//! Every caller-supplied path goes through [`Storage::resolve`], which makes
//! it absolute under the root and rejects anything that would escape it.
//! The remaining methods are the engine's boundary operations.

use std::path::{Component, Path, PathBuf};

use crate::error::{AppError, Result};
use crate::fs::clipboard::ClipboardState;
use crate::fs::entry::Entry;
use crate::fs::listing::{self, NameFilter};
use crate::fs::operations::{self, ImportReport};
use crate::fs::search::{self, SearchOutcome};
use crate::fs::transfer::{self, PasteReport};

/// Display name used for the storage root itself.
pub const ROOT_DISPLAY_NAME: &str = "Home";

/// Default maximum `name(N)` suffix probed when pasting.
pub const DEFAULT_MAX_DUPLICATE_PROBES: usize = 50;

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    filter: NameFilter,
    max_duplicate_probes: usize,
}

impl Storage {
    /// Open a storage root. The directory must exist.
    pub fn open(root: &Path) -> Result<Self> {
        let root = root
            .canonicalize()
            .map_err(|_| AppError::InvalidPath(format!("{} does not exist", root.display())))?;
        if !root.is_dir() {
            return Err(AppError::InvalidPath(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root,
            filter: NameFilter::default(),
            max_duplicate_probes: DEFAULT_MAX_DUPLICATE_PROBES,
        })
    }

    pub fn with_filter(mut self, filter: NameFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_max_duplicate_probes(mut self, max: usize) -> Self {
        self.max_duplicate_probes = max;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn filter(&self) -> &NameFilter {
        &self.filter
    }

    /// Make `path` absolute under the root, normalizing `.` and `..`
    /// lexically. Relative paths are taken relative to the root. Paths that
    /// reach outside the root through a symlink are rejected too.
    pub fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let mut normalized = PathBuf::new();
        for component in joined.components() {
            match component {
                Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                    normalized.push(component)
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(AppError::OutsideRoot(path.to_path_buf()));
                    }
                }
            }
        }

        if !normalized.starts_with(&self.root) {
            return Err(AppError::OutsideRoot(path.to_path_buf()));
        }
        self.check_real_location(&normalized, path)?;
        Ok(normalized)
    }

    /// Resolve symlinks on the deepest existing ancestor of `normalized` and
    /// require the result to still be under the root.
    fn check_real_location(&self, normalized: &Path, original: &Path) -> Result<()> {
        let mut current = normalized;
        loop {
            match std::fs::canonicalize(current) {
                Ok(real) if real.starts_with(&self.root) => return Ok(()),
                Ok(_) => return Err(AppError::OutsideRoot(original.to_path_buf())),
                Err(_) => match current.parent() {
                    Some(parent) => current = parent,
                    None => return Ok(()),
                },
            }
        }
    }

    /// Whether `path` is the root itself.
    pub fn is_root(&self, path: &Path) -> bool {
        self.resolve(path).map(|p| p == self.root).unwrap_or(false)
    }

    /// Parent of `dir`, never climbing above the root.
    pub fn parent_of(&self, dir: &Path) -> PathBuf {
        match self.resolve(dir) {
            Ok(resolved) if resolved != self.root => resolved
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.root.clone()),
            _ => self.root.clone(),
        }
    }

    /// Display name of a directory: its last segment, or `Home` for the root.
    pub fn folder_name(&self, dir: &Path) -> String {
        if self.is_root(dir) {
            return ROOT_DISPLAY_NAME.to_string();
        }
        dir.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| ROOT_DISPLAY_NAME.to_string())
    }

    // ── Boundary operations ─────────────────────────────────────────────

    pub async fn list_directory(&self, dir: &Path) -> Result<Vec<Entry>> {
        let dir = self.resolve(dir)?;
        listing::list(&dir, &self.filter).await
    }

    /// Stat a single path inside the root. Broken symlinks are described by
    /// the link itself.
    pub async fn entry_at(&self, path: &Path) -> Result<Entry> {
        let path = self.resolve(path)?;
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) => m,
            Err(_) => tokio::fs::symlink_metadata(&path)
                .await
                .map_err(|source| AppError::NotReadable {
                    path: path.clone(),
                    source,
                })?,
        };
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| AppError::InvalidPath(path.display().to_string()))?;
        let parent = path.parent().unwrap_or(&self.root);
        Ok(Entry::from_metadata(parent, &name, &metadata))
    }

    /// Search the whole root. Never fails; unreadable directories are skipped.
    pub async fn search_tree(&self, query: &str) -> Vec<Entry> {
        self.search(query).await.entries
    }

    /// Search the whole root, also reporting how many directories were skipped.
    pub async fn search(&self, query: &str) -> SearchOutcome {
        search::search(&self.root, query, &self.filter).await
    }

    /// Create `name` inside `parent`.
    pub async fn create_directory(&self, parent: &Path, name: &str) -> Result<PathBuf> {
        let name = operations::validate_name(name)?;
        let path = self.resolve(&self.resolve(parent)?.join(name))?;
        operations::create_directory(&path).await?;
        Ok(path)
    }

    pub async fn rename(&self, entry: &Entry, new_name: &str) -> Result<PathBuf> {
        let path = self.resolve(&entry.path)?;
        if path == self.root {
            return Err(AppError::InvalidPath("cannot rename the storage root".into()));
        }
        let name = operations::validate_name(new_name)?;
        if let Some(parent) = path.parent() {
            self.resolve(&parent.join(name))?;
        }
        operations::rename(&path, name).await
    }

    pub async fn delete_entry(&self, path: &Path) -> Result<()> {
        let path = self.resolve(path)?;
        if path == self.root {
            return Err(AppError::InvalidPath("cannot delete the storage root".into()));
        }
        operations::delete_entry(&path).await
    }

    pub async fn delete_many(&self, paths: &[PathBuf]) -> Result<()> {
        let mut resolved = Vec::with_capacity(paths.len());
        for path in paths {
            let path = self.resolve(path)?;
            if path == self.root {
                return Err(AppError::InvalidPath("cannot delete the storage root".into()));
            }
            resolved.push(path);
        }
        operations::delete_many(&resolved).await
    }

    /// Paste the staged clipboard into `destination`, clearing it on success.
    pub async fn paste_transfer(
        &self,
        clipboard: &mut ClipboardState,
        destination: &Path,
    ) -> Result<PasteReport> {
        let destination = self.resolve(destination)?;
        for item in &clipboard.items {
            self.resolve(&item.path)?;
        }
        transfer::paste(clipboard, &destination, self.max_duplicate_probes).await
    }

    /// Copy external files into `destination` (which must be inside the root).
    pub async fn import_files(&self, sources: &[PathBuf], destination: &Path) -> Result<ImportReport> {
        let destination = self.resolve(destination)?;
        operations::import_files(sources, &destination).await
    }
}
