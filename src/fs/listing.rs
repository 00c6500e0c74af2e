use std::path::Path;

use futures_util::future::join_all;
use tokio::fs;

use crate::error::{AppError, Result};
use crate::fs::entry::Entry;

/// Reserved bookkeeping names the host storage layer keeps in the root.
pub const DEFAULT_RESERVED_NAMES: &[&str] = &["expo-file-system"];

/// Reserved bookkeeping name prefixes.
pub const DEFAULT_RESERVED_PREFIXES: &[&str] = &["RCTAsyncLocalStorage"];

/// Decides which directory children are visible to listing and search.
///
/// Hidden names (leading `.`) are always excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFilter {
    pub reserved_names: Vec<String>,
    pub reserved_prefixes: Vec<String>,
}

impl Default for NameFilter {
    fn default() -> Self {
        Self {
            reserved_names: DEFAULT_RESERVED_NAMES.iter().map(|s| s.to_string()).collect(),
            reserved_prefixes: DEFAULT_RESERVED_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl NameFilter {
    pub fn new(reserved_names: Vec<String>, reserved_prefixes: Vec<String>) -> Self {
        Self {
            reserved_names,
            reserved_prefixes,
        }
    }

    /// Whether a child with this name should be shown.
    pub fn is_visible(&self, name: &str) -> bool {
        if name.starts_with('.') {
            return false;
        }
        if self.reserved_names.iter().any(|r| r == name) {
            return false;
        }
        !self.reserved_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }
}

/// List the direct children of `dir` with their metadata.
///
/// Child metadata is fetched concurrently and the call returns only once all
/// of it is in. Any failure, whether reading the directory or stat-ing a
/// child, yields `NotReadable` and no partial list.
pub async fn list(dir: &Path, filter: &NameFilter) -> Result<Vec<Entry>> {
    let not_readable = |source: std::io::Error| AppError::NotReadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut read_dir = fs::read_dir(dir).await.map_err(not_readable)?;
    let mut names = Vec::new();
    while let Some(child) = read_dir.next_entry().await.map_err(not_readable)? {
        let name = child.file_name().to_string_lossy().to_string();
        if filter.is_visible(&name) {
            names.push(name);
        }
    }

    let stats = join_all(names.iter().map(|name| child_metadata(dir, name))).await;

    let mut entries = Vec::with_capacity(names.len());
    for (name, meta) in names.iter().zip(stats) {
        let meta = meta.map_err(not_readable)?;
        entries.push(Entry::from_metadata(dir, name, &meta));
    }

    tracing::debug!(dir = %dir.display(), count = entries.len(), "listed directory");
    Ok(entries)
}

/// Stat a child, following symlinks. Dangling symlinks fall back to the
/// link's own metadata so they still show up as files.
async fn child_metadata(dir: &Path, name: &str) -> std::io::Result<std::fs::Metadata> {
    let path = dir.join(name);
    match fs::metadata(&path).await {
        Ok(meta) => Ok(meta),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => fs::symlink_metadata(&path).await,
        Err(e) => Err(e),
    }
}
