use std::fs::Metadata;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::time::UNIX_EPOCH;

use serde::Serialize;

/// A snapshot of one filesystem object inside the storage root.
///
/// Entries are values: a changed object is represented by re-listing, never
/// by mutating an existing `Entry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    /// Parent directory joined with `name`.
    pub path: PathBuf,
    pub is_directory: bool,
    /// Lowercase extension; empty for directories and names without a `.`.
    pub extension: String,
    /// Size in bytes, always 0 for directories.
    pub size: u64,
    /// Modification time as unix seconds (0 when unavailable).
    pub modification_time: i64,
}

impl Entry {
    /// Build an entry for `name` inside `parent` from already-fetched metadata.
    pub fn from_metadata(parent: &Path, name: &str, metadata: &Metadata) -> Self {
        let is_directory = metadata.is_dir();
        let modification_time = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        Self {
            name: name.to_string(),
            path: parent.join(name),
            is_directory,
            extension: extension_of(name, is_directory),
            size: if is_directory { 0 } else { metadata.len() },
            modification_time,
        }
    }

    /// The path as a string, with a trailing separator iff this is a directory.
    pub fn uri(&self) -> String {
        let mut s = self.path.to_string_lossy().to_string();
        if self.is_directory && !s.ends_with(MAIN_SEPARATOR) {
            s.push(MAIN_SEPARATOR);
        }
        s
    }

    /// Whether the entry can be handed to an external viewer.
    pub fn can_open(&self) -> bool {
        !self.is_directory
    }

    /// Whether the entry can be handed to a share target.
    pub fn can_share(&self) -> bool {
        !self.is_directory
    }

    pub fn can_rename(&self) -> bool {
        true
    }

    pub fn can_delete(&self) -> bool {
        true
    }
}

/// Derive the lowercase extension from the last `.`-delimited segment.
pub fn extension_of(name: &str, is_directory: bool) -> String {
    if is_directory || !name.contains('.') {
        return String::new();
    }
    name.rsplit('.')
        .next()
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn extension_is_lowercased_last_segment() {
        assert_eq!(extension_of("Report.PDF", false), "pdf");
        assert_eq!(extension_of("archive.tar.GZ", false), "gz");
    }

    #[test]
    fn extension_empty_for_directories_and_plain_names() {
        assert_eq!(extension_of("photos.2024", true), "");
        assert_eq!(extension_of("Makefile", false), "");
    }

    #[test]
    fn trailing_dot_gives_empty_extension() {
        assert_eq!(extension_of("weird.", false), "");
    }

    #[test]
    fn from_metadata_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.TXT"), "hello").unwrap();
        let meta = fs::metadata(tmp.path().join("notes.TXT")).unwrap();

        let entry = Entry::from_metadata(tmp.path(), "notes.TXT", &meta);
        assert_eq!(entry.name, "notes.TXT");
        assert_eq!(entry.path, tmp.path().join("notes.TXT"));
        assert!(!entry.is_directory);
        assert_eq!(entry.extension, "txt");
        assert_eq!(entry.size, 5);
        assert!(entry.modification_time > 0);
        assert!(!entry.uri().ends_with(MAIN_SEPARATOR));
    }

    #[test]
    fn from_metadata_directory_has_zero_size_and_trailing_separator() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("docs.old")).unwrap();
        let meta = fs::metadata(tmp.path().join("docs.old")).unwrap();

        let entry = Entry::from_metadata(tmp.path(), "docs.old", &meta);
        assert!(entry.is_directory);
        assert_eq!(entry.size, 0);
        assert_eq!(entry.extension, "");
        assert!(entry.uri().ends_with(MAIN_SEPARATOR));
    }

    #[test]
    fn directories_cannot_be_opened_or_shared() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("d")).unwrap();
        let meta = fs::metadata(tmp.path().join("d")).unwrap();
        let dir = Entry::from_metadata(tmp.path(), "d", &meta);
        assert!(!dir.can_open());
        assert!(!dir.can_share());
        assert!(dir.can_rename());
        assert!(dir.can_delete());
    }
}
