use std::path::PathBuf;

use thiserror::Error;

/// Application-wide result type alias.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types.
///
/// Every variant is recoverable at the call site. Nothing is retried or rolled
/// back; callers re-list to observe the true filesystem state.
#[derive(Debug, Error)]
pub enum AppError {
    /// A directory could not be enumerated (missing, permission denied, ...).
    #[error("Could not read directory {}: {source}", .path.display())]
    NotReadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Create or rename target is already occupied.
    #[error("An item already exists at {}", .0.display())]
    AlreadyExists(PathBuf),

    /// Paste could not find a free `name(N)` candidate.
    #[error("Too many duplicates of '{0}', aborting paste")]
    TooManyDuplicates(String),

    /// A directory move whose destination is the source or inside it.
    #[error("Cannot move {} into itself ({})", .source_dir.display(), .destination.display())]
    SelfContainment {
        source_dir: PathBuf,
        destination: PathBuf,
    },

    /// A batch operation had at least one failing member.
    #[error("{failed} of {total} item(s) failed")]
    PartialFailure { failed: usize, total: usize },

    /// I/O errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid path provided by the user.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Path resolves outside the storage root.
    #[error("Path is outside the storage root: {}", .0.display())]
    OutsideRoot(PathBuf),

    /// Rejected entry name (empty, contains a separator, `.` or `..`).
    #[error("Invalid name: '{0}'")]
    InvalidName(String),

    /// Paste requested with nothing staged.
    #[error("Clipboard is empty")]
    ClipboardEmpty,

    /// No entry with this name in the displayed list.
    #[error("No such item: '{0}'")]
    NotFound(String),

    /// Unparseable shell input.
    #[error("{0}")]
    InvalidCommand(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
        assert!(app_err.to_string().contains("file not found"));
    }

    #[test]
    fn invalid_path_error_display() {
        let err = AppError::InvalidPath("/nonexistent".into());
        assert_eq!(err.to_string(), "Invalid path: /nonexistent");
    }

    #[test]
    fn partial_failure_display() {
        let err = AppError::PartialFailure {
            failed: 2,
            total: 5,
        };
        assert_eq!(err.to_string(), "2 of 5 item(s) failed");
    }

    #[test]
    fn too_many_duplicates_display() {
        let err = AppError::TooManyDuplicates("a.txt".into());
        assert_eq!(err.to_string(), "Too many duplicates of 'a.txt', aborting paste");
    }

    #[test]
    fn not_readable_keeps_source() {
        let err = AppError::NotReadable {
            path: PathBuf::from("/missing"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().starts_with("Could not read directory /missing"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
