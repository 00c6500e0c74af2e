//! Executing a staged copy/move against a destination directory.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::fs::clipboard::{ClipboardState, TransferAction};
use crate::fs::entry::Entry;
use crate::fs::operations::{copy_path, move_path, path_exists};

/// Outcome of a successful paste.
#[derive(Debug, Clone)]
pub struct PasteReport {
    pub action: TransferAction,
    /// Final path of every transferred entry, in clipboard order.
    pub created: Vec<PathBuf>,
    /// Directory that received the entries and should be re-listed.
    pub destination: PathBuf,
}

/// Strip one trailing `(<digits>)` decoration from `base`.
pub fn strip_duplicate_suffix(base: &str) -> &str {
    let Some(inner) = base.strip_suffix(')') else {
        return base;
    };
    match inner.rfind('(') {
        Some(open) => {
            let digits = &inner[open + 1..];
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                &base[..open]
            } else {
                base
            }
        }
        None => base,
    }
}

/// Split a name into the part that receives the `(N)` suffix and the
/// extension that is re-appended after it. Directories and names without a
/// `.` (or with only a leading one) have no extension.
pub fn split_name(name: &str, is_directory: bool) -> (&str, Option<&str>) {
    if is_directory {
        return (name, None);
    }
    match name.rfind('.') {
        Some(dot) if dot > 0 => (&name[..dot], Some(&name[dot + 1..])),
        _ => (name, None),
    }
}

/// Candidate name for probe `index`: `base`, `base(1)`, `base(2)`, ...
pub fn candidate_name(base: &str, extension: Option<&str>, index: usize) -> String {
    let mut name = base.to_string();
    if index > 0 {
        name.push_str(&format!("({})", index));
    }
    if let Some(ext) = extension {
        name.push('.');
        name.push_str(ext);
    }
    name
}

/// Find the first unused destination path for `entry` inside `dest_dir`.
///
/// Probes suffixes `0..=max_probes`; if all are taken the paste must abort
/// with `TooManyDuplicates`. A base that is nothing but a `(N)` decoration
/// is kept as is.
pub async fn resolve_destination(entry: &Entry, dest_dir: &Path, max_probes: usize) -> Result<PathBuf> {
    let (base, extension) = split_name(&entry.name, entry.is_directory);
    let stripped = strip_duplicate_suffix(base);
    let base = if stripped.is_empty() { base } else { stripped };

    for index in 0..=max_probes {
        let candidate = dest_dir.join(candidate_name(base, extension, index));
        if !path_exists(&candidate).await? {
            tracing::debug!(name = %entry.name, probes = index + 1, "resolved destination");
            return Ok(candidate);
        }
    }
    Err(AppError::TooManyDuplicates(entry.name.clone()))
}

/// Whether `destination` is `source_dir` or one of its descendants, either
/// as written or once symlinks are resolved.
pub async fn is_self_containing(source_dir: &Path, destination: &Path) -> bool {
    if destination.starts_with(source_dir) {
        return true;
    }
    match (
        tokio::fs::canonicalize(source_dir).await,
        tokio::fs::canonicalize(destination).await,
    ) {
        (Ok(source_real), Ok(dest_real)) => dest_real.starts_with(source_real),
        _ => false,
    }
}

/// Transfer every staged entry into `destination`, one at a time, in order.
///
/// The first failure aborts the remaining queue; entries already transferred
/// stay where they are and the clipboard is left intact. On success the
/// clipboard is cleared.
pub async fn paste(
    clipboard: &mut ClipboardState,
    destination: &Path,
    max_probes: usize,
) -> Result<PasteReport> {
    let Some(action) = clipboard.action.filter(|_| !clipboard.items.is_empty()) else {
        return Err(AppError::ClipboardEmpty);
    };

    let mut created = Vec::with_capacity(clipboard.items.len());
    for item in &clipboard.items {
        if let Err(e) = transfer_one(item, action, destination, max_probes, &mut created).await {
            tracing::warn!(
                item = %item.path.display(),
                transferred = created.len(),
                error = %e,
                "paste aborted"
            );
            return Err(e);
        }
    }

    tracing::info!(
        action = action.verb(),
        count = created.len(),
        dest = %destination.display(),
        "paste finished"
    );
    clipboard.clear();
    Ok(PasteReport {
        action,
        created,
        destination: destination.to_path_buf(),
    })
}

async fn transfer_one(
    item: &Entry,
    action: TransferAction,
    destination: &Path,
    max_probes: usize,
    created: &mut Vec<PathBuf>,
) -> Result<()> {
    if action == TransferAction::Move
        && item.is_directory
        && is_self_containing(&item.path, destination).await
    {
        return Err(AppError::SelfContainment {
            source_dir: item.path.clone(),
            destination: destination.to_path_buf(),
        });
    }

    let target = resolve_destination(item, destination, max_probes).await?;
    match action {
        TransferAction::Copy => copy_path(&item.path, &target).await?,
        TransferAction::Move => move_path(&item.path, &target).await?,
    }
    created.push(target);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::storage::DEFAULT_MAX_DUPLICATE_PROBES;
    use std::fs;
    use tempfile::TempDir;

    fn snapshot(path: &Path) -> Entry {
        let meta = fs::metadata(path).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        Entry::from_metadata(path.parent().unwrap(), &name, &meta)
    }

    #[test]
    fn strips_numeric_suffix_only() {
        assert_eq!(strip_duplicate_suffix("a(3)"), "a");
        assert_eq!(strip_duplicate_suffix("a(12)"), "a");
        assert_eq!(strip_duplicate_suffix("a(x)"), "a(x)");
        assert_eq!(strip_duplicate_suffix("a()"), "a()");
        assert_eq!(strip_duplicate_suffix("a"), "a");
        assert_eq!(strip_duplicate_suffix("(7)"), "");
    }

    #[test]
    fn split_keeps_extension_for_files() {
        assert_eq!(split_name("a.txt", false), ("a", Some("txt")));
        assert_eq!(split_name("a.tar.gz", false), ("a.tar", Some("gz")));
        assert_eq!(split_name("photos.2024", true), ("photos.2024", None));
        assert_eq!(split_name("Makefile", false), ("Makefile", None));
        assert_eq!(split_name(".env", false), (".env", None));
    }

    #[test]
    fn candidate_names() {
        assert_eq!(candidate_name("a", Some("txt"), 0), "a.txt");
        assert_eq!(candidate_name("a", Some("txt"), 2), "a(2).txt");
        assert_eq!(candidate_name("dir", None, 1), "dir(1)");
    }

    #[tokio::test]
    async fn self_containment_is_component_based() {
        assert!(is_self_containing(Path::new("/r/foo"), Path::new("/r/foo")).await);
        assert!(is_self_containing(Path::new("/r/foo"), Path::new("/r/foo/bar")).await);
        assert!(!is_self_containing(Path::new("/r/foo"), Path::new("/r/foobar")).await);
        assert!(!is_self_containing(Path::new("/r/foo"), Path::new("/r")).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn move_into_descendant_through_symlink_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let foo = tmp.path().join("foo");
        fs::create_dir_all(foo.join("bar")).unwrap();
        let link = tmp.path().join("link");
        std::os::unix::fs::symlink(&foo, &link).unwrap();

        let mut cb = ClipboardState::new();
        cb.stage(vec![snapshot(&foo)], TransferAction::Move);
        let err = paste(&mut cb, &link.join("bar"), 50).await.unwrap_err();
        assert!(matches!(err, AppError::SelfContainment { .. }));
        assert!(foo.join("bar").is_dir());
        assert_eq!(fs::read_dir(foo.join("bar")).unwrap().count(), 0);
        assert!(!cb.is_empty());
    }

    #[tokio::test]
    async fn copy_collision_appends_incrementing_suffix() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("a.txt");
        fs::write(&src, "data").unwrap();
        let entry = snapshot(&src);

        let mut cb = ClipboardState::new();
        cb.stage(vec![entry.clone()], TransferAction::Copy);
        let report = paste(&mut cb, tmp.path(), 50).await.unwrap();
        assert_eq!(report.created, vec![tmp.path().join("a(1).txt")]);
        assert!(cb.is_empty());

        cb.stage(vec![entry], TransferAction::Copy);
        let report = paste(&mut cb, tmp.path(), 50).await.unwrap();
        assert_eq!(report.created, vec![tmp.path().join("a(2).txt")]);
        assert_eq!(fs::read_to_string(tmp.path().join("a(2).txt")).unwrap(), "data");
    }

    #[tokio::test]
    async fn decorated_name_probes_from_base() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("dest");
        fs::create_dir(&dest).unwrap();
        let src = tmp.path().join("a(4).txt");
        fs::write(&src, "").unwrap();

        let mut cb = ClipboardState::new();
        cb.stage(vec![snapshot(&src)], TransferAction::Copy);
        let report = paste(&mut cb, &dest, 50).await.unwrap();
        assert_eq!(report.created, vec![dest.join("a.txt")]);
    }

    #[tokio::test]
    async fn bare_numeric_name_keeps_its_base() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("dest");
        fs::create_dir(&dest).unwrap();
        let src = tmp.path().join("(7).txt");
        fs::write(&src, "seven").unwrap();

        let mut cb = ClipboardState::new();
        cb.stage(vec![snapshot(&src)], TransferAction::Copy);
        let report = paste(&mut cb, &dest, 50).await.unwrap();
        assert_eq!(report.created, vec![dest.join("(7).txt")]);

        cb.stage(vec![snapshot(&src)], TransferAction::Copy);
        let report = paste(&mut cb, &dest, 50).await.unwrap();
        assert_eq!(report.created, vec![dest.join("(7)(1).txt")]);
        assert!(!dest.join(".txt").exists());
    }

    #[tokio::test]
    async fn default_probe_limit_allows_fifty_suffixes() {
        let tmp = TempDir::new().unwrap();
        let src_dir = tmp.path().join("src");
        fs::create_dir(&src_dir).unwrap();
        let src = src_dir.join("a.txt");
        fs::write(&src, "new").unwrap();
        let dest = tmp.path().join("dest");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("a.txt"), "").unwrap();
        for index in 1..=DEFAULT_MAX_DUPLICATE_PROBES {
            fs::write(dest.join(format!("a({}).txt", index)), "").unwrap();
        }

        let mut cb = ClipboardState::new();
        cb.stage(vec![snapshot(&src)], TransferAction::Copy);
        let err = paste(&mut cb, &dest, DEFAULT_MAX_DUPLICATE_PROBES)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::TooManyDuplicates(_)));
        assert!(!dest.join("a(51).txt").exists());

        fs::remove_file(dest.join("a(50).txt")).unwrap();
        let report = paste(&mut cb, &dest, DEFAULT_MAX_DUPLICATE_PROBES)
            .await
            .unwrap();
        assert_eq!(report.created, vec![dest.join("a(50).txt")]);
        assert_eq!(fs::read_to_string(dest.join("a(50).txt")).unwrap(), "new");
    }

    #[tokio::test]
    async fn directory_collision_gets_suffix() {
        let tmp = TempDir::new().unwrap();
        let photos = tmp.path().join("photos");
        fs::create_dir(&photos).unwrap();
        fs::write(photos.join("p.jpg"), "").unwrap();

        let mut cb = ClipboardState::new();
        cb.stage(vec![snapshot(&photos)], TransferAction::Copy);
        let report = paste(&mut cb, tmp.path(), 50).await.unwrap();
        assert_eq!(report.created, vec![tmp.path().join("photos(1)")]);
        assert!(tmp.path().join("photos(1)").join("p.jpg").exists());
    }

    #[tokio::test]
    async fn too_many_duplicates_aborts() {
        let tmp = TempDir::new().unwrap();
        for name in ["a.txt", "a(1).txt", "a(2).txt"] {
            fs::write(tmp.path().join(name), "").unwrap();
        }
        let mut cb = ClipboardState::new();
        cb.stage(vec![snapshot(&tmp.path().join("a.txt"))], TransferAction::Copy);

        let err = paste(&mut cb, tmp.path(), 2).await.unwrap_err();
        assert!(matches!(err, AppError::TooManyDuplicates(_)));
        assert!(!cb.is_empty());
        assert!(!tmp.path().join("a(3).txt").exists());
    }

    #[tokio::test]
    async fn move_into_own_descendant_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let foo = tmp.path().join("foo");
        let bar = foo.join("bar");
        fs::create_dir_all(&bar).unwrap();

        let mut cb = ClipboardState::new();
        cb.stage(vec![snapshot(&foo)], TransferAction::Move);
        let err = paste(&mut cb, &bar, 50).await.unwrap_err();
        assert!(matches!(err, AppError::SelfContainment { .. }));
        assert!(foo.is_dir());
        assert!(bar.is_dir());
        assert_eq!(fs::read_dir(&bar).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn failure_keeps_earlier_transfers() {
        let tmp = TempDir::new().unwrap();
        let note = tmp.path().join("note.txt");
        fs::write(&note, "n").unwrap();
        let foo = tmp.path().join("foo");
        fs::create_dir_all(foo.join("bar")).unwrap();
        let last = tmp.path().join("last.txt");
        fs::write(&last, "l").unwrap();

        let mut cb = ClipboardState::new();
        cb.stage(
            vec![snapshot(&note), snapshot(&foo), snapshot(&last)],
            TransferAction::Move,
        );
        let dest = foo.join("bar");
        let err = paste(&mut cb, &dest, 50).await.unwrap_err();
        assert!(matches!(err, AppError::SelfContainment { .. }));

        assert!(dest.join("note.txt").exists());
        assert!(!note.exists());
        // Queue stopped at the failing entry
        assert!(last.exists());
        assert!(!dest.join("last.txt").exists());
        assert_eq!(cb.len(), 3);
    }

    #[tokio::test]
    async fn move_relocates_and_sequential_probing_sees_earlier_items() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("one").join("a.txt");
        let b = tmp.path().join("two").join("a.txt");
        fs::create_dir_all(a.parent().unwrap()).unwrap();
        fs::create_dir_all(b.parent().unwrap()).unwrap();
        fs::write(&a, "1").unwrap();
        fs::write(&b, "2").unwrap();
        let dest = tmp.path().join("dest");
        fs::create_dir(&dest).unwrap();

        let mut cb = ClipboardState::new();
        cb.stage(vec![snapshot(&a), snapshot(&b)], TransferAction::Move);
        let report = paste(&mut cb, &dest, 50).await.unwrap();

        assert_eq!(report.created, vec![dest.join("a.txt"), dest.join("a(1).txt")]);
        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "1");
        assert_eq!(fs::read_to_string(dest.join("a(1).txt")).unwrap(), "2");
        assert!(!a.exists());
        assert!(!b.exists());
    }

    #[tokio::test]
    async fn missing_source_surfaces_io_error() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("ghost.txt");
        fs::write(&src, "").unwrap();
        let entry = snapshot(&src);
        fs::remove_file(&src).unwrap();
        let dest = tmp.path().join("dest");
        fs::create_dir(&dest).unwrap();

        let mut cb = ClipboardState::new();
        cb.stage(vec![entry], TransferAction::Copy);
        let err = paste(&mut cb, &dest, 50).await.unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }

    #[tokio::test]
    async fn empty_clipboard_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let mut cb = ClipboardState::new();
        assert!(matches!(
            paste(&mut cb, tmp.path(), 50).await,
            Err(AppError::ClipboardEmpty)
        ));
    }
}
