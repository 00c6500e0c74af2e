use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use futures_util::future::join_all;

use crate::error::{AppError, Result};

/// Trim and validate a user-supplied entry name.
///
/// Rejects empty names, `.`/`..` and anything containing a path separator.
pub fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains('/')
        || trimmed.contains('\\')
    {
        return Err(AppError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}

/// Whether anything (file, directory, dangling symlink) occupies `path`.
pub async fn path_exists(path: &Path) -> io::Result<bool> {
    match tokio::fs::symlink_metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Create a directory, including missing intermediate segments.
///
/// Fails with `AlreadyExists` if anything is already at `path`.
pub async fn create_directory(path: &Path) -> Result<()> {
    if path_exists(path).await? {
        return Err(AppError::AlreadyExists(path.to_path_buf()));
    }
    tokio::fs::create_dir_all(path).await?;
    tracing::info!(path = %path.display(), "created directory");
    Ok(())
}

/// Rename `path` to a sibling called `new_name`. Returns the new path.
pub async fn rename(path: &Path, new_name: &str) -> Result<PathBuf> {
    let new_name = validate_name(new_name)?;
    let parent = path
        .parent()
        .ok_or_else(|| AppError::InvalidPath(path.display().to_string()))?;
    let target = parent.join(new_name);

    if path_exists(&target).await? {
        return Err(AppError::AlreadyExists(target));
    }
    move_path(path, &target).await?;
    tracing::info!(from = %path.display(), to = %target.display(), "renamed");
    Ok(target)
}

/// Delete a file or directory. Directories are removed recursively.
///
/// Idempotent: an absent path is not an error.
pub async fn delete_entry(path: &Path) -> Result<()> {
    let meta = match tokio::fs::symlink_metadata(path).await {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let result = if meta.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    match result {
        Ok(()) => {
            tracing::info!(path = %path.display(), "deleted");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Delete every path concurrently.
///
/// All deletions are attempted; any failure is reported as `PartialFailure`
/// without saying which ones succeeded.
pub async fn delete_many(paths: &[PathBuf]) -> Result<()> {
    let results = join_all(paths.iter().map(|p| delete_entry(p))).await;
    let failed = results
        .iter()
        .zip(paths)
        .filter_map(|(r, p)| r.as_ref().err().map(|e| (p, e)))
        .inspect(|(p, e)| tracing::warn!(path = %p.display(), error = %e, "delete failed"))
        .count();

    if failed > 0 {
        return Err(AppError::PartialFailure {
            failed,
            total: paths.len(),
        });
    }
    Ok(())
}

/// Outcome of importing external files.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Paths created inside the destination.
    pub imported: Vec<PathBuf>,
    /// Names skipped because they already exist in the destination.
    pub skipped: Vec<String>,
}

/// Copy external `sources` into `dest_dir`, skipping names that already exist.
pub async fn import_files(sources: &[PathBuf], dest_dir: &Path) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for src in sources {
        let name = src
            .file_name()
            .ok_or_else(|| AppError::InvalidPath(src.display().to_string()))?;
        let dest = dest_dir.join(name);
        if path_exists(&dest).await? {
            report.skipped.push(name.to_string_lossy().to_string());
            continue;
        }
        copy_path(src, &dest).await?;
        report.imported.push(dest);
    }

    tracing::info!(
        imported = report.imported.len(),
        skipped = report.skipped.len(),
        dest = %dest_dir.display(),
        "import finished"
    );
    Ok(report)
}

/// Copy a file or directory tree to `dest` on the blocking pool.
pub async fn copy_path(src: &Path, dest: &Path) -> Result<()> {
    let src = src.to_path_buf();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || copy_tree(&src, &dest))
        .await
        .map_err(io::Error::other)?
}

/// `rename` error code for source and destination on different devices.
#[cfg(unix)]
const CROSS_DEVICE: i32 = 18; // EXDEV
#[cfg(windows)]
const CROSS_DEVICE: i32 = 17; // ERROR_NOT_SAME_DEVICE

fn is_cross_device(e: &io::Error) -> bool {
    #[cfg(any(unix, windows))]
    {
        e.raw_os_error() == Some(CROSS_DEVICE)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = e;
        false
    }
}

/// Move a file or directory to `dest`.
///
/// Uses `rename` first (fast, same-device). Only a cross-device failure
/// falls back to copy + delete; any other rename error is returned.
pub async fn move_path(src: &Path, dest: &Path) -> Result<()> {
    match tokio::fs::rename(src, dest).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            tracing::debug!(error = %e, "rename crossed devices, falling back to copy + delete");
            copy_path(src, dest).await?;
            delete_entry(src).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Copy `src` to `dest`. Directories are copied recursively.
///
/// The source listing of each directory is read before anything is written
/// to it, and `dest` itself is never descended into, so copying a directory
/// into one of its own descendants terminates. Symlinks below `src` are
/// skipped.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    if fs::metadata(src)?.is_dir() {
        copy_dir_recursive(src, dest, dest)
    } else {
        fs::copy(src, dest)?;
        Ok(())
    }
}

fn copy_dir_recursive(src: &Path, dest: &Path, top_dest: &Path) -> Result<()> {
    let children: Vec<(PathBuf, fs::FileType)> = fs::read_dir(src)?
        .map(|entry| entry.and_then(|e| Ok((e.path(), e.file_type()?))))
        .collect::<io::Result<_>>()?;

    fs::create_dir_all(dest)?;
    for (src_path, file_type) in children {
        if src_path == top_dest {
            continue;
        }
        let Some(name) = src_path.file_name() else {
            continue;
        };
        let dest_path = dest.join(name);
        if file_type.is_symlink() {
            tracing::debug!(path = %src_path.display(), "skipping symlink");
        } else if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dest_path, top_dest)?;
        } else {
            fs::copy(&src_path, &dest_path)?;
        }
    }
    Ok(())
}
