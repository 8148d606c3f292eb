//! File deletion for committed staging.
//!
//! # Overview
//!
//! Two deletion methods are available:
//! - [`DeleteMethod::Permanent`]: `std::fs::remove_file`, cannot be undone
//! - [`DeleteMethod::Trash`]: move to the system recycle bin via `trash`
//!
//! [`delete_batch`] attempts every path and never stops at the first
//! failure; each failure is logged and reported with its path and reason.
//!
//! # Example
//!
//! ```no_run
//! use vidupe::actions::delete::{delete_batch, DeleteMethod, NoProgress};
//! use std::path::PathBuf;
//!
//! let paths = vec![PathBuf::from("/videos/copy.mp4")];
//! let result = delete_batch(&paths, DeleteMethod::Trash, &NoProgress);
//! println!("{}", result.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed { path: PathBuf, message: String },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_metadata(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// How committed files are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMethod {
    /// Remove from disk immediately.
    #[default]
    Permanent,
    /// Move to the system recycle bin.
    Trash,
}

impl std::fmt::Display for DeleteMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Permanent => write!(f, "permanent"),
            Self::Trash => write!(f, "trash"),
        }
    }
}

/// Result of a successful deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Method used.
    pub method: DeleteMethod,
}

/// Results of a batch deletion.
#[derive(Debug, Clone, Default)]
pub struct BatchDeleteResult {
    /// Successfully deleted files.
    pub successes: Vec<DeleteResult>,
    /// Failed deletions with the reason.
    pub failures: Vec<(PathBuf, String)>,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl BatchDeleteResult {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        let freed = bytesize::ByteSize::b(self.bytes_freed);
        if self.all_succeeded() {
            format!("Deleted {} file(s), freed {}", self.success_count(), freed)
        } else {
            format!(
                "Deleted {} file(s), {} failed, freed {}",
                self.success_count(),
                self.failure_count(),
                freed
            )
        }
    }
}

/// Callback for deletion progress.
pub trait DeleteProgressCallback {
    /// Called after a file was deleted.
    fn on_delete_success(&self, path: &Path, size: u64);

    /// Called after a deletion failed.
    fn on_delete_failure(&self, path: &Path, reason: &str);
}

/// Callback that ignores progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl DeleteProgressCallback for NoProgress {
    fn on_delete_success(&self, _path: &Path, _size: u64) {}
    fn on_delete_failure(&self, _path: &Path, _reason: &str) {}
}

/// Move a single file to the system trash.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if its metadata cannot be read
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_metadata(path, e))?
        .len();

    trash::delete(path).map_err(|e| DeleteError::TrashFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    log::info!("Moved to trash: {} ({} bytes)", path.display(), size);

    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        method: DeleteMethod::Trash,
    })
}

/// Permanently delete a single file.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if its metadata cannot be read
/// - `PermanentDeleteFailed` if the delete operation fails
pub fn permanent_delete(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_metadata(path, e))?
        .len();

    fs::remove_file(path).map_err(|e| DeleteError::PermanentDeleteFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    log::info!("Permanently deleted: {} ({} bytes)", path.display(), size);

    Ok(DeleteResult {
        path: path.to_path_buf(),
        size,
        method: DeleteMethod::Permanent,
    })
}

/// Delete one file with the given method.
///
/// # Errors
///
/// See [`permanent_delete`] and [`delete_to_trash`].
pub fn delete_file(path: &Path, method: DeleteMethod) -> Result<DeleteResult, DeleteError> {
    match method {
        DeleteMethod::Permanent => permanent_delete(path),
        DeleteMethod::Trash => delete_to_trash(path),
    }
}

/// Delete every path, continuing past failures.
pub fn delete_batch<C: DeleteProgressCallback + ?Sized>(
    paths: &[PathBuf],
    method: DeleteMethod,
    callback: &C,
) -> BatchDeleteResult {
    let mut result = BatchDeleteResult::default();

    for path in paths {
        match delete_file(path, method) {
            Ok(deleted) => {
                result.bytes_freed += deleted.size;
                callback.on_delete_success(path, deleted.size);
                result.successes.push(deleted);
            }
            Err(e) => {
                let reason = e.to_string();
                log::warn!("Failed to delete {}: {}", path.display(), reason);
                callback.on_delete_failure(path, &reason);
                result.failures.push((path.clone(), reason));
            }
        }
    }

    log::info!("{}", result.summary());
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        ok: RefCell<Vec<PathBuf>>,
        failed: RefCell<Vec<PathBuf>>,
    }

    impl DeleteProgressCallback for Recorder {
        fn on_delete_success(&self, path: &Path, _size: u64) {
            self.ok.borrow_mut().push(path.to_path_buf());
        }

        fn on_delete_failure(&self, path: &Path, _reason: &str) {
            self.failed.borrow_mut().push(path.to_path_buf());
        }
    }

    #[test]
    fn test_permanent_delete() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("copy.mp4");
        fs::write(&path, b"12345").unwrap();

        let result = permanent_delete(&path).unwrap();

        assert_eq!(result.size, 5);
        assert_eq!(result.method, DeleteMethod::Permanent);
        assert!(!path.exists());
    }

    #[test]
    fn test_permanent_delete_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.mp4");

        let err = permanent_delete(&path).unwrap_err();
        assert!(matches!(err, DeleteError::NotFound(_)));
        assert_eq!(err.path(), path.as_path());
    }

    #[test]
    fn test_delete_batch_continues_after_failure() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.mp4");
        let missing = dir.path().join("missing.mp4");
        let b = dir.path().join("b.mp4");
        fs::write(&a, b"aa").unwrap();
        fs::write(&b, b"bbb").unwrap();

        let recorder = Recorder::default();
        let result = delete_batch(
            &[a.clone(), missing.clone(), b.clone()],
            DeleteMethod::Permanent,
            &recorder,
        );

        assert_eq!(result.success_count(), 2);
        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.failures[0].0, missing);
        assert!(result.failures[0].1.contains("not found"));
        assert_eq!(result.bytes_freed, 5);
        assert!(!a.exists() && !b.exists());
        assert_eq!(*recorder.ok.borrow(), vec![a, b]);
        assert_eq!(*recorder.failed.borrow(), vec![missing]);
    }

    #[test]
    fn test_summary_wording() {
        let mut result = BatchDeleteResult::default();
        assert!(result.summary().starts_with("Deleted 0 file(s)"));

        result.failures.push((PathBuf::from("/x"), "boom".into()));
        assert!(result.summary().contains("1 failed"));
    }

    #[test]
    fn test_delete_method_display() {
        assert_eq!(DeleteMethod::default(), DeleteMethod::Permanent);
        assert_eq!(DeleteMethod::Trash.to_string(), "trash");
    }
}
