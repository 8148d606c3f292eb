//! Staging ledger against real files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use vidupe::actions::{DeleteMethod, DeleteProgressCallback, NoProgress, StagingLedger};

use super::support::{paths, video_dir};

#[derive(Default)]
struct Recorder {
    deleted: Mutex<Vec<PathBuf>>,
    failed: Mutex<Vec<PathBuf>>,
}

impl DeleteProgressCallback for Recorder {
    fn on_delete_success(&self, path: &Path, _size: u64) {
        self.deleted.lock().unwrap().push(path.to_path_buf());
    }

    fn on_delete_failure(&self, path: &Path, _error: &str) {
        self.failed.lock().unwrap().push(path.to_path_buf());
    }
}

#[test]
fn test_staging_does_not_touch_disk() {
    let dir = video_dir(&[("a.mp4", "x"), ("b.mp4", "x")]);
    let mut ledger = StagingLedger::new();
    ledger.stage(paths(&dir, &["a.mp4", "b.mp4"]));

    assert_eq!(ledger.len(), 2);
    assert!(dir.path().join("a.mp4").exists());
    assert!(dir.path().join("b.mp4").exists());
}

#[test]
fn test_restaging_is_idempotent() {
    let dir = video_dir(&[("a.mp4", "x"), ("b.mp4", "x")]);
    let mut ledger = StagingLedger::new();
    ledger.stage(paths(&dir, &["a.mp4"]));
    let added = ledger.stage(paths(&dir, &["a.mp4", "b.mp4"]));

    assert_eq!(added, paths(&dir, &["b.mp4"]));
    assert_eq!(ledger.len(), 2);

    // Undo only covers what the last call actually added.
    assert_eq!(ledger.undo_last(), paths(&dir, &["b.mp4"]));
    assert_eq!(ledger.staged(), paths(&dir, &["a.mp4"]).as_slice());
}

#[test]
fn test_commit_deletes_and_clears() {
    let dir = video_dir(&[("a.mp4", "12345"), ("b.mp4", "123"), ("keep.mp4", "1")]);
    let mut ledger = StagingLedger::new();
    ledger.stage(paths(&dir, &["a.mp4", "b.mp4"]));
    assert_eq!(ledger.staged_bytes(), 8);

    let recorder = Recorder::default();
    let result = ledger.commit_all(DeleteMethod::Permanent, &recorder);

    assert_eq!(result.success_count(), 2);
    assert_eq!(result.bytes_freed, 8);
    assert!(ledger.is_empty());
    assert!(!ledger.can_undo());
    assert_eq!(recorder.deleted.lock().unwrap().len(), 2);
    assert!(!dir.path().join("a.mp4").exists());
    assert!(dir.path().join("keep.mp4").exists());
}

#[test]
fn test_commit_continues_past_failures() {
    let dir = video_dir(&[("a.mp4", "x"), ("c.mp4", "x")]);
    let mut ledger = StagingLedger::new();
    ledger.stage(paths(&dir, &["a.mp4", "gone.mp4", "c.mp4"]));

    let recorder = Recorder::default();
    let result = ledger.commit_all(DeleteMethod::Permanent, &recorder);

    assert_eq!(result.success_count(), 2);
    assert_eq!(result.failure_count(), 1);
    assert_eq!(result.failures[0].0, dir.path().join("gone.mp4"));
    assert_eq!(*recorder.failed.lock().unwrap(), paths(&dir, &["gone.mp4"]));
    assert!(ledger.is_empty());
    assert!(!dir.path().join("c.mp4").exists());
}

#[test]
fn test_undo_after_commit_restores_nothing() {
    let dir = video_dir(&[("a.mp4", "x")]);
    let mut ledger = StagingLedger::new();
    ledger.stage(paths(&dir, &["a.mp4"]));
    ledger.commit_all(DeleteMethod::Permanent, &NoProgress);

    assert!(ledger.undo_last().is_empty());
    assert!(!dir.path().join("a.mp4").exists());
}

#[test]
fn test_directory_is_not_deleted() {
    let dir = video_dir(&[("sub/a.mp4", "x")]);
    let mut ledger = StagingLedger::new();
    ledger.stage([dir.path().join("sub")]);

    let result = ledger.commit_all(DeleteMethod::Permanent, &NoProgress);
    assert_eq!(result.failure_count(), 1);
    assert!(fs::metadata(dir.path().join("sub/a.mp4")).is_ok());
}
