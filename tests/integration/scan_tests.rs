//! Grouping pass over real directory trees.

use std::sync::{Arc, Mutex};

use vidupe::duplicates::{DuplicateGrouper, GrouperConfig, ScanOutcome};
use vidupe::progress::{LogBuffer, ProgressUpdate, ScanObserver};
use vidupe::signal::KillSwitch;

use super::support::{abc_fixture, extractor, paths, video_dir};

fn grouper() -> DuplicateGrouper {
    DuplicateGrouper::new(extractor(), GrouperConfig::default())
}

#[derive(Default)]
struct ProgressLog(Mutex<Vec<ProgressUpdate>>);

impl ScanObserver for ProgressLog {
    fn on_log(&self, _line: &str) {}

    fn on_progress(&self, update: &ProgressUpdate) {
        self.0.lock().unwrap().push(update.clone());
    }
}

#[test]
fn test_three_copies_form_one_group_in_walk_order() {
    let dir = abc_fixture();
    let outcome = grouper().group(dir.path());

    assert!(!outcome.is_aborted());
    let groups = outcome.groups();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].paths(), paths(&dir, &["a.mp4", "b.mp4", "c.mp4"]));
    assert_eq!(groups[0].fingerprint().visual_hash(), "abc123");

    let summary = outcome.summary();
    assert_eq!(summary.total_files, 4);
    assert_eq!(summary.fingerprinted, 4);
    assert_eq!(summary.duplicate_groups, 1);
    assert_eq!(summary.duplicate_files, 2);
}

#[test]
fn test_same_hash_different_duration_is_not_a_duplicate() {
    let dir = video_dir(&[("a.mp4", "abc123 10.0 100"), ("b.mp4", "abc123 12.0 100")]);
    let outcome = grouper().group(dir.path());
    assert!(outcome.groups().is_empty());
}

#[test]
fn test_duration_rounding_merges_close_lengths() {
    let dir = video_dir(&[("a.mp4", "abc123 10.04 100"), ("b.mp4", "abc123 9.96 100")]);
    let outcome = grouper().group(dir.path());
    assert_eq!(outcome.groups().len(), 1);
}

#[test]
fn test_non_video_files_are_ignored() {
    let dir = video_dir(&[
        ("a.mp4", "abc123"),
        ("notes.txt", "abc123"),
        ("b.MKV", "abc123"),
        ("cover.jpg", "abc123"),
    ]);
    let outcome = grouper().group(dir.path());

    assert_eq!(outcome.summary().total_files, 2);
    assert_eq!(outcome.groups()[0].paths(), paths(&dir, &["a.mp4", "b.MKV"]));
}

#[test]
fn test_failed_files_are_skipped_and_recorded() {
    let dir = video_dir(&[("a.mp4", "abc123"), ("bad.mp4", "FAIL"), ("c.mp4", "abc123")]);
    let log = LogBuffer::default();
    let config = GrouperConfig::default().with_observer(Arc::new(log.clone()));
    let outcome = DuplicateGrouper::new(extractor(), config).group(dir.path());

    let summary = outcome.summary();
    assert_eq!(summary.processed_files, 3);
    assert_eq!(summary.fingerprinted, 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].0, dir.path().join("bad.mp4"));
    assert_eq!(outcome.groups().len(), 1);
    assert!(log.lines().iter().any(|l| l.starts_with("Failed to fingerprint")));
}

#[test]
fn test_nested_directories_are_walked() {
    let dir = video_dir(&[
        ("2023/trip.mp4", "sea"),
        ("2024/copy/trip.mov", "sea"),
        ("top.webm", "sky"),
    ]);
    let outcome = grouper().group(dir.path());

    assert_eq!(outcome.summary().total_files, 3);
    assert_eq!(
        outcome.groups()[0].paths(),
        paths(&dir, &["2023/trip.mp4", "2024/copy/trip.mov"])
    );
}

#[test]
fn test_progress_reported_once_per_file() {
    let dir = video_dir(&[("a.mp4", "x"), ("b.mp4", "FAIL"), ("c.mp4", "y")]);
    let recorder = Arc::new(ProgressLog::default());
    let config = GrouperConfig::default().with_observer(recorder.clone());
    DuplicateGrouper::new(extractor(), config).group(dir.path());

    let updates = recorder.0.lock().unwrap();
    let processed: Vec<usize> = updates.iter().map(|u| u.processed).collect();
    assert_eq!(processed, vec![1, 2, 3]);
    assert!(updates.iter().all(|u| u.total == 3));
    assert_eq!(updates[1].current_path, dir.path().join("b.mp4"));
}

#[test]
fn test_triggered_kill_switch_aborts_without_groups() {
    let dir = abc_fixture();
    let kill = KillSwitch::new();
    kill.trigger();
    let config = GrouperConfig::default().with_kill_switch(kill);
    let outcome = DuplicateGrouper::new(extractor(), config).group(dir.path());

    assert!(matches!(outcome, ScanOutcome::Aborted { .. }));
    assert!(outcome.groups().is_empty());
    assert_eq!(outcome.summary().processed_files, 0);
}

#[test]
fn test_empty_directory() {
    let dir = video_dir(&[]);
    let outcome = grouper().group(dir.path());
    assert!(!outcome.is_aborted());
    assert!(outcome.groups().is_empty());
    assert_eq!(outcome.summary().total_files, 0);
}

#[test]
fn test_missing_root_reports_walk_error() {
    let dir = video_dir(&[]);
    let outcome = grouper().group(&dir.path().join("missing"));
    assert!(outcome.groups().is_empty());
    assert_eq!(outcome.summary().walk_errors.len(), 1);
}

#[test]
fn test_repeat_scans_are_identical() {
    let dir = video_dir(&[
        ("z.mp4", "one"),
        ("y.mp4", "two"),
        ("x.mp4", "one"),
        ("w.mp4", "two"),
    ]);
    let first = grouper().group(dir.path());
    let second = grouper().group(dir.path());
    assert_eq!(first.groups(), second.groups());
    assert_eq!(first.groups().len(), 2);
    assert_eq!(first.groups()[0].paths()[0], dir.path().join("w.mp4"));
}
