//! Scan-to-commit runs through the resolution workflow.

use std::sync::Arc;

use vidupe::actions::DeleteMethod;
use vidupe::duplicates::{DuplicateGrouper, GrouperConfig};
use vidupe::progress::LogBuffer;
use vidupe::session::{ResolutionWorkflow, ResolveMode, WorkflowError, WorkflowState};
use vidupe::signal::KillSwitch;
use tempfile::TempDir;

use super::support::{abc_fixture, extractor, paths, video_dir};

/// Scan `dir` synchronously and hand the result to a fresh workflow.
fn scanned(dir: &TempDir, mode: ResolveMode) -> (ResolutionWorkflow, LogBuffer, WorkflowState) {
    let log = LogBuffer::default();
    let mut workflow = ResolutionWorkflow::new(mode).with_observer(Arc::new(log.clone()));
    let kill = KillSwitch::new();
    workflow.start_scan(dir.path(), kill.clone()).unwrap();

    let config = GrouperConfig::default().with_kill_switch(kill);
    let outcome = DuplicateGrouper::new(extractor(), config).group(dir.path());
    let state = workflow.finish_scan(outcome).unwrap();
    (workflow, log, state)
}

// ==================== Auto Mode Tests ====================

#[test]
fn test_auto_stages_all_but_first() {
    let dir = abc_fixture();
    let (mut workflow, log, state) = scanned(&dir, ResolveMode::Auto);
    assert_eq!(state, WorkflowState::AutoResolving);

    let report = workflow.run_auto(|_, _| {}).unwrap();
    assert_eq!(report.groups_processed, 1);
    assert_eq!(report.files_staged, 2);
    assert!(!report.cancelled);
    assert_eq!(workflow.state(), WorkflowState::Done);
    assert_eq!(workflow.ledger().staged(), paths(&dir, &["b.mp4", "c.mp4"]).as_slice());

    let lines = log.lines();
    assert!(lines.iter().any(|l| l.ends_with("b.mp4") && l.starts_with("Marked for deletion")));
    assert!(lines.iter().any(|l| l == "Auto mode complete. 2 files marked for deletion."));
}

#[test]
fn test_auto_commit_deletes_from_disk() {
    let dir = abc_fixture();
    let (mut workflow, _log, _) = scanned(&dir, ResolveMode::Auto);
    workflow.run_auto(|_, _| {}).unwrap();

    let result = workflow.commit(DeleteMethod::Permanent).unwrap();
    assert_eq!(result.success_count(), 2);
    assert!(result.failures.is_empty());
    assert_eq!(workflow.staged_count(), 0);

    assert!(dir.path().join("a.mp4").exists());
    assert!(!dir.path().join("b.mp4").exists());
    assert!(!dir.path().join("c.mp4").exists());
    assert!(dir.path().join("d.mp4").exists());
}

#[test]
fn test_auto_cancel_keeps_earlier_batches() {
    let dir = video_dir(&[
        ("a1.mp4", "one"),
        ("a2.mp4", "one"),
        ("b1.mp4", "two"),
        ("b2.mp4", "two"),
    ]);
    let (mut workflow, log, _) = scanned(&dir, ResolveMode::Auto);

    let cancel = workflow.session().unwrap().kill_switch().clone();
    let report = workflow
        .run_auto(|done, _| {
            if done == 1 {
                cancel.trigger();
            }
        })
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.groups_processed, 1);
    assert_eq!(workflow.ledger().staged(), paths(&dir, &["a2.mp4"]).as_slice());
    assert!(log.lines().iter().any(|l| l == "Auto deletion stopped by user."));
}

// ==================== Manual Mode Tests ====================

#[test]
fn test_manual_keep_then_undo() {
    let dir = abc_fixture();
    let (mut workflow, log, state) = scanned(&dir, ResolveMode::Manual);
    assert_eq!(state, WorkflowState::ManualReviewing);
    assert!(log
        .lines()
        .iter()
        .any(|l| l.starts_with("Duplicate Group: Hash=abc123")));

    let staged = workflow.keep(1).unwrap();
    assert_eq!(staged, paths(&dir, &["a.mp4", "c.mp4"]));
    assert_eq!(workflow.state(), WorkflowState::Done);

    let restored = workflow.undo_last();
    assert_eq!(restored, staged);
    assert_eq!(workflow.staged_count(), 0);
    assert!(log.lines().iter().any(|l| l.starts_with("Undo deletion:")));

    // Only one batch of undo history.
    assert!(workflow.undo_last().is_empty());
    assert_eq!(log.lines().last().map(String::as_str), Some("Nothing to undo."));
}

#[test]
fn test_manual_invalid_selection_keeps_group() {
    let dir = abc_fixture();
    let (mut workflow, log, _) = scanned(&dir, ResolveMode::Manual);

    let err = workflow.keep(5).unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidSelection { index: 5, len: 3 }));
    assert_eq!(workflow.state(), WorkflowState::ManualReviewing);
    assert_eq!(workflow.staged_count(), 0);
    assert!(log.lines().iter().any(|l| l.starts_with("Invalid selection")));

    workflow.keep(0).unwrap();
    assert_eq!(workflow.staged_count(), 2);
}

#[test]
fn test_manual_skip_and_revisit() {
    let dir = video_dir(&[
        ("a1.mp4", "one"),
        ("a2.mp4", "one"),
        ("b1.mp4", "two"),
        ("b2.mp4", "two"),
    ]);
    let (mut workflow, _log, _) = scanned(&dir, ResolveMode::Manual);

    workflow.skip().unwrap();
    let current = workflow.current_group().unwrap();
    assert_eq!(current.fingerprint().visual_hash(), "two");
    workflow.keep(0).unwrap();
    assert_eq!(workflow.state(), WorkflowState::Done);
    assert_eq!(workflow.skipped().len(), 1);

    assert_eq!(workflow.revisit_skipped().unwrap(), 1);
    assert_eq!(workflow.state(), WorkflowState::ManualReviewing);
    assert_eq!(workflow.current_group().unwrap().fingerprint().visual_hash(), "one");
    let session = workflow.session().unwrap();
    assert_eq!((session.processed_groups(), session.total_groups()), (2, 2));
    workflow.keep(1).unwrap();

    assert_eq!(
        workflow.ledger().staged(),
        paths(&dir, &["b2.mp4", "a1.mp4"]).as_slice()
    );
}

#[test]
fn test_manual_stop_keeps_staging() {
    let dir = video_dir(&[
        ("a1.mp4", "one"),
        ("a2.mp4", "one"),
        ("b1.mp4", "two"),
        ("b2.mp4", "two"),
    ]);
    let (mut workflow, log, _) = scanned(&dir, ResolveMode::Manual);

    workflow.keep(0).unwrap();
    assert_eq!(workflow.stop().unwrap(), 1);
    assert_eq!(workflow.state(), WorkflowState::Done);
    assert!(workflow.current_group().is_none());
    assert!(log
        .lines()
        .iter()
        .any(|l| l == "Manual scanning stopped. 1 files marked for deletion."));
}

// ==================== Lifecycle Tests ====================

#[test]
fn test_no_duplicates_goes_straight_to_done() {
    let dir = video_dir(&[("a.mp4", "one"), ("b.mp4", "two")]);
    let (workflow, log, state) = scanned(&dir, ResolveMode::Manual);
    assert_eq!(state, WorkflowState::Done);
    assert!(workflow.current_group().is_none());
    assert!(log.lines().iter().any(|l| l == "No duplicates found."));
}

#[test]
fn test_aborted_scan_reports_no_groups() {
    let dir = abc_fixture();
    let log = LogBuffer::default();
    let mut workflow =
        ResolutionWorkflow::new(ResolveMode::Auto).with_observer(Arc::new(log.clone()));
    let kill = KillSwitch::new();
    workflow.start_scan(dir.path(), kill.clone()).unwrap();

    kill.trigger();
    let config = GrouperConfig::default().with_kill_switch(kill);
    let outcome = DuplicateGrouper::new(extractor(), config).group(dir.path());

    assert_eq!(workflow.finish_scan(outcome).unwrap(), WorkflowState::Done);
    assert_eq!(workflow.staged_count(), 0);
    assert!(log.lines().iter().any(|l| l == "Scan aborted."));
}

#[test]
fn test_scan_again_after_done() {
    let dir = abc_fixture();
    let (mut workflow, _log, _) = scanned(&dir, ResolveMode::Auto);
    workflow.run_auto(|_, _| {}).unwrap();
    workflow.commit(DeleteMethod::Permanent).unwrap();

    workflow.scan_again().unwrap();
    assert_eq!(workflow.state(), WorkflowState::Idle);

    workflow.start_scan(dir.path(), KillSwitch::new()).unwrap();
    let outcome = DuplicateGrouper::new(extractor(), GrouperConfig::default()).group(dir.path());
    assert_eq!(workflow.finish_scan(outcome).unwrap(), WorkflowState::Done);
}

#[test]
fn test_commit_rejected_while_scanning() {
    let dir = abc_fixture();
    let mut workflow = ResolutionWorkflow::new(ResolveMode::Auto);
    workflow.start_scan(dir.path(), KillSwitch::new()).unwrap();

    let err = workflow.commit(DeleteMethod::Permanent).unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidState { .. }));
}
