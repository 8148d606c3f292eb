//! Resolution workflow: what happens to the groups a scan found.
//!
//! # States
//!
//! ```text
//! Idle --start_scan--> Scanning --finish_scan--> AutoResolving --run_auto--> Done
//!                                       |                                      ^
//!                                       +------> ManualReviewing --(last group | stop)
//!                                       +------> Done (no groups / aborted)
//! Done --scan_again--> Idle
//! ```
//!
//! Auto mode stages every member but the first of each group. Manual mode
//! presents one group at a time and accepts `keep(i)`, `skip` or `stop`.
//! All staging goes through the workflow's [`StagingLedger`], which supports
//! undoing the most recent batch and committing everything staged.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::{
    BatchDeleteResult, DeleteMethod, DeleteProgressCallback, PreviewError, Previewer,
    StagingLedger,
};
use crate::duplicates::{DuplicateGroup, ScanOutcome};
use crate::progress::{NullObserver, ProgressUpdate, ScanObserver};
use crate::signal::KillSwitch;

use super::data::ScanSession;

/// How groups are resolved once the scan completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResolveMode {
    /// Keep the first-discovered file of every group, stage the rest.
    Auto,
    /// Decide group by group.
    #[default]
    Manual,
}

impl fmt::Display for ResolveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// Workflow state. The group under review is [`ResolutionWorkflow::current_group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Waiting for a scan to start.
    Idle,
    /// A scan is running in the background.
    Scanning,
    /// Auto mode is about to stage every group.
    AutoResolving,
    /// A group is waiting for a manual decision.
    ManualReviewing,
    /// Resolution finished; staged files can be committed.
    Done,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::AutoResolving => "auto-resolving",
            Self::ManualReviewing => "reviewing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Errors from workflow operations. None of them change state.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// `keep`/`preview` index outside the current group.
    #[error("invalid selection {index}: choose 0 to {} for this group", .len.saturating_sub(1))]
    InvalidSelection { index: usize, len: usize },

    /// Operation not allowed in the current state.
    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: WorkflowState,
    },

    /// The preview hook failed.
    #[error(transparent)]
    Preview(#[from] PreviewError),
}

/// What an auto-resolution pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AutoReport {
    /// Groups whose duplicates were staged.
    pub groups_processed: usize,
    /// Groups in the scan result.
    pub total_groups: usize,
    /// Files staged by this pass.
    pub files_staged: usize,
    /// Whether the cancel flag stopped the pass early.
    pub cancelled: bool,
}

/// Drives one scan-and-resolve run at a time.
pub struct ResolutionWorkflow {
    mode: ResolveMode,
    state: WorkflowState,
    session: Option<ScanSession>,
    ledger: StagingLedger,
    current: Option<DuplicateGroup>,
    skipped: Vec<DuplicateGroup>,
    observer: Arc<dyn ScanObserver>,
}

impl fmt::Debug for ResolutionWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionWorkflow")
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("session", &self.session)
            .field("ledger", &self.ledger)
            .field("current", &self.current)
            .field("skipped", &self.skipped.len())
            .finish_non_exhaustive()
    }
}

/// Turns deletion callbacks into log lines.
struct CommitLog<'a>(&'a dyn ScanObserver);

impl DeleteProgressCallback for CommitLog<'_> {
    fn on_delete_success(&self, path: &Path, _size: u64) {
        self.0.on_log(&format!("Deleted file: {}", path.display()));
    }

    fn on_delete_failure(&self, path: &Path, reason: &str) {
        self.0
            .on_log(&format!("Failed to delete {}: {}", path.display(), reason));
    }
}

impl ResolutionWorkflow {
    /// Create an idle workflow.
    #[must_use]
    pub fn new(mode: ResolveMode) -> Self {
        Self {
            mode,
            state: WorkflowState::Idle,
            session: None,
            ledger: StagingLedger::new(),
            current: None,
            skipped: Vec::new(),
            observer: Arc::new(NullObserver),
        }
    }

    /// Send log lines to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.observer = observer;
        self
    }

    fn log(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        log::debug!("{}", line);
        self.observer.on_log(line);
    }

    fn expect_state(&self, action: &'static str, allowed: &[WorkflowState]) -> Result<(), WorkflowError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidState {
                action,
                state: self.state,
            })
        }
    }

    // ==================== Accessors ====================

    /// Resolution mode.
    #[must_use]
    pub fn mode(&self) -> ResolveMode {
        self.mode
    }

    /// Change the mode for the next scan.
    ///
    /// # Errors
    ///
    /// Only allowed while idle.
    pub fn set_mode(&mut self, mode: ResolveMode) -> Result<(), WorkflowError> {
        self.expect_state("change mode", &[WorkflowState::Idle])?;
        self.mode = mode;
        Ok(())
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// The active session, from scan start until `scan_again`.
    #[must_use]
    pub fn session(&self) -> Option<&ScanSession> {
        self.session.as_ref()
    }

    /// The staging ledger.
    #[must_use]
    pub fn ledger(&self) -> &StagingLedger {
        &self.ledger
    }

    /// Number of staged files.
    #[must_use]
    pub fn staged_count(&self) -> usize {
        self.ledger.len()
    }

    /// Group under manual review.
    #[must_use]
    pub fn current_group(&self) -> Option<&DuplicateGroup> {
        self.current.as_ref()
    }

    /// Groups skipped during manual review, most recent last.
    #[must_use]
    pub fn skipped(&self) -> &[DuplicateGroup] {
        &self.skipped
    }

    // ==================== Scan Phase ====================

    /// Begin a scan of `root`. Clears staging, undo state and skipped groups.
    ///
    /// # Errors
    ///
    /// Only allowed while idle or done.
    pub fn start_scan(&mut self, root: impl Into<PathBuf>, kill: KillSwitch) -> Result<(), WorkflowError> {
        self.expect_state("start a scan", &[WorkflowState::Idle, WorkflowState::Done])?;

        kill.reset();
        self.ledger.clear();
        self.skipped.clear();
        self.current = None;
        self.session = Some(ScanSession::new(root, kill));
        self.state = WorkflowState::Scanning;
        Ok(())
    }

    /// Record scan progress in the session.
    pub fn record_progress(&mut self, update: &ProgressUpdate) {
        if self.state == WorkflowState::Scanning {
            if let Some(session) = self.session.as_mut() {
                session.record_progress(update);
            }
        }
    }

    /// Hand the scan result over and move to the resolution state.
    ///
    /// # Errors
    ///
    /// Only allowed while scanning.
    pub fn finish_scan(&mut self, outcome: ScanOutcome) -> Result<WorkflowState, WorkflowError> {
        self.expect_state("finish a scan", &[WorkflowState::Scanning])?;

        let aborted = outcome.is_aborted();
        let group_count = outcome.groups().len();
        if let Some(session) = self.session.as_mut() {
            session.absorb(outcome);
        }

        if aborted {
            self.log("Scan aborted.");
            self.state = WorkflowState::Done;
        } else if group_count == 0 {
            self.log("No duplicates found.");
            self.state = WorkflowState::Done;
        } else {
            match self.mode {
                ResolveMode::Auto => {
                    self.log(format!(
                        "Auto mode: keeping the first file of {group_count} groups."
                    ));
                    self.state = WorkflowState::AutoResolving;
                }
                ResolveMode::Manual => self.advance(),
            }
        }

        Ok(self.state)
    }

    // ==================== Auto Mode ====================

    /// Stage all but the first member of every group.
    ///
    /// `on_group(done, total)` is called after each group. If the session's
    /// kill switch is triggered the pass stops before the next group; groups
    /// already processed stay staged.
    ///
    /// # Errors
    ///
    /// Only allowed in the auto-resolving state.
    pub fn run_auto<F>(&mut self, mut on_group: F) -> Result<AutoReport, WorkflowError>
    where
        F: FnMut(usize, usize),
    {
        self.expect_state("auto-resolve", &[WorkflowState::AutoResolving])?;
        let cancel = self
            .session
            .as_ref()
            .map(|session| session.kill_switch().clone())
            .unwrap_or_default();

        let mut report = AutoReport {
            total_groups: self.session.as_ref().map_or(0, ScanSession::pending),
            ..AutoReport::default()
        };

        loop {
            if cancel.is_triggered() {
                self.log("Auto deletion stopped by user.");
                report.cancelled = true;
                break;
            }

            let Some(group) = self.session.as_mut().and_then(ScanSession::next_group) else {
                break;
            };

            let duplicates = group.all_except(0).unwrap_or_default();
            report.files_staged += self.stage_batch(duplicates).len();
            report.groups_processed += 1;
            self.log(format!(
                "Resolved group {}/{}.",
                report.groups_processed, report.total_groups
            ));
            on_group(report.groups_processed, report.total_groups);
        }

        if let Some(session) = self.session.as_mut() {
            session.discard_pending();
        }
        self.state = WorkflowState::Done;
        self.log(format!(
            "Auto mode complete. {} files marked for deletion.",
            self.ledger.len()
        ));
        Ok(report)
    }

    // ==================== Manual Mode ====================

    /// Keep member `index` of the current group and stage the others.
    ///
    /// Returns the newly staged paths and advances to the next group.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::InvalidSelection`] for an out-of-range index; the
    /// same group stays current and nothing is staged.
    pub fn keep(&mut self, index: usize) -> Result<Vec<PathBuf>, WorkflowError> {
        self.expect_state("keep a file", &[WorkflowState::ManualReviewing])?;
        let group = self.current.as_ref().ok_or(WorkflowError::InvalidState {
            action: "keep a file",
            state: self.state,
        })?;

        let Some(others) = group.all_except(index) else {
            let err = WorkflowError::InvalidSelection {
                index,
                len: group.len(),
            };
            self.log(format!("Invalid selection: {err}"));
            return Err(err);
        };

        let kept = group.paths()[index].clone();
        let staged = self.stage_batch(others);
        self.log(format!("Kept {}", kept.display()));
        self.advance();
        Ok(staged)
    }

    /// Set the current group aside and move on.
    ///
    /// # Errors
    ///
    /// Only allowed while reviewing.
    pub fn skip(&mut self) -> Result<(), WorkflowError> {
        self.expect_state("skip a group", &[WorkflowState::ManualReviewing])?;
        if let Some(group) = self.current.take() {
            self.log("Skipped group.");
            self.skipped.push(group);
        }
        self.advance();
        Ok(())
    }

    /// Abandon the remaining groups. Staging already done is kept.
    ///
    /// Returns the number of staged files.
    ///
    /// # Errors
    ///
    /// Only allowed while reviewing.
    pub fn stop(&mut self) -> Result<usize, WorkflowError> {
        self.expect_state("stop reviewing", &[WorkflowState::ManualReviewing])?;
        self.current = None;
        if let Some(session) = self.session.as_mut() {
            session.discard_pending();
        }
        self.state = WorkflowState::Done;
        self.log(format!(
            "Manual scanning stopped. {} files marked for deletion.",
            self.ledger.len()
        ));
        Ok(self.ledger.len())
    }

    /// Open member `index` of the current group with `previewer`.
    ///
    /// # Errors
    ///
    /// Invalid index or state, or the preview hook failing.
    pub fn preview(&self, index: usize, previewer: &dyn Previewer) -> Result<(), WorkflowError> {
        self.expect_state("preview", &[WorkflowState::ManualReviewing])?;
        let group = self.current.as_ref().ok_or(WorkflowError::InvalidState {
            action: "preview",
            state: self.state,
        })?;
        let path = group.paths().get(index).ok_or(WorkflowError::InvalidSelection {
            index,
            len: group.len(),
        })?;

        self.log(format!("Playing {}", path.display()));
        previewer.preview(path).map_err(|e| {
            self.log(format!("Could not play {}: {}", path.display(), e));
            WorkflowError::Preview(e)
        })
    }

    /// Put the skipped groups back in the review queue.
    ///
    /// Returns how many groups were requeued.
    ///
    /// # Errors
    ///
    /// Only allowed once resolution is done.
    pub fn revisit_skipped(&mut self) -> Result<usize, WorkflowError> {
        self.expect_state("revisit skipped groups", &[WorkflowState::Done])?;
        let count = self.skipped.len();
        if count == 0 {
            return Ok(0);
        }

        let groups: Vec<_> = self.skipped.drain(..).rev().collect();
        if let Some(session) = self.session.as_mut() {
            session.requeue(groups);
        }
        self.log(format!("Revisiting {count} skipped groups."));
        self.advance();
        Ok(count)
    }

    fn advance(&mut self) {
        match self.session.as_mut().and_then(ScanSession::next_group) {
            Some(group) => {
                self.log(group.header());
                for (index, path) in group.paths().iter().enumerate() {
                    self.log(format!(" [{index}] {}", path.display()));
                }
                self.current = Some(group);
                self.state = WorkflowState::ManualReviewing;
            }
            None => {
                self.current = None;
                self.state = WorkflowState::Done;
                self.log(format!(
                    "Manual mode complete. {} files marked for deletion.",
                    self.ledger.len()
                ));
            }
        }
    }

    // ==================== Staging ====================

    fn stage_batch(&mut self, paths: Vec<PathBuf>) -> Vec<PathBuf> {
        let added = self.ledger.stage(paths);
        for path in &added {
            self.log(format!("Marked for deletion: {}", path.display()));
        }
        added
    }

    /// Unstage the most recent batch. Returns the unstaged paths.
    pub fn undo_last(&mut self) -> Vec<PathBuf> {
        let restored = self.ledger.undo_last();
        if restored.is_empty() {
            self.log("Nothing to undo.");
        }
        for path in &restored {
            self.log(format!("Undo deletion: {}", path.display()));
        }
        restored
    }

    /// Delete every staged file with `method` and clear the ledger.
    ///
    /// # Errors
    ///
    /// Not allowed while a scan is running.
    pub fn commit(&mut self, method: DeleteMethod) -> Result<BatchDeleteResult, WorkflowError> {
        if self.state == WorkflowState::Scanning {
            return Err(WorkflowError::InvalidState {
                action: "delete staged files",
                state: self.state,
            });
        }

        if self.ledger.is_empty() {
            self.log("No files marked for deletion.");
            return Ok(BatchDeleteResult::default());
        }

        let observer = Arc::clone(&self.observer);
        let result = self.ledger.commit_all(method, &CommitLog(observer.as_ref()));
        self.log(format!("Staged files removed. {}", result.summary()));
        Ok(result)
    }

    /// Return to idle after a finished run.
    ///
    /// # Errors
    ///
    /// Only allowed once resolution is done.
    pub fn scan_again(&mut self) -> Result<(), WorkflowError> {
        self.expect_state("scan again", &[WorkflowState::Done])?;
        self.session = None;
        self.current = None;
        self.skipped.clear();
        self.state = WorkflowState::Idle;
        Ok(())
    }
}
