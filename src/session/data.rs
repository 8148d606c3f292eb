//! Transient state of one scan-and-resolve run.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use crate::duplicates::{DuplicateGroup, ScanOutcome, ScanSummary};
use crate::progress::ProgressUpdate;
use crate::signal::KillSwitch;

/// One run: created when a scan starts, dropped when resolution ends.
///
/// Owns the groups still waiting for a decision and pops them from the
/// front as they are resolved.
#[derive(Debug, Clone)]
pub struct ScanSession {
    root: PathBuf,
    kill_switch: KillSwitch,
    pending: VecDeque<DuplicateGroup>,
    total_groups: usize,
    processed_groups: usize,
    files_discovered: usize,
    files_processed: usize,
    summary: Option<ScanSummary>,
    aborted: bool,
}

impl ScanSession {
    /// Start a session for `root`, guarded by `kill_switch`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, kill_switch: KillSwitch) -> Self {
        Self {
            root: root.into(),
            kill_switch,
            pending: VecDeque::new(),
            total_groups: 0,
            processed_groups: 0,
            files_discovered: 0,
            files_processed: 0,
            summary: None,
            aborted: false,
        }
    }

    /// Directory being scanned.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The session's cancellation flag.
    #[must_use]
    pub fn kill_switch(&self) -> &KillSwitch {
        &self.kill_switch
    }

    /// Fold in a progress update from the scan thread.
    pub fn record_progress(&mut self, update: &ProgressUpdate) {
        self.files_discovered = self.files_discovered.max(update.total);
        self.files_processed = self.files_processed.max(update.processed);
    }

    /// Take the scan result. Aborted scans contribute no groups.
    pub fn absorb(&mut self, outcome: ScanOutcome) {
        self.aborted = outcome.is_aborted();
        let (groups, summary) = match outcome {
            ScanOutcome::Completed { groups, summary } => (groups, summary),
            ScanOutcome::Aborted { summary } => (Vec::new(), summary),
        };
        self.files_discovered = summary.total_files;
        self.files_processed = summary.processed_files;
        self.total_groups = groups.len();
        self.pending = groups.into();
        self.summary = Some(summary);
    }

    /// Remove and return the next group to resolve.
    pub fn next_group(&mut self) -> Option<DuplicateGroup> {
        let group = self.pending.pop_front()?;
        self.processed_groups += 1;
        Some(group)
    }

    /// Put previously handed-out groups back at the end of the queue.
    ///
    /// They count as unprocessed again, so the position stays within
    /// `total_groups`.
    pub fn requeue<I>(&mut self, groups: I)
    where
        I: IntoIterator<Item = DuplicateGroup>,
    {
        let before = self.pending.len();
        self.pending.extend(groups);
        let returned = self.pending.len() - before;
        self.processed_groups = self.processed_groups.saturating_sub(returned);
    }

    /// Drop every group not yet resolved.
    pub fn discard_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Groups still waiting.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Groups handed out so far.
    #[must_use]
    pub fn processed_groups(&self) -> usize {
        self.processed_groups
    }

    /// Groups the scan produced.
    #[must_use]
    pub fn total_groups(&self) -> usize {
        self.total_groups
    }

    /// Running total of video files found by the walk.
    #[must_use]
    pub fn files_discovered(&self) -> usize {
        self.files_discovered
    }

    /// Files the scan has processed so far.
    #[must_use]
    pub fn files_processed(&self) -> usize {
        self.files_processed
    }

    /// Scan statistics, once the scan finished.
    #[must_use]
    pub fn summary(&self) -> Option<&ScanSummary> {
        self.summary.as_ref()
    }

    /// Whether the scan was killed.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}
