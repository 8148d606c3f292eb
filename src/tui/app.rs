//! TUI application state.
//!
//! # Overview
//!
//! [`App`] owns everything the interactive front end needs:
//! - the [`ResolutionWorkflow`] (session, staging ledger, skipped groups)
//! - the [`ScanController`] running the background scan
//! - a [`LogBuffer`] that collects the user-facing log lines
//! - the preview hook and the delete method used on commit
//!
//! The terminal loop calls [`App::tick`] at the poll interval to drain scan
//! events and [`App::handle_action`] for every key the user presses. Nothing
//! here touches the terminal, so the whole state machine is testable without
//! one.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vidupe::scanner::FrameExtractor;
//! use vidupe::session::ResolveMode;
//! use vidupe::tui::{Action, App};
//!
//! let mut app = App::new("/videos", ResolveMode::Manual, Arc::new(FrameExtractor::default()));
//! app.start_scan().unwrap();
//! while !app.should_quit() {
//!     app.tick();
//!     # break;
//! }
//! app.handle_action(Action::Keep(0));
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::actions::{BatchDeleteResult, DeleteMethod, Previewer, SystemPlayer};
use crate::controller::{ControllerError, ScanController, ScanEvent};
use crate::duplicates::{DuplicateGroup, ScanOutcome, ScanSummary};
use crate::progress::{LogBuffer, ProgressUpdate};
use crate::scanner::FingerprintExtractor;
use crate::session::{AutoReport, ResolutionWorkflow, ResolveMode, WorkflowState};
use crate::signal::KillSwitch;

use super::theme::Theme;

/// What the screen shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    /// Background scan running; progress and kill.
    #[default]
    Scanning,
    /// A group is waiting for keep/skip/stop.
    Reviewing,
    /// Asking before deleting the staged files.
    Confirming,
    /// Resolution finished; commit, undo, scan again or quit.
    Done,
    /// Leaving the loop.
    Quitting,
}

impl AppMode {
    /// Check if the application is done (quitting).
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Quitting)
    }
}

/// User intention produced by the key mapping in [`super::events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Move the highlight up within the group.
    NavigateUp,
    /// Move the highlight down within the group.
    NavigateDown,
    /// Keep the member with this index.
    Keep(usize),
    /// Keep the highlighted member.
    KeepSelected,
    /// Play the highlighted member.
    Preview,
    /// Set the group aside.
    Skip,
    /// Abandon the remaining groups.
    Stop,
    /// Unstage the last batch.
    Undo,
    /// Ask to delete the staged files.
    Commit,
    /// Requeue skipped groups.
    RevisitSkipped,
    /// Start another scan of the same directory.
    ScanAgain,
    /// Stop the running scan.
    Kill,
    /// Accept the pending confirmation.
    Confirm,
    /// Dismiss the pending confirmation or message.
    Cancel,
    /// Leave the application.
    Quit,
}

/// Interactive front end state.
pub struct App {
    mode: AppMode,
    root: PathBuf,
    workflow: ResolutionWorkflow,
    controller: ScanController,
    extractor: Arc<dyn FingerprintExtractor>,
    kill_switch: KillSwitch,
    log: LogBuffer,
    previewer: Box<dyn Previewer>,
    delete_method: DeleteMethod,
    selected: usize,
    progress: Option<ProgressUpdate>,
    status: Option<String>,
    last_commit: Option<BatchDeleteResult>,
    auto_report: Option<AutoReport>,
    theme: Theme,
    accessible: bool,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("mode", &self.mode)
            .field("root", &self.root)
            .field("workflow", &self.workflow)
            .field("controller", &self.controller)
            .field("delete_method", &self.delete_method)
            .field("selected", &self.selected)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Create an app that will scan `root`.
    #[must_use]
    pub fn new(
        root: impl Into<PathBuf>,
        mode: ResolveMode,
        extractor: Arc<dyn FingerprintExtractor>,
    ) -> Self {
        let log = LogBuffer::default();
        Self {
            mode: AppMode::Scanning,
            root: root.into(),
            workflow: ResolutionWorkflow::new(mode).with_observer(Arc::new(log.clone())),
            controller: ScanController::new(),
            extractor,
            kill_switch: KillSwitch::new(),
            log,
            previewer: Box::new(SystemPlayer::new()),
            delete_method: DeleteMethod::default(),
            selected: 0,
            progress: None,
            status: None,
            last_commit: None,
            auto_report: None,
            theme: Theme::default(),
            accessible: false,
        }
    }

    /// Share the Ctrl+C kill switch with the scan.
    #[must_use]
    pub fn with_kill_switch(mut self, kill: KillSwitch) -> Self {
        self.kill_switch = kill;
        self
    }

    /// Use a different preview hook.
    #[must_use]
    pub fn with_previewer(mut self, previewer: Box<dyn Previewer>) -> Self {
        self.previewer = previewer;
        self
    }

    /// How staged files are removed on commit.
    #[must_use]
    pub fn with_delete_method(mut self, method: DeleteMethod) -> Self {
        self.delete_method = method;
        self
    }

    /// Scan-event polling cadence.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.controller = ScanController::new().with_poll_interval(interval);
        self
    }

    /// Colour palette.
    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// ASCII borders.
    #[must_use]
    pub fn with_accessible(mut self, accessible: bool) -> Self {
        self.accessible = accessible;
        self
    }

    // ==================== Scan Lifecycle ====================

    /// Start scanning the root directory.
    ///
    /// # Errors
    ///
    /// [`ControllerError`] if the scan thread could not be started. The app
    /// then shows the finished (empty) state.
    pub fn start_scan(&mut self) -> Result<(), ControllerError> {
        if let Err(e) = self.workflow.start_scan(&self.root, self.kill_switch.clone()) {
            self.status = Some(e.to_string());
            return Ok(());
        }

        self.mode = AppMode::Scanning;
        self.selected = 0;
        self.progress = None;
        self.last_commit = None;
        self.auto_report = None;
        self.status = None;
        self.log.clear_progress();

        if let Err(e) = self
            .controller
            .start(&self.root, Arc::clone(&self.extractor), self.kill_switch.clone())
        {
            self.log.push(format!("Could not start scan: {e}"));
            let _ = self.workflow.finish_scan(ScanOutcome::Aborted {
                summary: ScanSummary::default(),
            });
            self.mode = AppMode::Done;
            return Err(e);
        }
        Ok(())
    }

    /// Drain pending scan events. Call at the poll interval.
    pub fn tick(&mut self) {
        for event in self.controller.poll() {
            match event {
                ScanEvent::Log(line) => self.log.push(line),
                ScanEvent::Progress(update) => {
                    self.workflow.record_progress(&update);
                    self.progress = Some(update);
                }
                ScanEvent::Finished(outcome) => self.on_scan_finished(outcome),
            }
        }
    }

    fn on_scan_finished(&mut self, outcome: ScanOutcome) {
        match self.workflow.finish_scan(outcome) {
            Ok(WorkflowState::AutoResolving) => {
                // Per-group lines reach the log through the workflow observer.
                match self.workflow.run_auto(|_, _| {}) {
                    Ok(report) => self.auto_report = Some(report),
                    Err(e) => self.status = Some(e.to_string()),
                }
            }
            Ok(_) => {}
            Err(e) => self.status = Some(e.to_string()),
        }
        self.sync_mode();
    }

    fn sync_mode(&mut self) {
        self.selected = 0;
        self.mode = match self.workflow.state() {
            WorkflowState::Scanning => AppMode::Scanning,
            WorkflowState::ManualReviewing => AppMode::Reviewing,
            WorkflowState::Idle | WorkflowState::AutoResolving | WorkflowState::Done => AppMode::Done,
        };
    }

    // ==================== Actions ====================

    /// Apply a user action. Returns whether it did anything.
    pub fn handle_action(&mut self, action: Action) -> bool {
        match (self.mode, action) {
            (_, Action::Quit) => {
                if self.controller.is_running() {
                    self.controller.kill();
                }
                self.mode = AppMode::Quitting;
                true
            }
            (_, Action::Cancel) if self.status.is_some() => {
                self.status = None;
                true
            }
            (AppMode::Scanning, Action::Kill) => {
                let killed = self.controller.kill();
                if killed {
                    self.log.push("Stopping scan...");
                }
                killed
            }
            (AppMode::Reviewing, Action::NavigateUp) => {
                self.selected = self.selected.saturating_sub(1);
                true
            }
            (AppMode::Reviewing, Action::NavigateDown) => {
                let len = self.current_group().map_or(0, DuplicateGroup::len);
                if self.selected + 1 < len {
                    self.selected += 1;
                }
                true
            }
            (AppMode::Reviewing, Action::Keep(index)) => self.keep(index),
            (AppMode::Reviewing, Action::KeepSelected) => self.keep(self.selected),
            (AppMode::Reviewing, Action::Preview) => {
                if let Err(e) = self.workflow.preview(self.selected, self.previewer.as_ref()) {
                    self.status = Some(e.to_string());
                }
                true
            }
            (AppMode::Reviewing, Action::Skip) => self.apply(|wf| wf.skip()),
            (AppMode::Reviewing, Action::Stop) => self.apply(|wf| wf.stop().map(|_| ())),
            (AppMode::Reviewing | AppMode::Done, Action::Undo) => {
                !self.workflow.undo_last().is_empty()
            }
            (AppMode::Done, Action::Commit) => {
                if self.workflow.staged_count() == 0 {
                    self.status = Some("No files marked for deletion.".to_string());
                    return false;
                }
                self.mode = AppMode::Confirming;
                true
            }
            (AppMode::Confirming, Action::Confirm) => {
                match self.workflow.commit(self.delete_method) {
                    Ok(result) => self.last_commit = Some(result),
                    Err(e) => self.status = Some(e.to_string()),
                }
                self.mode = AppMode::Done;
                true
            }
            (AppMode::Confirming, Action::Cancel) => {
                self.mode = AppMode::Done;
                true
            }
            (AppMode::Done, Action::RevisitSkipped) => {
                self.apply(|wf| wf.revisit_skipped().map(|_| ()))
            }
            (AppMode::Done, Action::ScanAgain) => {
                if let Err(e) = self.workflow.scan_again() {
                    self.status = Some(e.to_string());
                    return false;
                }
                if let Err(e) = self.start_scan() {
                    self.status = Some(e.to_string());
                }
                true
            }
            _ => false,
        }
    }

    fn keep(&mut self, index: usize) -> bool {
        match self.workflow.keep(index) {
            Ok(_) => {
                self.sync_mode();
                true
            }
            Err(e) => {
                self.status = Some(e.to_string());
                false
            }
        }
    }

    fn apply<F>(&mut self, op: F) -> bool
    where
        F: FnOnce(&mut ResolutionWorkflow) -> Result<(), crate::session::WorkflowError>,
    {
        match op(&mut self.workflow) {
            Ok(()) => {
                self.sync_mode();
                true
            }
            Err(e) => {
                self.status = Some(e.to_string());
                false
            }
        }
    }

    // ==================== Accessors ====================

    /// Current screen.
    #[must_use]
    pub fn mode(&self) -> AppMode {
        self.mode
    }

    /// Check if the loop should exit.
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.mode.is_done()
    }

    /// Directory being scanned.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The resolution workflow.
    #[must_use]
    pub fn workflow(&self) -> &ResolutionWorkflow {
        &self.workflow
    }

    /// Group under review.
    #[must_use]
    pub fn current_group(&self) -> Option<&DuplicateGroup> {
        self.workflow.current_group()
    }

    /// Highlighted member index.
    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Latest scan progress.
    #[must_use]
    pub fn progress(&self) -> Option<&ProgressUpdate> {
        self.progress.as_ref()
    }

    /// Most recent log lines, oldest first.
    #[must_use]
    pub fn log_tail(&self, n: usize) -> Vec<String> {
        self.log.tail(n)
    }

    /// Error or notice to show over the content.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Result of the last commit in this run.
    #[must_use]
    pub fn last_commit(&self) -> Option<&BatchDeleteResult> {
        self.last_commit.as_ref()
    }

    /// What auto resolution did after the last scan.
    #[must_use]
    pub fn auto_report(&self) -> Option<&AutoReport> {
        self.auto_report.as_ref()
    }

    /// Whether a scan is in flight.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.controller.is_running()
    }

    /// Scan-event polling cadence.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.controller.poll_interval()
    }

    /// Delete method used on commit.
    #[must_use]
    pub fn delete_method(&self) -> DeleteMethod {
        self.delete_method
    }

    /// Colour palette.
    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Whether ASCII borders are in use.
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.accessible
    }
}
