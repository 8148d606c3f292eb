//! Scan controller: runs the duplicate grouper on a background thread.
//!
//! The worker thread talks to the foreground only through an unbounded
//! `std::sync::mpsc` channel of [`ScanEvent`]s. The foreground drains the
//! channel with [`ScanController::poll`] at a fixed cadence and never blocks
//! on the scan. [`ScanEvent::Finished`] is always the last event of a scan.
//!
//! ```no_run
//! use std::sync::Arc;
//! use vidupe::controller::ScanController;
//! use vidupe::scanner::FrameExtractor;
//! use vidupe::signal::KillSwitch;
//!
//! let mut controller = ScanController::new();
//! controller
//!     .start("/videos", Arc::new(FrameExtractor::default()), KillSwitch::new())
//!     .unwrap();
//! let outcome = controller.wait(|event| println!("{event:?}"));
//! ```

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

use crate::duplicates::{DuplicateGrouper, GrouperConfig, ScanOutcome};
use crate::progress::{ProgressUpdate, ScanObserver};
use crate::scanner::FingerprintExtractor;
use crate::signal::KillSwitch;

/// Default foreground polling cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors starting a background scan.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A scan is already in flight.
    #[error("a scan is already running")]
    AlreadyRunning,

    /// The worker thread could not be created.
    #[error("failed to spawn scan thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Message from the scan thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// A log line.
    Log(String),
    /// Progress after one file.
    Progress(ProgressUpdate),
    /// The scan ended. Always the last event.
    Finished(ScanOutcome),
}

/// Forwards observer calls into the event channel.
struct ChannelObserver {
    tx: Sender<ScanEvent>,
}

impl ScanObserver for ChannelObserver {
    fn on_log(&self, line: &str) {
        // A closed channel means the foreground is gone; nothing left to tell.
        let _ = self.tx.send(ScanEvent::Log(line.to_string()));
    }

    fn on_progress(&self, update: &ProgressUpdate) {
        let _ = self.tx.send(ScanEvent::Progress(update.clone()));
    }
}

/// Owns at most one background scan.
#[derive(Debug)]
pub struct ScanController {
    handle: Option<JoinHandle<()>>,
    events: Option<Receiver<ScanEvent>>,
    kill_switch: KillSwitch,
    poll_interval: Duration,
    follow_symlinks: bool,
}

impl Default for ScanController {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanController {
    /// Create an idle controller.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handle: None,
            events: None,
            kill_switch: KillSwitch::new(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            follow_symlinks: false,
        }
    }

    /// Set the polling cadence used by [`wait`](Self::wait) and front ends.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Follow symbolic links during the walk.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Polling cadence.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Whether a scan is in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.events.is_some()
    }

    /// Start scanning `root` on a background thread.
    ///
    /// `kill` is reset and becomes the scan's cancellation flag.
    ///
    /// # Errors
    ///
    /// [`ControllerError::AlreadyRunning`] if a scan is in flight, or
    /// [`ControllerError::Spawn`] if the thread could not be created.
    pub fn start(
        &mut self,
        root: impl Into<PathBuf>,
        extractor: Arc<dyn FingerprintExtractor>,
        kill: KillSwitch,
    ) -> Result<(), ControllerError> {
        if self.is_running() {
            return Err(ControllerError::AlreadyRunning);
        }

        let root = root.into();
        kill.reset();
        self.kill_switch = kill.clone();

        let (tx, rx) = mpsc::channel();
        let config = GrouperConfig::default()
            .with_kill_switch(kill)
            .with_follow_symlinks(self.follow_symlinks)
            .with_observer(Arc::new(ChannelObserver { tx: tx.clone() }));

        let handle = thread::Builder::new()
            .name("vidupe-scan".to_string())
            .spawn(move || {
                let outcome = DuplicateGrouper::new(extractor, config).group(&root);
                let _ = tx.send(ScanEvent::Finished(outcome));
            })
            .map_err(ControllerError::Spawn)?;

        log::debug!("Scan thread started");
        self.handle = Some(handle);
        self.events = Some(rx);
        Ok(())
    }

    /// Drain every queued event without blocking.
    ///
    /// Once `Finished` is seen the worker is joined and the controller
    /// becomes idle.
    pub fn poll(&mut self) -> Vec<ScanEvent> {
        let Some(rx) = self.events.as_ref() else {
            return Vec::new();
        };

        let mut drained = Vec::new();
        let mut finished = false;
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    finished = matches!(event, ScanEvent::Finished(_));
                    drained.push(event);
                    if finished {
                        break;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    // Worker died without reporting; treat the scan as killed.
                    log::error!("Scan thread exited without a result");
                    drained.push(ScanEvent::Finished(ScanOutcome::Aborted {
                        summary: Default::default(),
                    }));
                    finished = true;
                    break;
                }
            }
        }

        if finished {
            self.finish();
        }
        drained
    }

    fn finish(&mut self) {
        self.events = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Scan thread panicked");
            }
        }
    }

    /// Request cancellation of the running scan.
    ///
    /// Returns `false` when no scan is running.
    pub fn kill(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.kill_switch.trigger();
        true
    }

    /// Block until the scan finishes, polling at the configured cadence.
    ///
    /// Every event, including `Finished`, is passed to `on_event`. Returns
    /// the outcome, or `None` if no scan was running.
    pub fn wait<F>(&mut self, mut on_event: F) -> Option<ScanOutcome>
    where
        F: FnMut(&ScanEvent),
    {
        while self.is_running() {
            for event in self.poll() {
                on_event(&event);
                if let ScanEvent::Finished(outcome) = event {
                    return Some(outcome);
                }
            }
            thread::sleep(self.poll_interval);
        }
        None
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        if self.is_running() {
            self.kill_switch.trigger();
            self.finish();
        }
    }
}
