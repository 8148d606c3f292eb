//! Scan observers: the log and progress sink the core reports through.
//!
//! The core never touches presentation state. It emits human-readable log
//! lines and [`ProgressUpdate`] tuples through a [`ScanObserver`], and each
//! front end supplies its own implementation:
//!
//! - [`ConsoleProgress`]: indicatif progress bar for console output
//! - [`LogBuffer`]: bounded in-memory log used by the TUI and tests
//! - [`NullObserver`]: discards everything
//!
//! # Accessible Mode
//!
//! When accessible mode is enabled the console bar uses ASCII characters
//! only and a plain template without colours.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indicatif::{ProgressBar, ProgressStyle};

/// Per-file scan progress: `(processed, total, current_path)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    /// Files processed so far (1-based once the first file is done).
    pub processed: usize,
    /// Video files found by the walk.
    pub total: usize,
    /// File that was just processed.
    pub current_path: PathBuf,
}

impl ProgressUpdate {
    /// Completion as a percentage in `0..=100`.
    #[must_use]
    pub fn percentage(&self) -> u16 {
        if self.total == 0 {
            0
        } else {
            ((self.processed.min(self.total) * 100) / self.total) as u16
        }
    }
}

/// Sink for scan log lines and progress.
///
/// Implementations must be cheap; they are called once per file from the
/// scan thread.
pub trait ScanObserver: Send + Sync {
    /// A human-readable log line.
    fn on_log(&self, line: &str);

    /// Progress after one file.
    fn on_progress(&self, update: &ProgressUpdate);
}

impl<T: ScanObserver + ?Sized> ScanObserver for Arc<T> {
    fn on_log(&self, line: &str) {
        (**self).on_log(line);
    }

    fn on_progress(&self, update: &ProgressUpdate) {
        (**self).on_progress(update);
    }
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ScanObserver for NullObserver {
    fn on_log(&self, _line: &str) {}
    fn on_progress(&self, _update: &ProgressUpdate) {}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bounded log of the most recent lines plus the latest progress.
///
/// Cloning shares the same buffer.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    inner: Arc<Mutex<LogState>>,
}

#[derive(Debug)]
struct LogState {
    lines: VecDeque<String>,
    capacity: usize,
    progress: Option<ProgressUpdate>,
}

impl LogBuffer {
    /// Default number of retained lines.
    pub const DEFAULT_CAPACITY: usize = 500;

    /// Create a buffer keeping at most `capacity` lines.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LogState {
                lines: VecDeque::with_capacity(capacity.min(1024)),
                capacity: capacity.max(1),
                progress: None,
            })),
        }
    }

    /// Append a line, dropping the oldest when full.
    pub fn push(&self, line: impl Into<String>) {
        let mut state = lock(&self.inner);
        if state.lines.len() == state.capacity {
            state.lines.pop_front();
        }
        state.lines.push_back(line.into());
    }

    /// Snapshot of all retained lines, oldest first.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        lock(&self.inner).lines.iter().cloned().collect()
    }

    /// The last `n` lines, oldest first.
    #[must_use]
    pub fn tail(&self, n: usize) -> Vec<String> {
        let state = lock(&self.inner);
        let skip = state.lines.len().saturating_sub(n);
        state.lines.iter().skip(skip).cloned().collect()
    }

    /// Latest progress update, if any.
    #[must_use]
    pub fn progress(&self) -> Option<ProgressUpdate> {
        lock(&self.inner).progress.clone()
    }

    /// Forget the progress update (a new scan is starting).
    pub fn clear_progress(&self) {
        lock(&self.inner).progress = None;
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl ScanObserver for LogBuffer {
    fn on_log(&self, line: &str) {
        self.push(line);
    }

    fn on_progress(&self, update: &ProgressUpdate) {
        lock(&self.inner).progress = Some(update.clone());
    }
}

/// Console progress bar using indicatif.
///
/// The bar is created lazily on the first update because the total is only
/// known once the walk has finished. Log lines are printed above the bar.
pub struct ConsoleProgress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
    accessible: bool,
}

impl ConsoleProgress {
    /// Create a console reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is displayed.
    /// * `accessible` - If true, uses ASCII output without colour.
    #[must_use]
    pub fn new(quiet: bool, accessible: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
            accessible,
        }
    }

    /// Check if accessible mode is enabled.
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.accessible
    }

    fn style(&self) -> ProgressStyle {
        if self.accessible {
            ProgressStyle::with_template("[{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-")
        } else {
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} (ETA: {eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█>-")
        }
    }

    /// Show auto-resolution progress after `done` of `total` groups.
    ///
    /// Reuses the bar slot the scan has already cleared; the bar is removed
    /// once every group is resolved.
    pub fn on_group_resolved(&self, done: usize, total: usize) {
        if self.quiet {
            return;
        }

        let mut slot = lock(&self.bar);
        let bar = slot.get_or_insert_with(|| {
            let bar = ProgressBar::new(total as u64);
            bar.set_style(self.style());
            bar.set_message("resolving groups");
            bar
        });
        bar.set_position(done as u64);

        if done >= total {
            bar.finish_and_clear();
            *slot = None;
        }
    }

    /// Finish and remove the bar, if one is showing.
    pub fn finish(&self) {
        if let Some(bar) = lock(&self.bar).take() {
            bar.finish_and_clear();
        }
    }
}

impl std::fmt::Debug for ConsoleProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleProgress")
            .field("quiet", &self.quiet)
            .field("accessible", &self.accessible)
            .finish()
    }
}

impl ScanObserver for ConsoleProgress {
    fn on_log(&self, line: &str) {
        if self.quiet {
            return;
        }
        match lock(&self.bar).as_ref() {
            Some(bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn on_progress(&self, update: &ProgressUpdate) {
        if self.quiet {
            return;
        }

        let mut slot = lock(&self.bar);
        let bar = slot.get_or_insert_with(|| {
            let bar = ProgressBar::new(update.total as u64);
            bar.set_style(self.style());
            bar
        });

        bar.set_position(update.processed as u64);
        bar.set_message(truncate_path(&update.current_path.to_string_lossy(), 30));

        if update.processed >= update.total {
            bar.finish_and_clear();
            *slot = None;
        }
    }
}

/// Truncate a path for display in the progress bar, keeping the file name.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let count = file_name.chars().count();
    if count + 4 > max_len {
        let tail: String = file_name.chars().skip(count + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
