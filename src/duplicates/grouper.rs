//! Duplicate grouper: walk, fingerprint, bucket.
//!
//! # Overview
//!
//! [`DuplicateGrouper::group`] enumerates the video files under a root,
//! fingerprints them one at a time in walk order, and buckets them by
//! [`Fingerprint`](crate::scanner::Fingerprint). A file that cannot be
//! fingerprinted is logged and left out; it never stops the scan.
//!
//! The kill switch is checked before each file. A cancelled scan returns
//! [`ScanOutcome::Aborted`], which is distinct from a completed scan that
//! found nothing.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use vidupe::duplicates::{DuplicateGrouper, GrouperConfig, ScanOutcome};
//! use vidupe::scanner::FrameExtractor;
//!
//! let grouper = DuplicateGrouper::new(Arc::new(FrameExtractor::default()), GrouperConfig::default());
//! match grouper.group(Path::new("/videos")) {
//!     ScanOutcome::Completed { groups, summary } => {
//!         println!("{} groups from {} files", groups.len(), summary.total_files);
//!     }
//!     ScanOutcome::Aborted { .. } => println!("cancelled"),
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::progress::{NullObserver, ProgressUpdate, ScanObserver};
use crate::scanner::{FingerprintExtractor, VideoWalker};
use crate::signal::KillSwitch;

use super::groups::{DuplicateGroup, FingerprintBuckets};

/// Configuration for a grouping run.
#[derive(Clone, Default)]
pub struct GrouperConfig {
    /// Checked before each file.
    pub kill_switch: Option<KillSwitch>,
    /// Receives log lines and per-file progress.
    pub observer: Option<Arc<dyn ScanObserver>>,
    /// Follow symbolic links during the walk.
    pub follow_symlinks: bool,
}

impl std::fmt::Debug for GrouperConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrouperConfig")
            .field("kill_switch", &self.kill_switch)
            .field("observer", &self.observer.as_ref().map(|_| "<observer>"))
            .field("follow_symlinks", &self.follow_symlinks)
            .finish()
    }
}

impl GrouperConfig {
    /// Set the kill switch.
    #[must_use]
    pub fn with_kill_switch(mut self, kill: KillSwitch) -> Self {
        self.kill_switch = Some(kill);
        self
    }

    /// Set the observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Follow symbolic links.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

/// What happened during one scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanSummary {
    /// Directory that was scanned.
    pub root: PathBuf,
    /// Video files found by the walk.
    pub total_files: usize,
    /// Files the grouper got to before finishing or being cancelled.
    pub processed_files: usize,
    /// Files fingerprinted successfully.
    pub fingerprinted: usize,
    /// Files that could not be fingerprinted, with the reason.
    pub failures: Vec<(PathBuf, String)>,
    /// Walk errors (unreadable directories and the like).
    pub walk_errors: Vec<(PathBuf, String)>,
    /// Duplicate groups found.
    pub duplicate_groups: usize,
    /// Redundant copies across all groups.
    pub duplicate_files: usize,
    /// Bytes freed by keeping one copy per group.
    pub reclaimable_space: u64,
    /// Wall time of the scan.
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize::b(self.reclaimable_space).to_string()
    }
}

/// Result of [`DuplicateGrouper::group`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// The walk finished. `groups` may be empty.
    Completed {
        groups: Vec<DuplicateGroup>,
        summary: ScanSummary,
    },
    /// The kill switch stopped the scan. No groups are reported.
    Aborted { summary: ScanSummary },
}

impl ScanOutcome {
    /// Groups found; empty for an aborted scan.
    #[must_use]
    pub fn groups(&self) -> &[DuplicateGroup] {
        match self {
            Self::Completed { groups, .. } => groups,
            Self::Aborted { .. } => &[],
        }
    }

    /// Scan statistics.
    #[must_use]
    pub fn summary(&self) -> &ScanSummary {
        match self {
            Self::Completed { summary, .. } | Self::Aborted { summary } => summary,
        }
    }

    /// Whether the kill switch ended the scan.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

/// Walks a tree and groups videos by fingerprint.
pub struct DuplicateGrouper {
    extractor: Arc<dyn FingerprintExtractor>,
    config: GrouperConfig,
}

impl std::fmt::Debug for DuplicateGrouper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateGrouper")
            .field("extractor", &"<extractor>")
            .field("config", &self.config)
            .finish()
    }
}

impl DuplicateGrouper {
    /// Create a grouper using `extractor` for every file.
    #[must_use]
    pub fn new(extractor: Arc<dyn FingerprintExtractor>, config: GrouperConfig) -> Self {
        Self { extractor, config }
    }

    fn is_killed(&self) -> bool {
        self.config
            .kill_switch
            .as_ref()
            .is_some_and(KillSwitch::is_triggered)
    }

    fn observer(&self) -> &dyn ScanObserver {
        match &self.config.observer {
            Some(observer) => observer.as_ref(),
            None => &NullObserver,
        }
    }

    /// Scan `root` and group its videos.
    ///
    /// Files are processed strictly in walk order on the calling thread.
    /// Progress is reported after every file, whether or not it could be
    /// fingerprinted.
    pub fn group(&self, root: &Path) -> ScanOutcome {
        let start = Instant::now();
        let observer = self.observer();
        let mut summary = ScanSummary {
            root: root.to_path_buf(),
            ..ScanSummary::default()
        };

        observer.on_log(&format!("Scanning for duplicates in {}...", root.display()));

        let walker = VideoWalker::new(root).with_follow_symlinks(self.config.follow_symlinks);
        let (candidates, walk_errors) = walker.collect();
        for error in walk_errors {
            observer.on_log(&format!("Skipping {}: {}", error.path().display(), error));
            summary
                .walk_errors
                .push((error.path().to_path_buf(), error.to_string()));
        }

        let total = candidates.len();
        summary.total_files = total;
        log::debug!("Found {} candidate videos under {}", total, root.display());

        let mut buckets = FingerprintBuckets::new();
        for (index, path) in candidates.into_iter().enumerate() {
            if self.is_killed() {
                observer.on_log("Scan killed by user.");
                log::info!("Scan cancelled after {} of {} files", index, total);
                summary.scan_duration = start.elapsed();
                return ScanOutcome::Aborted { summary };
            }

            match self.extractor.extract(&path) {
                Ok(fingerprint) => {
                    log::trace!("{} -> {}", path.display(), fingerprint);
                    buckets.insert(fingerprint, path.clone());
                    summary.fingerprinted += 1;
                }
                Err(e) => {
                    observer.on_log(&format!("Failed to fingerprint {}: {}", path.display(), e));
                    summary.failures.push((path.clone(), e.to_string()));
                }
            }

            let processed = index + 1;
            summary.processed_files = processed;
            observer.on_log(&format!(
                "Indexed file {}/{}: {}",
                processed,
                total,
                display_name(&path)
            ));
            observer.on_progress(&ProgressUpdate {
                processed,
                total,
                current_path: path,
            });
        }

        let (groups, stats) = buckets.into_groups();
        log::debug!(
            "{} fingerprints, {} distinct, {} unique",
            stats.total_files,
            stats.distinct_fingerprints,
            stats.unique_files
        );

        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        summary.scan_duration = start.elapsed();

        observer.on_log(&format!("Found {} duplicate groups.", groups.len()));

        ScanOutcome::Completed { groups, summary }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::LogBuffer;
    use crate::scanner::{ExtractError, Fingerprint};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Fingerprints by file content: "hash" text, fixed duration, real size.
    struct ContentExtractor {
        calls: AtomicUsize,
    }

    impl ContentExtractor {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl FingerprintExtractor for ContentExtractor {
        fn extract(&self, path: &Path) -> Result<Fingerprint, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let content = fs::read_to_string(path).map_err(|source| ExtractError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            if content == "corrupt" {
                return Err(ExtractError::NoFrame(path.to_path_buf()));
            }
            Ok(Fingerprint::new(content, 10.0, 2048))
        }
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_group_empty_directory() {
        let dir = TempDir::new().unwrap();
        let grouper = DuplicateGrouper::new(Arc::new(ContentExtractor::new()), GrouperConfig::default());

        let outcome = grouper.group(dir.path());

        assert!(!outcome.is_aborted());
        assert!(outcome.groups().is_empty());
        assert_eq!(outcome.summary().total_files, 0);
    }

    #[test]
    fn test_group_skips_failures() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.mp4", "same");
        write(&dir, "b.mp4", "corrupt");
        write(&dir, "c.mp4", "same");

        let log = LogBuffer::default();
        let grouper = DuplicateGrouper::new(
            Arc::new(ContentExtractor::new()),
            GrouperConfig::default().with_observer(Arc::new(log.clone())),
        );
        let outcome = grouper.group(dir.path());

        assert_eq!(outcome.groups().len(), 1);
        assert_eq!(outcome.groups()[0].len(), 2);
        assert_eq!(outcome.summary().failures.len(), 1);
        assert_eq!(outcome.summary().processed_files, 3);
        assert!(log
            .lines()
            .iter()
            .any(|l| l.starts_with("Failed to fingerprint") && l.contains("b.mp4")));
    }

    #[test]
    fn test_group_ignores_non_videos() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.mp4", "same");
        write(&dir, "a.txt", "same");

        let extractor = Arc::new(ContentExtractor::new());
        let grouper = DuplicateGrouper::new(extractor.clone(), GrouperConfig::default());
        let outcome = grouper.group(dir.path());

        assert!(outcome.groups().is_empty());
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_progress_is_monotonic() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            write(&dir, &format!("{i}.mkv"), "x");
        }

        struct Recorder(std::sync::Mutex<Vec<usize>>);
        impl ScanObserver for Recorder {
            fn on_log(&self, _line: &str) {}
            fn on_progress(&self, update: &ProgressUpdate) {
                assert_eq!(update.total, 5);
                self.0.lock().unwrap().push(update.processed);
            }
        }

        let recorder = Arc::new(Recorder(std::sync::Mutex::new(Vec::new())));
        let grouper = DuplicateGrouper::new(
            Arc::new(ContentExtractor::new()),
            GrouperConfig::default().with_observer(recorder.clone()),
        );
        grouper.group(dir.path());

        assert_eq!(*recorder.0.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_killed_before_start_is_aborted() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.mp4", "same");
        write(&dir, "b.mp4", "same");

        let kill = KillSwitch::new();
        kill.trigger();
        let extractor = Arc::new(ContentExtractor::new());
        let grouper = DuplicateGrouper::new(
            extractor.clone(),
            GrouperConfig::default().with_kill_switch(kill),
        );

        let outcome = grouper.group(dir.path());

        assert!(outcome.is_aborted());
        assert!(outcome.groups().is_empty());
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_summary_totals() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.mp4", "one");
        write(&dir, "b.mp4", "one");
        write(&dir, "c.mp4", "one");

        let grouper = DuplicateGrouper::new(Arc::new(ContentExtractor::new()), GrouperConfig::default());
        let outcome = grouper.group(dir.path());
        let summary = outcome.summary();

        assert_eq!(summary.duplicate_groups, 1);
        assert_eq!(summary.duplicate_files, 2);
        assert_eq!(summary.reclaimable_space, 4096);
        assert_eq!(summary.fingerprinted, 3);
    }
}
