//! Staging ledger: files marked for deletion but still on disk.
//!
//! # Overview
//!
//! [`StagingLedger`] holds the set of staged paths in the order they were
//! staged, plus the most recent staging batch. Only that one batch can be
//! undone; staging a new batch replaces it. Nothing touches the disk until
//! [`StagingLedger::commit_all`], which deletes every staged file and then
//! clears the ledger whatever the outcome.
//!
//! # Example
//!
//! ```
//! use vidupe::actions::StagingLedger;
//! use std::path::PathBuf;
//!
//! let mut ledger = StagingLedger::new();
//! ledger.stage([PathBuf::from("/a.mp4")]);
//! ledger.stage([PathBuf::from("/b.mp4")]);
//!
//! assert_eq!(ledger.undo_last(), vec![PathBuf::from("/b.mp4")]);
//! assert!(ledger.is_staged(&PathBuf::from("/a.mp4")));
//! assert!(ledger.undo_last().is_empty());
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::delete::{delete_batch, BatchDeleteResult, DeleteMethod, DeleteProgressCallback};

/// Staged paths plus the last-batch undo record.
#[derive(Debug, Default, Clone)]
pub struct StagingLedger {
    order: Vec<PathBuf>,
    members: HashSet<PathBuf>,
    last_batch: Option<Vec<PathBuf>>,
}

impl StagingLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `paths` for deletion.
    ///
    /// Paths already staged are ignored. The newly staged paths become the
    /// undo target, replacing any earlier one; they are also returned so the
    /// caller can log each exactly once.
    pub fn stage<I>(&mut self, paths: I) -> Vec<PathBuf>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut added = Vec::new();
        for path in paths {
            if self.members.insert(path.clone()) {
                self.order.push(path.clone());
                added.push(path);
            }
        }

        self.last_batch = (!added.is_empty()).then(|| added.clone());
        log::debug!("Staged {} new file(s), {} total", added.len(), self.order.len());
        added
    }

    /// Unstage the most recent batch.
    ///
    /// Returns the unstaged paths; empty if there was nothing to undo.
    /// Committed files are never restored.
    pub fn undo_last(&mut self) -> Vec<PathBuf> {
        let Some(batch) = self.last_batch.take() else {
            return Vec::new();
        };

        let removed: HashSet<&PathBuf> = batch.iter().collect();
        self.order.retain(|p| !removed.contains(p));
        for path in &batch {
            self.members.remove(path);
        }

        log::debug!("Unstaged {} file(s), {} remain", batch.len(), self.order.len());
        batch
    }

    /// Delete every staged file, then clear the ledger.
    ///
    /// Per-file failures are logged and returned in the result; they do not
    /// stop the remaining deletions and are not re-staged.
    pub fn commit_all<C: DeleteProgressCallback + ?Sized>(
        &mut self,
        method: DeleteMethod,
        callback: &C,
    ) -> BatchDeleteResult {
        let staged = std::mem::take(&mut self.order);
        self.members.clear();
        self.last_batch = None;

        delete_batch(&staged, method, callback)
    }

    /// Drop all staging without touching the disk.
    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
        self.last_batch = None;
    }

    /// Check whether `path` is staged.
    #[must_use]
    pub fn is_staged(&self, path: &Path) -> bool {
        self.members.contains(path)
    }

    /// Staged paths in staging order.
    #[must_use]
    pub fn staged(&self) -> &[PathBuf] {
        &self.order
    }

    /// Number of staged paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check whether nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Check whether `undo_last` would do anything.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.last_batch.is_some()
    }

    /// Total size on disk of the staged files that still exist.
    #[must_use]
    pub fn staged_bytes(&self) -> u64 {
        self.order
            .iter()
            .filter_map(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .sum()
    }
}
