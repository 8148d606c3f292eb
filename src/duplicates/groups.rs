//! Fingerprint buckets and duplicate groups.
//!
//! # Overview
//!
//! Files are bucketed by exact [`Fingerprint`] equality. Buckets keep the
//! order in which their first member was discovered, and members keep
//! discovery order, so the first path of a group is always the earliest
//! file seen with that fingerprint. Only buckets with two or more members
//! become [`DuplicateGroup`]s.
//!
//! # Example
//!
//! ```
//! use vidupe::duplicates::group_by_fingerprint;
//! use vidupe::scanner::Fingerprint;
//! use std::path::PathBuf;
//!
//! let fp = Fingerprint::new("abc123", 10.0, 2048);
//! let files = vec![
//!     (PathBuf::from("/a.mp4"), fp.clone()),
//!     (PathBuf::from("/b.mp4"), fp.clone()),
//!     (PathBuf::from("/c.mp4"), Fingerprint::new("zzz999", 10.0, 2048)),
//! ];
//!
//! let (groups, stats) = group_by_fingerprint(files);
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].paths(), vec![PathBuf::from("/a.mp4"), PathBuf::from("/b.mp4")]);
//! assert_eq!(stats.unique_files, 1);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::scanner::Fingerprint;

/// Files sharing one fingerprint. Always holds at least two paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    fingerprint: Fingerprint,
    paths: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Create a group. Returns `None` for fewer than two paths.
    #[must_use]
    pub fn new(fingerprint: Fingerprint, paths: Vec<PathBuf>) -> Option<Self> {
        (paths.len() >= 2).then_some(Self { fingerprint, paths })
    }

    /// Shared fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Member paths in discovery order. Index 0 is the keep candidate.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Groups are never empty; provided for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Byte size shared by every member.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.fingerprint.size()
    }

    /// Every member except index `keep`, in discovery order.
    ///
    /// Returns `None` if `keep` is out of range.
    #[must_use]
    pub fn all_except(&self, keep: usize) -> Option<Vec<PathBuf>> {
        (keep < self.paths.len()).then(|| {
            self.paths
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != keep)
                .map(|(_, p)| p.clone())
                .collect()
        })
    }

    /// Number of redundant copies.
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }

    /// Bytes freed by keeping one copy.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size() * self.duplicate_count() as u64
    }

    /// One-line header used in logs and the review screen.
    #[must_use]
    pub fn header(&self) -> String {
        format!(
            "Duplicate Group: Hash={} | Duration={}s | Size={} bytes",
            self.fingerprint.visual_hash(),
            self.fingerprint.duration_display(),
            self.size()
        )
    }
}

/// Statistics from fingerprint bucketing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Fingerprinted files fed into the buckets.
    pub total_files: usize,
    /// Distinct fingerprints seen.
    pub distinct_fingerprints: usize,
    /// Files whose fingerprint matched no other file.
    pub unique_files: usize,
    /// Buckets with 2+ members.
    pub duplicate_groups: usize,
}

/// Insertion-ordered fingerprint buckets.
#[derive(Debug, Default)]
pub struct FingerprintBuckets {
    index: HashMap<Fingerprint, usize>,
    buckets: Vec<(Fingerprint, Vec<PathBuf>)>,
    total: usize,
}

impl FingerprintBuckets {
    /// Create empty buckets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` to the bucket for `fingerprint`.
    pub fn insert(&mut self, fingerprint: Fingerprint, path: PathBuf) {
        self.total += 1;
        if let Some(&slot) = self.index.get(&fingerprint) {
            self.buckets[slot].1.push(path);
        } else {
            self.index.insert(fingerprint.clone(), self.buckets.len());
            self.buckets.push((fingerprint, vec![path]));
        }
    }

    /// Consume the buckets, keeping those with 2+ members.
    #[must_use]
    pub fn into_groups(self) -> (Vec<DuplicateGroup>, GroupingStats) {
        let mut stats = GroupingStats {
            total_files: self.total,
            distinct_fingerprints: self.buckets.len(),
            ..GroupingStats::default()
        };

        let groups: Vec<DuplicateGroup> = self
            .buckets
            .into_iter()
            .filter_map(|(fingerprint, paths)| {
                if paths.len() == 1 {
                    stats.unique_files += 1;
                }
                DuplicateGroup::new(fingerprint, paths)
            })
            .collect();

        stats.duplicate_groups = groups.len();
        (groups, stats)
    }
}

/// Bucket `(path, fingerprint)` pairs and keep the duplicate groups.
pub fn group_by_fingerprint<I>(files: I) -> (Vec<DuplicateGroup>, GroupingStats)
where
    I: IntoIterator<Item = (PathBuf, Fingerprint)>,
{
    let mut buckets = FingerprintBuckets::new();
    for (path, fingerprint) in files {
        buckets.insert(fingerprint, path);
    }
    buckets.into_groups()
}
