//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Fingerprint bucketing in discovery order
//! - The sequential, cancellable grouping pass over a directory tree

pub mod grouper;
pub mod groups;

pub use grouper::{DuplicateGrouper, GrouperConfig, ScanOutcome, ScanSummary};
pub use groups::{group_by_fingerprint, DuplicateGroup, FingerprintBuckets, GroupingStats};
