//! JSON report.
//!
//! # Schema
//!
//! ```json
//! {
//!   "generated_at": "2026-01-01T12:00:00Z",
//!   "root": "/videos",
//!   "aborted": false,
//!   "groups": [
//!     {
//!       "fingerprint": ["c3a1f0e2b4d69788", 10.0, 2048],
//!       "files": ["/videos/a.mp4", "/videos/copy/a.mp4"]
//!     }
//!   ],
//!   "staged": ["/videos/copy/a.mp4"],
//!   "auto": { "groups_processed": 1, "total_groups": 1, "files_staged": 1, "cancelled": false },
//!   "deleted": null,
//!   "summary": {
//!     "total_files": 12,
//!     "fingerprinted": 11,
//!     "failed": 1,
//!     "duplicate_groups": 1,
//!     "duplicate_files": 1,
//!     "reclaimable_space": 2048,
//!     "scan_duration_ms": 830
//!   }
//! }
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::actions::BatchDeleteResult;
use crate::duplicates::{DuplicateGroup, ScanOutcome, ScanSummary};
use crate::scanner::Fingerprint;
use crate::session::AutoReport;

/// One group.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// `[hash, duration, size]`.
    pub fingerprint: Fingerprint,
    /// Members in discovery order.
    pub files: Vec<String>,
}

impl JsonGroup {
    fn from_group(group: &DuplicateGroup) -> Self {
        Self {
            fingerprint: group.fingerprint().clone(),
            files: group.paths().iter().map(|p| display_path(p)).collect(),
        }
    }
}

/// Scan statistics.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub total_files: usize,
    pub fingerprinted: usize,
    pub failed: usize,
    pub duplicate_groups: usize,
    pub duplicate_files: usize,
    pub reclaimable_space: u64,
    pub scan_duration_ms: u64,
}

impl From<&ScanSummary> for JsonSummary {
    fn from(summary: &ScanSummary) -> Self {
        Self {
            total_files: summary.total_files,
            fingerprinted: summary.fingerprinted,
            failed: summary.failures.len(),
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
        }
    }
}

/// Outcome of `--commit`.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDeleted {
    pub files: Vec<String>,
    pub failures: Vec<JsonFailure>,
    pub bytes_freed: u64,
}

/// A file that could not be deleted.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFailure {
    pub path: String,
    pub reason: String,
}

impl From<&BatchDeleteResult> for JsonDeleted {
    fn from(result: &BatchDeleteResult) -> Self {
        Self {
            files: result.successes.iter().map(|r| display_path(&r.path)).collect(),
            failures: result
                .failures
                .iter()
                .map(|(path, reason)| JsonFailure {
                    path: display_path(path),
                    reason: reason.clone(),
                })
                .collect(),
            bytes_freed: result.bytes_freed,
        }
    }
}

/// What auto resolution did.
#[derive(Debug, Clone, Serialize)]
pub struct JsonAuto {
    pub groups_processed: usize,
    pub total_groups: usize,
    pub files_staged: usize,
    pub cancelled: bool,
}

impl From<&AutoReport> for JsonAuto {
    fn from(report: &AutoReport) -> Self {
        Self {
            groups_processed: report.groups_processed,
            total_groups: report.total_groups,
            files_staged: report.files_staged,
            cancelled: report.cancelled,
        }
    }
}

/// The whole report.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub generated_at: DateTime<Utc>,
    pub root: String,
    pub aborted: bool,
    pub groups: Vec<JsonGroup>,
    pub staged: Vec<String>,
    pub auto: Option<JsonAuto>,
    pub deleted: Option<JsonDeleted>,
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build a report for `outcome` with the given staged paths.
    #[must_use]
    pub fn new(outcome: &ScanOutcome, staged: &[PathBuf]) -> Self {
        let summary = outcome.summary();
        Self {
            generated_at: Utc::now(),
            root: display_path(&summary.root),
            aborted: outcome.is_aborted(),
            groups: outcome.groups().iter().map(JsonGroup::from_group).collect(),
            staged: staged.iter().map(|p| display_path(p)).collect(),
            auto: None,
            deleted: None,
            summary: JsonSummary::from(summary),
        }
    }

    /// Attach the auto-resolution report.
    #[must_use]
    pub fn with_auto_report(mut self, report: &AutoReport) -> Self {
        self.auto = Some(JsonAuto::from(report));
        self
    }

    /// Attach the result of committing the staged files.
    #[must_use]
    pub fn with_deleted(mut self, result: &BatchDeleteResult) -> Self {
        self.deleted = Some(JsonDeleted::from(result));
        self
    }

    /// Compact JSON.
    ///
    /// # Errors
    ///
    /// Only if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Indented JSON.
    ///
    /// # Errors
    ///
    /// Only if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report followed by a newline.
    ///
    /// # Errors
    ///
    /// Serialization or I/O failure.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Errors writing the JSON report.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
