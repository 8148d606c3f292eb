//! Human-readable report for the console front end.
//!
//! Colour comes from `yansi` and is switched off globally by `--no-color`
//! (see [`crate::run_app`]), so rendering here never checks the flag.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::PathBuf;

use bytesize::ByteSize;
use yansi::Paint;

use crate::actions::BatchDeleteResult;
use crate::duplicates::ScanOutcome;
use crate::session::AutoReport;

/// Text rendering of a finished run.
#[derive(Debug, Clone)]
pub struct TextOutput<'a> {
    outcome: &'a ScanOutcome,
    staged: &'a [PathBuf],
    auto: Option<AutoReport>,
    deleted: Option<&'a BatchDeleteResult>,
}

impl<'a> TextOutput<'a> {
    /// Report on `outcome` with the given staged paths.
    #[must_use]
    pub fn new(outcome: &'a ScanOutcome, staged: &'a [PathBuf]) -> Self {
        Self {
            outcome,
            staged,
            auto: None,
            deleted: None,
        }
    }

    /// Include what auto resolution did.
    #[must_use]
    pub fn with_auto_report(mut self, report: &AutoReport) -> Self {
        self.auto = Some(*report);
        self
    }

    /// Include the result of committing the staged files.
    #[must_use]
    pub fn with_deleted(mut self, result: &'a BatchDeleteResult) -> Self {
        self.deleted = Some(result);
        self
    }

    /// Render the full report.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let summary = self.outcome.summary();

        if self.outcome.is_aborted() {
            let _ = writeln!(
                out,
                "{} after {} of {} files.",
                "Scan aborted".red().bold(),
                summary.processed_files,
                summary.total_files
            );
            return out;
        }

        for group in self.outcome.groups() {
            let _ = writeln!(out, "{}", group.header().cyan().bold());
            for (index, path) in group.paths().iter().enumerate() {
                let marker = if self.staged.contains(path) {
                    "delete".red().to_string()
                } else {
                    "keep".green().to_string()
                };
                let _ = writeln!(out, " [{index}] {} ({marker})", path.display());
            }
            out.push('\n');
        }

        let _ = writeln!(
            out,
            "{} {} files, {} fingerprinted, {} failed, {} groups, {} reclaimable ({:.1}s)",
            "Summary:".bold(),
            summary.total_files,
            summary.fingerprinted,
            summary.failures.len(),
            summary.duplicate_groups,
            summary.reclaimable_display(),
            summary.scan_duration.as_secs_f64()
        );

        for (path, reason) in &summary.failures {
            let _ = writeln!(out, "  {} {}: {}", "skipped".yellow(), path.display(), reason.dim());
        }

        if let Some(auto) = &self.auto {
            let verb = if auto.cancelled { "stopped after" } else { "resolved" };
            let _ = writeln!(
                out,
                "{} {} {} of {} groups, {} files marked for deletion.",
                "Auto mode".bold(),
                verb,
                auto.groups_processed,
                auto.total_groups,
                auto.files_staged
            );
        }

        match self.deleted {
            Some(result) => {
                let _ = writeln!(out, "{}", result.summary().green());
                for (path, reason) in &result.failures {
                    let _ = writeln!(out, "  {} {}: {}", "failed".red(), path.display(), reason);
                }
            }
            None if !self.staged.is_empty() => {
                let bytes: u64 = self
                    .staged
                    .iter()
                    .filter_map(|p| std::fs::metadata(p).ok())
                    .map(|m| m.len())
                    .sum();
                let _ = writeln!(
                    out,
                    "{} files marked for deletion ({}). Re-run with --commit to delete them.",
                    self.staged.len(),
                    ByteSize::b(bytes)
                );
            }
            None => {}
        }

        out
    }

    /// Write the report to `writer`.
    ///
    /// # Errors
    ///
    /// I/O failure.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.render().as_bytes())
    }
}
