//! Report formatters for the non-interactive front ends.
//!
//! - [`text`]: coloured human-readable report
//! - [`json`]: machine-readable report for scripting
//!
//! Both take the scan outcome, the staged paths and, when `--commit` was
//! given, the deletion result.
//!
//! ```no_run
//! use vidupe::duplicates::{ScanOutcome, ScanSummary};
//! use vidupe::output::JsonOutput;
//!
//! let outcome = ScanOutcome::Completed { groups: vec![], summary: ScanSummary::default() };
//! let output = JsonOutput::new(&outcome, &[]);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;
