//! Session module: the state of one scan-and-resolve run.
//!
//! * [`data`]: [`ScanSession`], the groups of one scan and its running totals.
//! * [`workflow`]: [`ResolutionWorkflow`], the state machine that turns
//!   groups into staged deletions in auto or manual mode.

pub mod data;
pub mod workflow;

pub use data::ScanSession;
pub use workflow::{AutoReport, ResolutionWorkflow, ResolveMode, WorkflowError, WorkflowState};
