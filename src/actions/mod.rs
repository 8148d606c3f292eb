//! File actions module.
//!
//! This module provides functionality for:
//! - Staging files for deletion with single-batch undo
//! - Committing staged files (permanent or recycle bin)
//! - Handing a video to the system player for preview
//!
//! ```no_run
//! use vidupe::actions::{DeleteMethod, NoProgress, StagingLedger};
//! use std::path::PathBuf;
//!
//! let mut ledger = StagingLedger::new();
//! ledger.stage([PathBuf::from("/videos/copy.mp4")]);
//! let result = ledger.commit_all(DeleteMethod::Permanent, &NoProgress);
//! println!("{}", result.summary());
//! ```

pub mod delete;
pub mod preview;
pub mod staging;

// Re-export commonly used types
pub use delete::{
    delete_batch, delete_file, delete_to_trash, permanent_delete, BatchDeleteResult,
    DeleteError, DeleteMethod, DeleteProgressCallback, DeleteResult, NoProgress,
};
pub use preview::{PreviewError, Previewer, SystemPlayer};
pub use staging::StagingLedger;
