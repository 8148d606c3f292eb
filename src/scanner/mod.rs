//! Scanner module for video discovery and fingerprinting.
//!
//! This module provides functionality for:
//! - Sequential directory walking filtered to video extensions
//! - Probing duration and grabbing a representative frame with ffmpeg
//! - Perceptual hashing of that frame
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and video discovery
//! - [`probe`]: `ffprobe`/`ffmpeg` invocation
//! - [`perceptual`]: Perceptual hash of a decoded frame
//! - [`fingerprint`]: The [`Fingerprint`] key and the extractor seam
//!
//! # Example
//!
//! ```no_run
//! use vidupe::scanner::{FingerprintExtractor, FrameExtractor, VideoWalker};
//! use std::path::Path;
//!
//! let extractor = FrameExtractor::default();
//! for entry in VideoWalker::new(Path::new("/videos")).walk() {
//!     match entry.map(|path| extractor.extract(&path)) {
//!         Ok(Ok(fp)) => println!("{fp}"),
//!         Ok(Err(e)) => eprintln!("Skipping: {e}"),
//!         Err(e) => eprintln!("Warning: {e}"),
//!     }
//! }
//! ```

pub mod fingerprint;
pub mod perceptual;
pub mod probe;
pub mod walker;

use std::path::{Path, PathBuf};

pub use fingerprint::{ExtractError, Fingerprint, FingerprintExtractor, FramePolicy};
pub use perceptual::PerceptualHasher;
pub use probe::{FrameExtractor, ProbeConfig};
pub use walker::VideoWalker;

/// File extensions treated as videos. Matched case-insensitively.
pub const VIDEO_EXTENSIONS: [&str; 5] = ["mp4", "mov", "avi", "mkv", "webm"];

/// Check whether a path carries one of the [`VIDEO_EXTENSIONS`].
///
/// # Examples
///
/// ```
/// use vidupe::scanner::is_video_file;
/// use std::path::Path;
///
/// assert!(is_video_file(Path::new("holiday.MP4")));
/// assert!(!is_video_file(Path::new("notes.txt")));
/// ```
#[must_use]
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// A symlink loop was detected while walking.
    #[error("Filesystem loop at {0}")]
    Loop(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::Loop(p) => p,
            Self::Io { path, .. } => path,
        }
    }
}
