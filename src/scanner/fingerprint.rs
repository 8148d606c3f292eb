//! Video fingerprints and the extractor seam.
//!
//! A [`Fingerprint`] is the `(visual_hash, duration, size)` key two videos
//! must share to be reported as duplicates. The duration is kept as whole
//! tenths of a second so the key can be hashed and compared exactly.
//!
//! The key renders and serializes as a 3-tuple:
//!
//! ```
//! use vidupe::scanner::Fingerprint;
//!
//! let fp = Fingerprint::new("abc123", 10.0, 2048);
//! assert_eq!(fp.to_string(), "(abc123, 10.0, 2048)");
//! assert_eq!(serde_json::to_string(&fp).unwrap(), r#"["abc123",10.0,2048]"#);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Duplicate-equality key of one video file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "(String, f64, u64)", try_from = "(String, f64, u64)")]
pub struct Fingerprint {
    visual_hash: String,
    duration_tenths: u64,
    size: u64,
}

impl Fingerprint {
    /// Build a fingerprint, rounding `duration_secs` to one decimal place.
    ///
    /// Negative or non-finite durations are clamped to zero; extractors
    /// reject them before getting here.
    #[must_use]
    pub fn new(visual_hash: impl Into<String>, duration_secs: f64, size: u64) -> Self {
        Self {
            visual_hash: visual_hash.into(),
            duration_tenths: round_to_tenths(duration_secs),
            size,
        }
    }

    /// Perceptual hash of the representative frame.
    #[must_use]
    pub fn visual_hash(&self) -> &str {
        &self.visual_hash
    }

    /// Duration in seconds, rounded to 0.1.
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        self.duration_tenths as f64 / 10.0
    }

    /// File size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Duration formatted with exactly one decimal, e.g. `10.0`.
    #[must_use]
    pub fn duration_display(&self) -> String {
        format!("{}.{}", self.duration_tenths / 10, self.duration_tenths % 10)
    }
}

/// Round to one decimal the way the decimal value of `secs` rounds, ties to
/// even: 1.45 is stored as 1.4499... and becomes 1.4, exact 10.25 becomes 10.2.
fn round_to_tenths(secs: f64) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    let rendered = format!("{secs:.1}");
    rendered
        .split_once('.')
        .and_then(|(whole, tenth)| {
            let whole: u64 = whole.parse().ok()?;
            let tenth: u64 = tenth.parse().ok()?;
            whole.checked_mul(10)?.checked_add(tenth)
        })
        .unwrap_or(u64::MAX)
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.visual_hash,
            self.duration_display(),
            self.size
        )
    }
}

impl From<Fingerprint> for (String, f64, u64) {
    fn from(fp: Fingerprint) -> Self {
        let duration = fp.duration_secs();
        (fp.visual_hash, duration, fp.size)
    }
}

impl TryFrom<(String, f64, u64)> for Fingerprint {
    type Error = String;

    fn try_from((hash, duration, size): (String, f64, u64)) -> Result<Self, Self::Error> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(format!("invalid duration {duration}"));
        }
        Ok(Self::new(hash, duration, size))
    }
}

/// Why a file could not be fingerprinted. Never fatal to a scan.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Reading file metadata failed.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external tool could not be launched.
    #[error("failed to run {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The container could not be opened or reports no usable duration.
    #[error("cannot open video {path}: {message}")]
    Open { path: PathBuf, message: String },

    /// No frame could be decoded at the chosen timestamp.
    #[error("no frame decoded from {0}")]
    NoFrame(PathBuf),

    /// The grabbed frame was not a decodable image.
    #[error("failed to decode frame from {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Produces a [`Fingerprint`] for one video.
///
/// Implementations must be deterministic: extracting an unmodified file
/// twice yields equal fingerprints.
pub trait FingerprintExtractor: Send + Sync {
    /// Fingerprint the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] when the file cannot be opened, no frame can
    /// be decoded, or size/duration cannot be read.
    fn extract(&self, path: &Path) -> Result<Fingerprint, ExtractError>;
}

impl<T: FingerprintExtractor + ?Sized> FingerprintExtractor for std::sync::Arc<T> {
    fn extract(&self, path: &Path) -> Result<Fingerprint, ExtractError> {
        (**self).extract(path)
    }
}

/// Which frame represents a video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FramePolicy {
    /// The very first frame.
    First,
    /// `min(secs, duration / 2)` into the clip.
    Offset(f64),
}

impl FramePolicy {
    /// Default offset into the clip, in seconds.
    pub const DEFAULT_OFFSET_SECS: f64 = 5.0;

    /// Timestamp to grab for a clip of `duration_secs`.
    ///
    /// ```
    /// use vidupe::scanner::FramePolicy;
    ///
    /// assert_eq!(FramePolicy::Offset(5.0).timestamp(60.0), 5.0);
    /// assert_eq!(FramePolicy::Offset(5.0).timestamp(4.0), 2.0);
    /// assert_eq!(FramePolicy::First.timestamp(60.0), 0.0);
    /// ```
    #[must_use]
    pub fn timestamp(&self, duration_secs: f64) -> f64 {
        match *self {
            Self::First => 0.0,
            Self::Offset(secs) => secs.max(0.0).min(duration_secs / 2.0).max(0.0),
        }
    }
}

impl Default for FramePolicy {
    fn default() -> Self {
        Self::Offset(Self::DEFAULT_OFFSET_SECS)
    }
}
