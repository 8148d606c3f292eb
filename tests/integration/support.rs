//! Shared fixtures: a table-driven extractor and video directory builders.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use vidupe::scanner::{ExtractError, Fingerprint, FingerprintExtractor};

/// Reads the fingerprint from the file itself.
///
/// File content is `hash`, or `hash duration size`. Content `FAIL` makes
/// extraction fail the way an unreadable video would.
#[derive(Debug, Default, Clone, Copy)]
pub struct TableExtractor;

impl FingerprintExtractor for TableExtractor {
    fn extract(&self, path: &Path) -> Result<Fingerprint, ExtractError> {
        let content = fs::read_to_string(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut fields = content.split_whitespace();
        let hash = fields.next().unwrap_or_default();
        if hash == "FAIL" {
            return Err(ExtractError::NoFrame(path.to_path_buf()));
        }
        let duration = fields.next().and_then(|d| d.parse().ok()).unwrap_or(10.0);
        let size = fields.next().and_then(|s| s.parse().ok()).unwrap_or(2048);
        Ok(Fingerprint::new(hash, duration, size))
    }
}

pub fn extractor() -> Arc<dyn FingerprintExtractor> {
    Arc::new(TableExtractor)
}

/// Create `files` (relative path, content) under a fresh temp dir.
pub fn video_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    dir
}

/// Three copies of `abc123` and one `zzz999`.
pub fn abc_fixture() -> TempDir {
    video_dir(&[
        ("a.mp4", "abc123"),
        ("b.mp4", "abc123"),
        ("c.mp4", "abc123"),
        ("d.mp4", "zzz999"),
    ])
}

pub fn paths(dir: &TempDir, names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(|n| dir.path().join(n)).collect()
}
