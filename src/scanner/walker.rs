//! Directory walker for video discovery.
//!
//! # Overview
//!
//! [`VideoWalker`] traverses a directory tree on the calling thread with
//! [`walkdir`] and yields the paths of files whose extension is on the
//! video allow-list. Entries are sorted by file name inside each directory
//! so that two walks over an unchanged tree yield the same sequence.
//!
//! Errors (unreadable directories, vanished files, symlink loops) are
//! yielded as [`ScanError`] values instead of stopping the walk.
//!
//! # Example
//!
//! ```no_run
//! use vidupe::scanner::VideoWalker;
//! use std::path::Path;
//!
//! let walker = VideoWalker::new(Path::new("/home/user/Videos"));
//! let videos: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} videos", videos.len());
//! ```

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{is_video_file, ScanError};

/// Sequential directory walker that only yields video files.
#[derive(Debug, Clone)]
pub struct VideoWalker {
    root: PathBuf,
    follow_symlinks: bool,
}

impl VideoWalker {
    /// Create a walker rooted at `path`.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            root: path.to_path_buf(),
            follow_symlinks: false,
        }
    }

    /// Follow symbolic links while walking. Loops are reported as errors.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Root directory of the walk.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the tree, yielding video paths in traversal order.
    pub fn walk(&self) -> impl Iterator<Item = Result<PathBuf, ScanError>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_map(move |entry| match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        return None;
                    }
                    let path = entry.into_path();
                    if is_video_file(&path) {
                        Some(Ok(path))
                    } else {
                        log::trace!("Skipping non-video file: {}", path.display());
                        None
                    }
                }
                Err(e) => Some(Err(self.convert_error(e))),
            })
    }

    /// Collect every video path, splitting walk errors out.
    ///
    /// The grouper needs the total up front to report `processed/total`.
    #[must_use]
    pub fn collect(&self) -> (Vec<PathBuf>, Vec<ScanError>) {
        let mut paths = Vec::new();
        let mut errors = Vec::new();
        for entry in self.walk() {
            match entry {
                Ok(path) => paths.push(path),
                Err(e) => errors.push(e),
            }
        }
        (paths, errors)
    }

    fn convert_error(&self, error: walkdir::Error) -> ScanError {
        use std::io::ErrorKind;

        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        if error.loop_ancestor().is_some() {
            log::warn!("Filesystem loop detected at {}", path.display());
            return ScanError::Loop(path);
        }

        match error.into_io_error() {
            Some(io) if io.kind() == ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path)
            }
            Some(io) if io.kind() == ErrorKind::NotFound => {
                log::debug!("Path not found (may have been deleted): {}", path.display());
                ScanError::NotFound(path)
            }
            Some(io) => {
                log::warn!("I/O error for {}: {}", path.display(), io);
                ScanError::Io { path, source: io }
            }
            None => ScanError::Io {
                path,
                source: std::io::Error::other("walk error"),
            },
        }
    }
}
