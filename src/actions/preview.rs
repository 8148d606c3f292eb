//! Preview hook: open a video in the platform's default player.
//!
//! The core only hands a path to a [`Previewer`]. [`SystemPlayer`] spawns
//! the desktop opener (`xdg-open`, `open`, or `cmd /C start`) and returns
//! without waiting for the player; a detached thread reaps the opener when
//! it exits. No success contract beyond the launch.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};

use thiserror::Error;

/// Error launching a preview.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// The file to preview does not exist.
    #[error("cannot preview missing file: {0}")]
    Missing(PathBuf),

    /// The opener process could not be started.
    #[error("failed to launch {opener} for {path}: {source}")]
    Launch {
        opener: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Something that can show a video to the user.
pub trait Previewer {
    /// Start previewing `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError`] if the preview could not be started.
    fn preview(&self, path: &Path) -> Result<(), PreviewError>;
}

/// Opens files with the operating system's default handler.
#[derive(Debug, Clone, Default)]
pub struct SystemPlayer {
    opener: Option<PathBuf>,
}

impl SystemPlayer {
    /// Use the platform default opener.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific program instead, invoked as `program <path>`.
    #[must_use]
    pub fn with_opener(mut self, program: impl Into<PathBuf>) -> Self {
        self.opener = Some(program.into());
        self
    }

    fn command(&self, path: &Path) -> Command {
        if let Some(opener) = &self.opener {
            let mut cmd = Command::new(opener);
            cmd.arg(path);
            return cmd;
        }

        if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(path);
            cmd
        } else if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(path);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(path);
            cmd
        }
    }

    /// Spawn the opener and a thread that waits for it to exit.
    fn launch(&self, path: &Path) -> Result<JoinHandle<Option<ExitStatus>>, PreviewError> {
        if !path.exists() {
            return Err(PreviewError::Missing(path.to_path_buf()));
        }

        let mut cmd = self.command(path);
        let opener = cmd.get_program().to_string_lossy().into_owned();

        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| PreviewError::Launch {
                opener: opener.clone(),
                path: path.to_path_buf(),
                source,
            })?;
        log::debug!("Launched {} for {}", opener, path.display());

        let label = opener.clone();
        thread::Builder::new()
            .name("vidupe-preview".to_string())
            .spawn(move || match child.wait() {
                Ok(status) => {
                    log::trace!("{label} exited with {status}");
                    Some(status)
                }
                Err(e) => {
                    log::debug!("Could not wait for {label}: {e}");
                    None
                }
            })
            .map_err(|source| PreviewError::Launch {
                opener,
                path: path.to_path_buf(),
                source,
            })
    }
}

impl Previewer for SystemPlayer {
    fn preview(&self, path: &Path) -> Result<(), PreviewError> {
        self.launch(path).map(drop)
    }
}
