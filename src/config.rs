//! Application configuration.
//!
//! Settings are layered with `figment`, later layers winning:
//!
//! 1. built-in defaults
//! 2. TOML file (`--config PATH`, or `config.toml` in the platform config dir)
//! 3. `VIDUPE_*` environment variables
//! 4. CLI flags, applied by [`Config::apply_scan_args`]
//!
//! `mode` has no default: unset, the TUI resolves groups manually and the
//! text and JSON outputs resolve them automatically.
//!
//! ```toml
//! mode = "manual"
//! frame_policy = "offset"
//! frame_offset_secs = 5.0
//! ffmpeg_path = "ffmpeg"
//! ffprobe_path = "ffprobe"
//! poll_interval_ms = 100
//! delete_method = "permanent"
//! theme = "auto"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::DeleteMethod;
use crate::cli::{OutputFormat, ScanArgs, ThemeArg};
use crate::scanner::{FramePolicy, ProbeConfig};
use crate::session::ResolveMode;

/// Prefix for environment overrides, e.g. `VIDUPE_MODE=auto`.
pub const ENV_PREFIX: &str = "VIDUPE_";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer could not be read or had the wrong shape.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// An explicitly requested config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// A value parsed but makes no sense.
    #[error("invalid value for {key}: {message}")]
    Value { key: &'static str, message: String },

    /// The effective configuration could not be rendered.
    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Invalid(Box::new(err))
    }
}

/// Which frame of a video is fingerprinted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameSelection {
    /// Timestamp zero.
    First,
    /// `frame_offset_secs`, capped at half the duration.
    #[default]
    Offset,
}

/// Effective settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Resolution mode, if chosen by the file, environment or `--mode`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ResolveMode>,
    /// Frame selection policy.
    pub frame_policy: FrameSelection,
    /// Offset used by the `offset` policy.
    pub frame_offset_secs: f64,
    /// `ffmpeg` executable.
    pub ffmpeg_path: PathBuf,
    /// `ffprobe` executable.
    pub ffprobe_path: PathBuf,
    /// Foreground polling interval.
    pub poll_interval_ms: u64,
    /// How staged files are removed.
    pub delete_method: DeleteMethod,
    /// TUI theme.
    pub theme: ThemeArg,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: None,
            frame_policy: FrameSelection::Offset,
            frame_offset_secs: FramePolicy::DEFAULT_OFFSET_SECS,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            poll_interval_ms: 100,
            delete_method: DeleteMethod::Permanent,
            theme: ThemeArg::Auto,
        }
    }
}

impl Config {
    /// Load defaults, the config file and the environment.
    ///
    /// An explicit `path` must exist; the default path is optional.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a layer is malformed or a value is out of
    /// range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) if !p.exists() => return Err(ConfigError::NotFound(p.to_path_buf())),
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };

        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = &file {
            log::debug!("Loading configuration from {}", file.display());
            figment = figment.merge(Toml::file(file));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        Self::from_figment(&figment)
    }

    /// Extract and validate from a prepared figment.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.frame_offset_secs.is_finite() || self.frame_offset_secs < 0.0 {
            return Err(ConfigError::Value {
                key: "frame_offset_secs",
                message: format!("{} is not a non-negative number", self.frame_offset_secs),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Value {
                key: "poll_interval_ms",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Overlay scan flags given on the command line.
    ///
    /// # Errors
    ///
    /// A negative or non-finite `--frame-offset`.
    pub fn apply_scan_args(&mut self, args: &ScanArgs) -> Result<(), ConfigError> {
        if let Some(mode) = args.mode {
            self.mode = Some(mode);
        }
        if args.first_frame {
            self.frame_policy = FrameSelection::First;
        }
        if let Some(offset) = args.frame_offset {
            self.frame_policy = FrameSelection::Offset;
            self.frame_offset_secs = offset;
        }
        if let Some(method) = args.delete_method {
            self.delete_method = method;
        }
        if let Some(ms) = args.poll_interval {
            self.poll_interval_ms = ms;
        }
        if let Some(theme) = args.theme {
            self.theme = theme;
        }
        self.validate()
    }

    /// The resolution mode for `output`.
    ///
    /// An explicit mode always wins, even where `output` cannot honour it.
    #[must_use]
    pub fn resolve_mode(&self, output: OutputFormat) -> ResolveMode {
        self.mode.unwrap_or(match output {
            OutputFormat::Tui => ResolveMode::Manual,
            OutputFormat::Text | OutputFormat::Json => ResolveMode::Auto,
        })
    }

    /// The frame policy the extractor should use.
    #[must_use]
    pub fn frame_policy(&self) -> FramePolicy {
        match self.frame_policy {
            FrameSelection::First => FramePolicy::First,
            FrameSelection::Offset => FramePolicy::Offset(self.frame_offset_secs),
        }
    }

    /// Extractor settings.
    #[must_use]
    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig::default()
            .with_ffmpeg(&self.ffmpeg_path)
            .with_ffprobe(&self.ffprobe_path)
            .with_frame_policy(self.frame_policy())
    }

    /// Polling interval as a duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Only if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// `config.toml` in the platform config directory, if one can be determined.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "vidupe", "vidupe").map(|dirs| dirs.config_dir().join("config.toml"))
}
