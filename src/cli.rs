//! Command-line interface definitions for vidupe.
//!
//! Global options (verbosity, colour, config file) apply to every
//! subcommand.
//!
//! ```bash
//! # Review groups one at a time in the terminal UI (default)
//! vidupe scan ~/Videos
//!
//! # Keep the first file of every group and delete the rest
//! vidupe scan ~/Videos --output text --mode auto --commit
//!
//! # Machine-readable report, nothing deleted
//! vidupe scan ~/Videos --output json
//!
//! # Show the effective configuration
//! vidupe config
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::actions::DeleteMethod;
use crate::session::ResolveMode;

/// Find near-duplicate videos by their visual fingerprint.
///
/// Two videos are duplicates when a perceptual hash of one sampled frame,
/// the duration to a tenth of a second, and the byte size all match.
#[derive(Debug, Parser)]
#[command(name = "vidupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Use ASCII-only progress output
    #[arg(long, global = true)]
    pub accessible: bool,

    /// Configuration file (default: platform config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory for duplicate videos
    Scan(Box<ScanArgs>),
    /// Print the effective configuration
    Config,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// How to resolve duplicate groups
    #[arg(short, long, value_enum)]
    pub mode: Option<ResolveMode>,

    /// Front end for results
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Tui)]
    pub output: OutputFormat,

    /// Seconds into the video to sample (capped at half the duration)
    #[arg(long, value_name = "SECS", conflicts_with = "first_frame")]
    pub frame_offset: Option<f64>,

    /// Sample the first frame instead of an offset frame
    #[arg(long)]
    pub first_frame: bool,

    /// How staged files are removed
    #[arg(long, value_enum)]
    pub delete_method: Option<DeleteMethod>,

    /// Delete staged files after auto resolution (text/json output)
    #[arg(long)]
    pub commit: bool,

    /// Foreground polling interval in milliseconds
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..=10_000))]
    pub poll_interval: Option<u64>,

    /// Follow symbolic links during the walk
    #[arg(long)]
    pub follow_symlinks: bool,

    /// TUI colour theme
    #[arg(long, value_enum)]
    pub theme: Option<ThemeArg>,
}

/// Output front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Interactive terminal user interface
    Tui,
    /// Plain text report
    Text,
    /// JSON report for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Tui => write!(f, "tui"),
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// TUI theme choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThemeArg {
    /// Detect from the terminal environment
    #[default]
    Auto,
    /// Light palette
    Light,
    /// Dark palette
    Dark,
}
