//! Production fingerprint extractor backed by `ffprobe` and `ffmpeg`.
//!
//! For each video:
//!
//! 1. the byte size comes from filesystem metadata,
//! 2. `ffprobe` reports the container duration as JSON,
//! 3. `ffmpeg` seeks to the [`FramePolicy`] timestamp and pipes one frame
//!    to stdout as PNG,
//! 4. the frame is decoded with `image` and hashed by [`PerceptualHasher`].
//!
//! Each call spawns and reaps its own child processes, so nothing is held
//! open between files.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use serde::Deserialize;

use super::fingerprint::{ExtractError, Fingerprint, FingerprintExtractor, FramePolicy};
use super::perceptual::PerceptualHasher;

/// Locations of the external tools and the frame policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    /// `ffmpeg` executable name or path.
    pub ffmpeg: PathBuf,
    /// `ffprobe` executable name or path.
    pub ffprobe: PathBuf,
    /// Which frame represents the clip.
    pub frame_policy: FramePolicy,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            frame_policy: FramePolicy::default(),
        }
    }
}

impl ProbeConfig {
    /// Set the `ffmpeg` executable.
    #[must_use]
    pub fn with_ffmpeg(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg = path.into();
        self
    }

    /// Set the `ffprobe` executable.
    #[must_use]
    pub fn with_ffprobe(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffprobe = path.into();
        self
    }

    /// Set the frame policy.
    #[must_use]
    pub fn with_frame_policy(mut self, policy: FramePolicy) -> Self {
        self.frame_policy = policy;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Extracts fingerprints by shelling out to the ffmpeg tools.
#[derive(Debug, Default)]
pub struct FrameExtractor {
    config: ProbeConfig,
    hasher: PerceptualHasher,
}

impl FrameExtractor {
    /// Create an extractor with the given tool configuration.
    #[must_use]
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            hasher: PerceptualHasher::new(),
        }
    }

    /// Tool configuration in use.
    #[must_use]
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Read the container duration in seconds.
    ///
    /// # Errors
    ///
    /// Fails when `ffprobe` cannot be run, exits unsuccessfully, or reports
    /// a missing, non-numeric, negative or infinite duration.
    pub fn probe_duration(&self, path: &Path) -> Result<f64, ExtractError> {
        let output = run_tool(
            Command::new(&self.config.ffprobe)
                .args(["-v", "error", "-show_entries", "format=duration", "-of", "json"])
                .arg(path),
            &self.config.ffprobe,
        )?;

        if !output.status.success() {
            return Err(ExtractError::Open {
                path: path.to_path_buf(),
                message: stderr_message(&output),
            });
        }

        parse_duration(&output.stdout).map_err(|message| ExtractError::Open {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Grab one PNG-encoded frame at `timestamp` seconds.
    ///
    /// # Errors
    ///
    /// Fails when `ffmpeg` cannot be run or produces no frame data.
    pub fn grab_frame(&self, path: &Path, timestamp: f64) -> Result<Vec<u8>, ExtractError> {
        let output = run_tool(
            Command::new(&self.config.ffmpeg)
                .args(["-v", "error", "-nostdin", "-ss"])
                .arg(format!("{timestamp:.3}"))
                .arg("-i")
                .arg(path)
                .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"]),
            &self.config.ffmpeg,
        )?;

        if !output.status.success() || output.stdout.is_empty() {
            log::debug!(
                "ffmpeg produced no frame for {}: {}",
                path.display(),
                stderr_message(&output)
            );
            return Err(ExtractError::NoFrame(path.to_path_buf()));
        }

        Ok(output.stdout)
    }
}

impl FingerprintExtractor for FrameExtractor {
    fn extract(&self, path: &Path) -> Result<Fingerprint, ExtractError> {
        let size = fs::metadata(path)
            .map_err(|source| ExtractError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        let duration = self.probe_duration(path)?;
        let timestamp = self.config.frame_policy.timestamp(duration);
        let png = self.grab_frame(path, timestamp)?;

        let frame = image::load_from_memory_with_format(&png, image::ImageFormat::Png)
            .map_err(|source| ExtractError::Decode {
                path: path.to_path_buf(),
                source,
            })?;

        let hash = self.hasher.hash_hex(&frame);
        log::trace!(
            "Fingerprinted {} at {:.1}s: {} {:.1}s {} bytes",
            path.display(),
            timestamp,
            hash,
            duration,
            size
        );

        Ok(Fingerprint::new(hash, duration, size))
    }
}

fn run_tool(command: &mut Command, tool: &Path) -> Result<Output, ExtractError> {
    command
        .stdin(Stdio::null())
        .output()
        .map_err(|source| ExtractError::ToolLaunch {
            tool: tool.display().to_string(),
            source,
        })
}

fn stderr_message(output: &Output) -> String {
    let message = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if message.is_empty() {
        format!("exited with {}", output.status)
    } else {
        message
    }
}

/// Parse `ffprobe -of json` output into a duration in seconds.
fn parse_duration(stdout: &[u8]) -> Result<f64, String> {
    let parsed: ProbeOutput =
        serde_json::from_slice(stdout).map_err(|e| format!("unreadable ffprobe output: {e}"))?;

    let raw = parsed
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| "no duration reported".to_string())?;

    let duration: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration {raw:?}"))?;

    if duration.is_finite() && duration >= 0.0 {
        Ok(duration)
    } else {
        Err(format!("invalid duration {raw:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_duration() {
        let json = br#"{"format": {"duration": "10.010000"}}"#;
        assert_eq!(parse_duration(json).unwrap(), 10.01);
    }

    #[test]
    fn test_parse_duration_missing() {
        assert!(parse_duration(br#"{"format": {}}"#).is_err());
        assert!(parse_duration(br#"{}"#).is_err());
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration(br#"{"format": {"duration": "N/A"}}"#).is_err());
        assert!(parse_duration(br#"{"format": {"duration": "-3"}}"#).is_err());
        assert!(parse_duration(b"not json").is_err());
    }

    #[test]
    fn test_probe_config_builders() {
        let config = ProbeConfig::default()
            .with_ffmpeg("/opt/ffmpeg")
            .with_ffprobe("/opt/ffprobe")
            .with_frame_policy(FramePolicy::First);

        assert_eq!(config.ffmpeg, PathBuf::from("/opt/ffmpeg"));
        assert_eq!(config.ffprobe, PathBuf::from("/opt/ffprobe"));
        assert_eq!(config.frame_policy, FramePolicy::First);
    }

    #[test]
    fn test_extract_missing_file_is_io_error() {
        let extractor = FrameExtractor::default();
        let err = extractor
            .extract(Path::new("/no/such/dir/clip.mp4"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }

    #[test]
    fn test_extract_missing_tool_is_launch_error() {
        let dir = TempDir::new().unwrap();
        let clip = dir.path().join("clip.mp4");
        fs::write(&clip, b"not really a video").unwrap();

        let extractor = FrameExtractor::new(
            ProbeConfig::default().with_ffprobe(dir.path().join("missing-ffprobe")),
        );
        let err = extractor.extract(&clip).unwrap_err();
        assert!(matches!(err, ExtractError::ToolLaunch { .. }));
    }

    #[cfg(unix)]
    fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_extract_with_stand_in_tools() {
        let dir = TempDir::new().unwrap();
        let frame = image::RgbImage::from_fn(64, 48, |x, y| image::Rgb([(x * 4) as u8, (y * 5) as u8, 128]));
        let frame_path = dir.path().join("frame.png");
        frame.save(&frame_path).unwrap();

        let args_log = dir.path().join("ffmpeg-args.txt");
        let ffprobe = fake_tool(
            dir.path(),
            "ffprobe",
            r#"printf '{"format": {"duration": "12.345"}}'"#,
        );
        let ffmpeg = fake_tool(
            dir.path(),
            "ffmpeg",
            &format!("echo \"$@\" >> '{}'\ncat '{}'", args_log.display(), frame_path.display()),
        );

        let clip = dir.path().join("clip.mp4");
        fs::write(&clip, vec![0u8; 4096]).unwrap();

        let config = ProbeConfig::default().with_ffprobe(&ffprobe).with_ffmpeg(&ffmpeg);
        let extractor = FrameExtractor::new(config.clone().with_frame_policy(FramePolicy::Offset(5.0)));
        let first = extractor.extract(&clip).unwrap();
        let second = extractor.extract(&clip).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.size(), 4096);
        assert_eq!(first.duration_display(), "12.3");
        let expected = PerceptualHasher::new().hash_hex(&image::DynamicImage::ImageRgb8(frame));
        assert_eq!(first.visual_hash(), expected);

        // The offset is capped at half the duration.
        FrameExtractor::new(config.with_frame_policy(FramePolicy::Offset(30.0)))
            .extract(&clip)
            .unwrap();

        let calls = fs::read_to_string(&args_log).unwrap();
        let seeks: Vec<&str> = calls
            .lines()
            .map(|line| line.split_whitespace().skip_while(|a| *a != "-ss").nth(1).unwrap())
            .collect();
        let capped = format!("{:.3}", 12.345_f64 / 2.0);
        assert_eq!(seeks, vec!["5.000", "5.000", capped.as_str()]);
        assert!(calls.lines().all(|line| line.contains(&*clip.to_string_lossy())));
    }
}
