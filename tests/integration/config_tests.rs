//! Layered configuration loading.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use tempfile::TempDir;
use vidupe::actions::DeleteMethod;
use vidupe::cli::{Cli, Commands};
use vidupe::config::{Config, ConfigError, ENV_PREFIX};
use vidupe::scanner::FramePolicy;
use vidupe::session::ResolveMode;

fn write_config(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("vidupe.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_load_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "ffprobe_path = \"/usr/local/bin/ffprobe\"\nframe_offset_secs = 2.5\ntheme = \"light\"\n",
    );

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.ffprobe_path, PathBuf::from("/usr/local/bin/ffprobe"));
    assert_eq!(config.frame_policy(), FramePolicy::Offset(2.5));
    assert_eq!(config.probe_config().ffprobe, PathBuf::from("/usr/local/bin/ffprobe"));
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "frame_offset_secs = \"soon\"\n");
    assert!(matches!(Config::load(Some(&path)), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_negative_offset_in_file_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "frame_offset_secs = -1.0\n");
    assert!(matches!(
        Config::load(Some(&path)),
        Err(ConfigError::Value { key: "frame_offset_secs", .. })
    ));
}

#[test]
fn test_env_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "mode = \"manual\"\npoll_interval_ms = 250\n");

    // Only this test sets variables with the prefix.
    env::set_var("VIDUPE_MODE", "auto");
    env::set_var("VIDUPE_DELETE_METHOD", "trash");
    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX));
    let result = Config::from_figment(&figment);
    env::remove_var("VIDUPE_MODE");
    env::remove_var("VIDUPE_DELETE_METHOD");

    let config = result.unwrap();
    assert_eq!(config.mode, Some(ResolveMode::Auto));
    assert_eq!(config.delete_method, DeleteMethod::Trash);
    assert_eq!(config.poll_interval(), Duration::from_millis(250));
}

#[test]
fn test_cli_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "mode = \"manual\"\nframe_policy = \"first\"\n");
    let cli = Cli::parse_from([
        "vidupe",
        "--config",
        path.to_str().unwrap(),
        "scan",
        "/videos",
        "--mode",
        "auto",
        "--frame-offset",
        "3",
    ]);

    let mut config = Config::load(cli.config.as_deref()).unwrap();
    assert_eq!(config.frame_policy(), FramePolicy::First);

    let Commands::Scan(args) = &cli.command else {
        panic!("expected scan command");
    };
    config.apply_scan_args(args).unwrap();
    assert_eq!(config.mode, Some(ResolveMode::Auto));
    assert_eq!(config.frame_policy(), FramePolicy::Offset(3.0));
}

#[test]
fn test_rendered_config_loads_back() {
    let dir = TempDir::new().unwrap();
    let mut original = Config::default();
    original.mode = Some(ResolveMode::Auto);
    original.poll_interval_ms = 40;
    let path = write_config(&dir, &original.to_toml_string().unwrap());

    let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&path));
    assert_eq!(Config::from_figment(&figment).unwrap(), original);
}
