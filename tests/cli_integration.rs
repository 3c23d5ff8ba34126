//! CLI integration tests.
//!
//! These tests verify the CLI argument parsing and configuration loading.

use std::ffi::OsString;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

use shellmux::cli::{parse_args_from, Args};
use shellmux::config::Config;
use shellmux::options::{NormalizedOptions, OutputRecorder, ParentProcess, StdioMode};

fn args(args: &[&str]) -> Vec<OsString> {
    std::iter::once("shellmux")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect()
}

fn parent() -> ParentProcess {
    ParentProcess::with_writers(OutputRecorder::new(), OutputRecorder::new())
}

// ============================================================================
// CLI Argument Tests
// ============================================================================

#[test]
fn test_cli_defaults() {
    let result = parse_args_from(args(&[])).unwrap();

    assert!(!result.async_mode);
    assert!(!result.silent);
    assert!(!result.nopipe);
    assert!(result.config.is_none());
    assert!(result.command.is_empty());
}

#[test]
fn test_cli_full_options() {
    let result = parse_args_from(args(&[
        "-a",
        "-s",
        "-t",
        "3000",
        "-p",
        "[job]",
        "-e",
        "KEY=value",
        "-l",
        "debug",
        "--",
        "cargo",
        "build",
        "--release",
    ]))
    .unwrap();

    assert!(result.async_mode);
    assert!(result.silent);
    assert_eq!(result.timeout_ms, Some(3000));
    assert_eq!(result.prefix, Some("[job]".to_string()));
    assert_eq!(result.env, vec![("KEY".to_string(), "value".to_string())]);
    assert_eq!(result.log_level, Some("debug".to_string()));
    assert_eq!(
        result.command_line(),
        Some("cargo build --release".to_string())
    );
}

#[test]
fn test_cli_invalid_timeout() {
    let result = parse_args_from(args(&["-t", "not-a-number"]));
    assert!(result.is_err());
}

// ============================================================================
// Configuration Loading Tests
// ============================================================================

#[test]
fn test_config_file_then_args() {
    let json = r#"{
        "defaults": { "timeout_ms": 9000, "prefix": "[file]", "silent": true }
    }"#;
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let args = Args {
        config: Some(file.path().to_path_buf()),
        timeout_ms: Some(250),
        ..Args::default()
    };
    let mut config = Config::from_file(file.path()).unwrap();
    config.apply_args(&args);

    assert_eq!(config.defaults.timeout_ms, 250);
    assert_eq!(config.defaults.prefix.as_deref(), Some("[file]"));
    assert!(config.defaults.silent);
}

#[test]
fn test_config_missing_file() {
    let args = Args {
        config: Some("/definitely/not/here.json".into()),
        ..Args::default()
    };
    assert!(Config::load(&args).is_err());
}

#[test]
fn test_args_to_normalized_options() {
    let parsed = parse_args_from(args(&["-n", "-s", "-t", "500", "sleep", "1"])).unwrap();
    let mut config = Config::default();
    config.apply_args(&parsed);

    let options = NormalizedOptions::new(config.to_options(parent()));
    assert_eq!(options.timeout(), Some(Duration::from_millis(500)));
    assert_eq!(
        options.stdio().as_array(),
        [StdioMode::Inherit, StdioMode::Ignore, StdioMode::Ignore]
    );
    assert!(!options.captures());
}
