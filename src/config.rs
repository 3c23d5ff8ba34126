//! Configuration management for the shellmux binary.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::options::{ParentProcess, ShellOptions};
use crate::transform::prefix;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults applied to every command.
    pub defaults: DefaultsSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Per-command defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsSection {
    /// Timeout in milliseconds; 0 means unbounded.
    pub timeout_ms: u64,
    /// Run through the deferred path.
    #[serde(rename = "async")]
    pub async_mode: bool,
    /// Inherit stdio instead of capturing.
    pub nopipe: bool,
    /// Do not echo output.
    pub silent: bool,
    /// Prefix added to every output line.
    pub prefix: Option<String>,
    /// Working directory.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables, layered over the inherited environment.
    pub env: HashMap<String, String>,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(timeout) = var("SHELLMUX_TIMEOUT_MS") {
            self.defaults.timeout_ms = timeout
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SHELLMUX_TIMEOUT_MS", timeout))?;
        }

        if let Some(prefix) = var("SHELLMUX_PREFIX") {
            self.defaults.prefix = Some(prefix).filter(|p| !p.is_empty());
        }

        if let Some(level) = var("SHELLMUX_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(timeout) = args.timeout_ms {
            self.defaults.timeout_ms = timeout;
        }
        if args.async_mode {
            self.defaults.async_mode = true;
        }
        if args.nopipe {
            self.defaults.nopipe = true;
        }
        if args.silent {
            self.defaults.silent = true;
        }
        if let Some(ref prefix) = args.prefix {
            self.defaults.prefix = Some(prefix.clone());
        }
        if let Some(ref cwd) = args.cwd {
            self.defaults.cwd = Some(cwd.clone());
        }
        for (key, value) in &args.env {
            self.defaults.env.insert(key.clone(), value.clone());
        }
        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match args.config {
            Some(ref path) => Config::from_file(path)?,
            None => Config::default(),
        };
        config.apply_env()?;
        config.apply_args(args);
        Ok(config)
    }

    /// Build shell options for a command run from `parent`.
    ///
    /// Extra environment variables are layered over the parent's
    /// environment rather than replacing it.
    pub fn to_options(&self, parent: ParentProcess) -> ShellOptions {
        let d = &self.defaults;
        let mut options = ShellOptions::new()
            .async_mode(d.async_mode)
            .nopipe(d.nopipe)
            .silent(d.silent)
            .timeout(Duration::from_millis(d.timeout_ms));

        if let Some(ref p) = d.prefix {
            options = options.transform(prefix(p.clone()));
        }
        if let Some(ref cwd) = d.cwd {
            options = options.cwd(cwd.clone());
        }
        if !d.env.is_empty() {
            options = options
                .envs(parent.env().clone())
                .envs(d.env.clone());
        }
        options.parent_process(parent)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid value in an environment variable.
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidValue(name, value) => write!(f, "invalid value for {}: '{}'", name, value),
        }
    }
}

impl std::error::Error for ConfigError {}
