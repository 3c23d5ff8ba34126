//! Canonical options consumed by both executors.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::parent::ParentProcess;
use super::shell_options::ShellOptions;
use super::stdio::StdioConfig;
use crate::process::{BlockingRunner, ProcessRequest, ProcessSpawner, SystemRunner, TokioSpawner};
use crate::transform::{identity, Transform};

/// Environment variable always injected into the child.
pub const FORCE_COLOR_VAR: &str = "FORCE_COLOR";

/// Blocking or deferred execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Block until the command finishes.
    #[default]
    Sync,
    /// Return immediately with a deferred result.
    Async,
}

/// Fully resolved options. Built once per call and never mutated.
#[derive(Clone)]
pub struct NormalizedOptions {
    cwd: Option<PathBuf>,
    env: HashMap<String, String>,
    timeout: Option<Duration>,
    mode: ExecutionMode,
    silent: bool,
    stdio: StdioConfig,
    transform: Transform,
    parent: ParentProcess,
    runner: Arc<dyn BlockingRunner>,
    spawner: Arc<dyn ProcessSpawner>,
}

impl NormalizedOptions {
    /// Resolve every optional field of `options` to a concrete value.
    ///
    /// The environment is the user's map when given, otherwise the
    /// parent's, with `FORCE_COLOR=1` set last so it cannot be overridden.
    pub fn new(options: ShellOptions) -> Self {
        let parent = options.parent_process.unwrap_or_else(ParentProcess::current);

        let mut env = options.env.unwrap_or_else(|| parent.env().clone());
        env.insert(FORCE_COLOR_VAR.to_string(), "1".to_string());

        Self {
            cwd: options.cwd,
            env,
            timeout: options.timeout.filter(|t| !t.is_zero()),
            mode: if options.async_mode {
                ExecutionMode::Async
            } else {
                ExecutionMode::Sync
            },
            silent: options.silent,
            stdio: StdioConfig::resolve(options.nopipe, options.silent),
            transform: options.transform.unwrap_or_else(identity),
            parent,
            runner: options.runner.unwrap_or_else(|| Arc::new(SystemRunner)),
            spawner: options.spawner.unwrap_or_else(|| Arc::new(TokioSpawner)),
        }
    }

    /// Build the primitive invocation for `command`.
    pub fn request(&self, command: &str) -> ProcessRequest {
        ProcessRequest {
            command: command.to_string(),
            cwd: self.cwd.clone(),
            env: self.env.clone(),
            stdio: self.stdio,
            timeout: self.timeout,
        }
    }

    pub fn cwd(&self) -> Option<&PathBuf> {
        self.cwd.as_ref()
    }

    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn silent(&self) -> bool {
        self.silent
    }

    pub fn stdio(&self) -> StdioConfig {
        self.stdio
    }

    /// Whether output is piped back and captured.
    pub fn captures(&self) -> bool {
        self.stdio.captures()
    }

    /// Whether captured output is echoed to the parent's channels.
    pub fn forwards(&self) -> bool {
        self.captures() && !self.silent
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn parent(&self) -> &ParentProcess {
        &self.parent
    }

    pub fn runner(&self) -> &Arc<dyn BlockingRunner> {
        &self.runner
    }

    pub fn spawner(&self) -> &Arc<dyn ProcessSpawner> {
        &self.spawner
    }
}

impl From<ShellOptions> for NormalizedOptions {
    fn from(options: ShellOptions) -> Self {
        Self::new(options)
    }
}

impl fmt::Debug for NormalizedOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NormalizedOptions")
            .field("cwd", &self.cwd)
            .field("env", &self.env.len())
            .field("timeout", &self.timeout)
            .field("mode", &self.mode)
            .field("silent", &self.silent)
            .field("stdio", &self.stdio)
            .finish_non_exhaustive()
    }
}
