//! User-facing options for a shell call.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::parent::ParentProcess;
use crate::process::{BlockingRunner, ProcessSpawner};
use crate::transform::Transform;

/// Options for one shell call. Every field is optional.
#[derive(Clone, Default)]
pub struct ShellOptions {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Child environment. When set, replaces the parent's environment.
    pub env: Option<HashMap<String, String>>,
    /// Maximum execution time. `None` or zero is unbounded.
    pub timeout: Option<Duration>,
    /// Run without blocking and return a deferred result.
    pub async_mode: bool,
    /// Let the child inherit the parent's stdio instead of capturing it.
    pub nopipe: bool,
    /// Do not forward output to the parent's channels.
    pub silent: bool,
    /// Per-line output transform.
    pub transform: Option<Transform>,
    /// Parent process whose channels receive forwarded output.
    pub parent_process: Option<ParentProcess>,
    /// Blocking primitive used by the synchronous path.
    pub runner: Option<Arc<dyn BlockingRunner>>,
    /// Spawn primitive used by the asynchronous path.
    pub spawner: Option<Arc<dyn ProcessSpawner>>,
}

impl ShellOptions {
    /// Create options with every field at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the working directory.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Add an environment variable to the child environment.
    ///
    /// The first call switches from the parent's environment to an
    /// explicit one containing only what was added here.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Add multiple environment variables.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env = self.env.get_or_insert_with(HashMap::new);
        for (k, v) in vars {
            env.insert(k.into(), v.into());
        }
        self
    }

    /// Set the execution timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Choose between blocking and deferred execution.
    pub fn async_mode(mut self, enabled: bool) -> Self {
        self.async_mode = enabled;
        self
    }

    /// Set whether the child inherits the parent's stdio.
    pub fn nopipe(mut self, enabled: bool) -> Self {
        self.nopipe = enabled;
        self
    }

    /// Set whether forwarding to the parent is suppressed.
    pub fn silent(mut self, enabled: bool) -> Self {
        self.silent = enabled;
        self
    }

    /// Set the per-line transform.
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Set the per-line transform from a closure.
    pub fn transform_fn<F>(self, f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.transform(Arc::new(f))
    }

    /// Set the parent process handle.
    pub fn parent_process(mut self, parent: ParentProcess) -> Self {
        self.parent_process = Some(parent);
        self
    }

    /// Replace the blocking primitive.
    pub fn runner(mut self, runner: Arc<dyn BlockingRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Replace the spawn primitive.
    pub fn spawner(mut self, spawner: Arc<dyn ProcessSpawner>) -> Self {
        self.spawner = Some(spawner);
        self
    }
}

impl fmt::Debug for ShellOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellOptions")
            .field("cwd", &self.cwd)
            .field("env", &self.env)
            .field("timeout", &self.timeout)
            .field("async_mode", &self.async_mode)
            .field("nopipe", &self.nopipe)
            .field("silent", &self.silent)
            .field("transform", &self.transform.is_some())
            .field("parent_process", &self.parent_process)
            .finish_non_exhaustive()
    }
}
