//! The invocation handed to a process primitive.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::options::StdioConfig;

/// Everything a primitive needs to start one shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRequest {
    /// Command line, passed verbatim to the shell.
    pub command: String,
    /// Working directory; `None` keeps the parent's.
    pub cwd: Option<PathBuf>,
    /// Complete child environment. The parent's is not inherited.
    pub env: HashMap<String, String>,
    /// Stdio routing.
    pub stdio: StdioConfig,
    /// Maximum run time; `None` is unbounded.
    pub timeout: Option<Duration>,
}

impl ProcessRequest {
    /// Program and arguments that run `command` through the platform shell.
    pub fn shell_invocation(&self) -> (&'static str, Vec<&str>) {
        if cfg!(windows) {
            ("cmd.exe", vec!["/d", "/s", "/c", self.command.as_str()])
        } else {
            ("/bin/sh", vec!["-c", self.command.as_str()])
        }
    }

    /// Build a `std::process::Command` configured from this request.
    pub fn to_std_command(&self) -> std::process::Command {
        let (program, args) = self.shell_invocation();
        let mut cmd = std::process::Command::new(program);
        cmd.args(args)
            .env_clear()
            .envs(&self.env)
            .stdin(self.stdio.stdin.to_stdio())
            .stdout(self.stdio.stdout.to_stdio())
            .stderr(self.stdio.stderr.to_stdio());
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    /// Build a `tokio::process::Command` configured from this request.
    pub fn to_tokio_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::from(self.to_std_command());
        cmd.kill_on_drop(true);
        cmd
    }
}
