//! Error types for shellmux.

use thiserror::Error;

/// Which failure produced a [`ShellError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellErrorKind {
    /// The process could not be started.
    Spawn,
    /// The command ran and exited with a failure status.
    Exit,
    /// The command exceeded its timeout and was killed.
    Timeout,
}

/// The single error kind raised by both execution paths.
///
/// The message is always the first line of the underlying failure message,
/// so callers can match on it regardless of which path produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ShellError {
    kind: ShellErrorKind,
    command: String,
    exit_code: Option<i32>,
    message: String,
}

impl ShellError {
    /// Create a new error, keeping only the first line of `message`.
    pub fn new(kind: ShellErrorKind, command: impl Into<String>, message: &str) -> Self {
        Self {
            kind,
            command: command.into(),
            exit_code: None,
            message: first_line(message).to_string(),
        }
    }

    /// "Failed to start command" message for a process that never ran.
    pub fn spawn_message(command: &str, cause: &dyn std::fmt::Display) -> String {
        format!("Failed to start command: {}; {}", command, cause)
    }

    /// "Command timeout" message for a killed process.
    pub fn timeout_message(command: &str) -> String {
        format!("Command timeout: {}", command)
    }

    /// Attach the exit code of the failed process.
    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    /// Failure kind.
    pub fn kind(&self) -> ShellErrorKind {
        self.kind
    }

    /// The command string that failed.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Exit code, when the process exited on its own.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Truncated error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if this error was caused by a timeout.
    pub fn is_timeout(&self) -> bool {
        self.kind == ShellErrorKind::Timeout
    }
}

fn first_line(message: &str) -> &str {
    message.split('\n').next().unwrap_or_default()
}

/// Convenience Result type for shellmux operations.
pub type Result<T> = std::result::Result<T, ShellError>;
