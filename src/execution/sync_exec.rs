//! Synchronous executor.

use tracing::{debug, warn};

use super::{failure, forward};
use crate::error::{ShellError, ShellErrorKind};
use crate::options::NormalizedOptions;
use crate::transform::apply_to_buffer;
use crate::Result;

/// Run `command` to completion, blocking the calling thread.
///
/// Returns the transformed stdout, or `None` when the command printed
/// nothing or its output was not captured. Unless `silent`, the captured
/// output is written once to the parent's stdout, and any stderr to the
/// parent's stderr.
pub fn run_sync(command: &str, options: &NormalizedOptions) -> Result<Option<String>> {
    let request = options.request(command);
    debug!(command = %command, stdio = ?options.stdio().as_array(), "running command");

    let output = options.runner().run(&request).map_err(|e| {
        warn!(command = %command, error = %e, "failed to start command");
        failure(
            options,
            ShellErrorKind::Spawn,
            command,
            &ShellError::spawn_message(command, &e),
        )
    })?;

    if output.timed_out {
        warn!(command = %command, timeout = ?options.timeout(), "command timed out");
        return Err(failure(
            options,
            ShellErrorKind::Timeout,
            command,
            &ShellError::timeout_message(command),
        ));
    }

    if !output.success() {
        debug!(command = %command, exit_code = ?output.exit_code, "command failed");
        let mut message = format!("Command failed: {}", command);
        let stderr = output.stderr_text();
        if !stderr.is_empty() {
            message.push('\n');
            message.push_str(&stderr);
        }
        return Err(
            failure(options, ShellErrorKind::Exit, command, &message).with_exit_code(output.exit_code),
        );
    }

    debug!(
        command = %command,
        duration_ms = output.duration.as_millis() as u64,
        stdout_bytes = output.stdout.len(),
        "command succeeded"
    );

    if options.forwards() && !output.stderr.is_empty() {
        let stderr = apply_to_buffer(options.transform(), &output.stderr_text());
        forward(options.parent().stderr(), &stderr);
    }

    if output.stdout.is_empty() {
        return Ok(None);
    }

    let text = apply_to_buffer(options.transform(), &output.stdout_text());
    if options.forwards() {
        forward(options.parent().stdout(), &text);
    }
    Ok(Some(text))
}
