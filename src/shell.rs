//! Single entry point dispatching to the sync or async executor.

use crate::execution::{run_async, run_sync, Deferred};
use crate::options::{ExecutionMode, NormalizedOptions, ShellOptions};
use crate::Result;

/// Outcome of [`shell`]: a finished result in sync mode, a deferred one in
/// async mode.
#[derive(Debug)]
#[must_use]
pub enum Execution {
    /// The command already ran to completion.
    Completed(Result<Option<String>>),
    /// The command is running; await the deferred for its result.
    Pending(Deferred),
}

impl Execution {
    /// Check if the execution is still pending.
    pub fn is_pending(&self) -> bool {
        matches!(self, Execution::Pending(_))
    }

    /// The result, if the command ran synchronously.
    pub fn into_completed(self) -> Option<Result<Option<String>>> {
        match self {
            Execution::Completed(result) => Some(result),
            Execution::Pending(_) => None,
        }
    }

    /// The deferred result, if the command runs asynchronously.
    pub fn into_deferred(self) -> Option<Deferred> {
        match self {
            Execution::Pending(deferred) => Some(deferred),
            Execution::Completed(_) => None,
        }
    }

    /// Wait for the result, whichever mode produced it.
    pub async fn output(self) -> Result<Option<String>> {
        match self {
            Execution::Completed(result) => result,
            Execution::Pending(deferred) => deferred.await,
        }
    }
}

/// Run `command` with `options`.
///
/// Options are normalized once; `async_mode` then selects [`run_sync`]
/// (which blocks the calling thread, even inside a runtime) or
/// [`run_async`].
pub fn shell(command: &str, options: ShellOptions) -> Execution {
    let options = NormalizedOptions::new(options);
    match options.mode() {
        ExecutionMode::Sync => Execution::Completed(run_sync(command, &options)),
        ExecutionMode::Async => Execution::Pending(run_async(command, options)),
    }
}

/// Run `command` synchronously, ignoring `async_mode`.
pub fn shell_sync(command: &str, options: ShellOptions) -> Result<Option<String>> {
    run_sync(command, &NormalizedOptions::new(options.async_mode(false)))
}

/// Run `command` asynchronously, ignoring `async_mode`.
pub fn shell_async(command: &str, options: ShellOptions) -> Deferred {
    run_async(command, NormalizedOptions::new(options.async_mode(true)))
}
