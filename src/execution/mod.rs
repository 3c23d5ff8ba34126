//! Command execution engine.
//!
//! This module provides the two execution paths behind the facade:
//! - [`run_sync`]: blocks until the command exits
//! - [`run_async`]: returns a [`Deferred`] immediately
//!
//! Both read only from [`NormalizedOptions`] and fail with the same
//! [`ShellError`](crate::ShellError).
//!
//! # Example
//!
//! ```no_run
//! use shellmux::execution::run_sync;
//! use shellmux::options::{NormalizedOptions, ShellOptions};
//!
//! let options = NormalizedOptions::new(ShellOptions::new().silent(true));
//! let output = run_sync("echo hello", &options).unwrap();
//! assert_eq!(output.as_deref(), Some("hello\n"));
//! ```

mod async_exec;
mod deferred;
mod state;
mod sync_exec;

pub use async_exec::run_async;
pub use deferred::Deferred;
pub use state::{ExecutionState, InvalidTransition};
pub use sync_exec::run_sync;

use tracing::warn;

use crate::error::{ShellError, ShellErrorKind};
use crate::options::{NormalizedOptions, OutputSink};
use crate::transform::apply_to_buffer;

/// Build a [`ShellError`] whose message went through the output transform.
fn failure(
    options: &NormalizedOptions,
    kind: ShellErrorKind,
    command: &str,
    message: &str,
) -> ShellError {
    ShellError::new(kind, command, &apply_to_buffer(options.transform(), message))
}

/// Write to a parent channel. Write errors are logged, never raised.
fn forward(sink: &OutputSink, text: &str) {
    if let Err(e) = sink.write(text.as_bytes()) {
        warn!(error = %e, "failed to forward output to parent");
    }
}
