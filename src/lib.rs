//! # shellmux
//!
//! One call signature for blocking and non-blocking shell commands.
//!
//! A command runs either synchronously, returning its output directly, or
//! asynchronously, returning a [`Deferred`] that settles exactly once.
//! Both paths share the same options, stdio routing, per-line output
//! transform and error normalization.
//!
//! ## Features
//!
//! - **Dual mode**: `async_mode` selects the blocking or deferred path
//! - **Output capture**: stdout is returned as a string and echoed to the
//!   parent's channels unless `silent`
//! - **Line transforms**: tag or rewrite each output line, live or buffered
//! - **Timeouts**: overrunning children are killed and reported
//!
//! ## Quick Start
//!
//! ```no_run
//! use shellmux::{shell_async, shell_sync, transform, ShellOptions};
//!
//! #[tokio::main]
//! async fn main() -> shellmux::Result<()> {
//!     // Initialize logging
//!     shellmux::logging::try_init().ok();
//!
//!     // Blocking: prints "[build] hi" and returns it
//!     let out = shell_sync("echo hi", ShellOptions::new().transform(transform::prefix("[build]")))?;
//!     assert_eq!(out.as_deref(), Some("[build] hi\n"));
//!
//!     // Deferred: returns immediately, resolves when the command exits
//!     let pending = shell_async("echo later", ShellOptions::new().silent(true));
//!     assert_eq!(pending.await?.as_deref(), Some("later\n"));
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;
pub mod options;
pub mod process;
pub mod shell;
pub mod transform;

// Re-export commonly used types
pub use error::{Result, ShellError, ShellErrorKind};
pub use execution::{run_async, run_sync, Deferred, ExecutionState};
pub use options::{NormalizedOptions, OutputRecorder, ParentProcess, ShellOptions, StdioMode};
pub use process::{BlockingRunner, ProcessRequest, ProcessSpawner};
pub use shell::{shell, shell_async, shell_sync, Execution};
pub use transform::{prefix, Transform};
