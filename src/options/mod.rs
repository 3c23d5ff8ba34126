//! Option handling.
//!
//! - [`ShellOptions`]: what the caller supplies, every field optional
//! - [`NormalizedOptions`]: the resolved record both executors read
//! - [`StdioConfig`]: stdio routing derived from `nopipe` / `silent`
//! - [`ParentProcess`]: output channels and environment of the caller
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use shellmux::options::{NormalizedOptions, ShellOptions, StdioMode};
//!
//! let opts = ShellOptions::new()
//!     .cwd("/tmp")
//!     .env("CUSTOM_ENV", "test")
//!     .timeout(Duration::from_secs(5))
//!     .nopipe(true);
//!
//! let normalized = NormalizedOptions::new(opts);
//! assert_eq!(normalized.env().get("FORCE_COLOR").map(String::as_str), Some("1"));
//! assert_eq!(normalized.stdio().stdout, StdioMode::Inherit);
//! ```

mod normalize;
mod parent;
mod shell_options;
mod stdio;

pub use normalize::{ExecutionMode, NormalizedOptions, FORCE_COLOR_VAR};
pub use parent::{OutputRecorder, OutputSink, ParentProcess};
pub use shell_options::ShellOptions;
pub use stdio::{StdioConfig, StdioMode};
