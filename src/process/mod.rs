//! Process-spawning primitives.
//!
//! Two seams sit between the executors and the operating system:
//! - [`BlockingRunner`] runs a command to completion and returns its
//!   captured bytes ([`SystemRunner`] in production).
//! - [`ProcessSpawner`] starts a command and exposes its live streams and
//!   lifecycle ([`TokioSpawner`] in production).
//!
//! Both receive the same [`ProcessRequest`].

mod blocking;
mod request;
mod spawn;

pub use blocking::{BlockingRunner, RunOutput, SystemRunner};
pub use request::ProcessRequest;
pub use spawn::{ChildProcess, ChildStream, ExitFuture, ProcessSpawner, TokioSpawner};
