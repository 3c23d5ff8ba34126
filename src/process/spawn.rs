//! Non-blocking "start and observe" primitive.

use std::future::Future;
use std::io;
use std::pin::Pin;

use tokio::io::AsyncRead;

use super::request::ProcessRequest;

/// Readable output stream of a live child.
pub type ChildStream = Box<dyn AsyncRead + Send + Unpin>;

/// Future resolving to the child's exit code (`None` when signalled).
pub type ExitFuture<'a> = Pin<Box<dyn Future<Output = io::Result<Option<i32>>> + Send + 'a>>;

/// A running child process.
pub trait ChildProcess: Send {
    /// Take the stdout stream, if it was piped.
    fn take_stdout(&mut self) -> Option<ChildStream>;

    /// Take the stderr stream, if it was piped.
    fn take_stderr(&mut self) -> Option<ChildStream>;

    /// Wait for the child to exit.
    fn wait(&mut self) -> ExitFuture<'_>;

    /// Ask the OS to terminate the child without waiting for it.
    fn kill(&mut self) -> io::Result<()>;

    /// OS process id, if still known.
    fn id(&self) -> Option<u32>;
}

/// Starts processes without blocking.
///
/// Production code uses [`TokioSpawner`]; tests can provide their own
/// implementation that records requests or simulates children.
pub trait ProcessSpawner: Send + Sync {
    /// Start `request` with shell interpretation enabled.
    fn spawn(&self, request: &ProcessRequest) -> io::Result<Box<dyn ChildProcess>>;
}

/// [`ProcessSpawner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

impl ProcessSpawner for TokioSpawner {
    fn spawn(&self, request: &ProcessRequest) -> io::Result<Box<dyn ChildProcess>> {
        let child = request.to_tokio_command().spawn()?;
        Ok(Box::new(TokioChild { child }))
    }
}

struct TokioChild {
    child: tokio::process::Child,
}

impl ChildProcess for TokioChild {
    fn take_stdout(&mut self) -> Option<ChildStream> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as ChildStream)
    }

    fn take_stderr(&mut self) -> Option<ChildStream> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as ChildStream)
    }

    fn wait(&mut self) -> ExitFuture<'_> {
        Box::pin(async move {
            let status = self.child.wait().await?;
            Ok(status.code())
        })
    }

    fn kill(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }

    fn id(&self) -> Option<u32> {
        self.child.id()
    }
}
