//! Deferred result of an asynchronous execution.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::{ShellError, ShellErrorKind};
use crate::Result;

/// A result that settles exactly once, when the command completes or fails.
///
/// Await it to obtain the captured output (`None` when nothing was
/// captured) or the [`ShellError`] that ended the execution.
#[derive(Debug)]
#[must_use = "a Deferred does nothing unless awaited"]
pub struct Deferred {
    command: String,
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    Settled(Option<Result<Option<String>>>),
    Waiting(oneshot::Receiver<Result<Option<String>>>),
}

impl Deferred {
    pub(crate) fn waiting(command: &str, rx: oneshot::Receiver<Result<Option<String>>>) -> Self {
        Self {
            command: command.to_string(),
            inner: Inner::Waiting(rx),
        }
    }

    pub(crate) fn settled(command: &str, outcome: Result<Option<String>>) -> Self {
        Self {
            command: command.to_string(),
            inner: Inner::Settled(Some(outcome)),
        }
    }

    /// The command this deferred belongs to.
    pub fn command(&self) -> &str {
        &self.command
    }

    fn lost(&self) -> ShellError {
        ShellError::new(
            ShellErrorKind::Exit,
            &self.command,
            &format!(
                "Command failed: {}; execution ended without a result",
                self.command
            ),
        )
    }
}

impl Future for Deferred {
    type Output = Result<Option<String>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.inner {
            Inner::Settled(slot) => match slot.take() {
                Some(outcome) => Poll::Ready(outcome),
                None => Poll::Ready(Err(this.lost())),
            },
            Inner::Waiting(rx) => match Pin::new(rx).poll(cx) {
                Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
                Poll::Ready(Err(_)) => Poll::Ready(Err(this.lost())),
                Poll::Pending => Poll::Pending,
            },
        }
    }
}
