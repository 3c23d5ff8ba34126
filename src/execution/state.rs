//! Asynchronous execution state machine.

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;

use crate::Result;

/// Lifecycle state of one asynchronous execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionState {
    /// The spawn primitive has not yet returned.
    #[default]
    Starting,
    /// The child is running and its streams are being pumped.
    Running,
    /// The child exited with status 0.
    Succeeded,
    /// The child could not start, or exited with a failure status.
    Failed,
    /// The timeout fired and the child was killed.
    TimedOut,
}

/// Rejected state transition.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid execution state transition from {from:?} to {to:?}")]
pub struct InvalidTransition {
    pub from: ExecutionState,
    pub to: ExecutionState,
}

impl ExecutionState {
    /// Check if transition to target state is valid.
    ///
    /// Valid transitions:
    /// - Starting -> Running
    /// - Starting -> Failed
    /// - Running -> Succeeded
    /// - Running -> Failed
    /// - Running -> TimedOut
    pub fn can_transition_to(&self, target: ExecutionState) -> bool {
        use ExecutionState::*;
        matches!(
            (*self, target),
            (Starting, Running)
                | (Starting, Failed)
                | (Running, Succeeded)
                | (Running, Failed)
                | (Running, TimedOut)
        )
    }

    /// Attempt to transition to a new state.
    pub fn transition_to(
        &mut self,
        target: ExecutionState,
    ) -> std::result::Result<(), InvalidTransition> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(InvalidTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Succeeded | ExecutionState::Failed | ExecutionState::TimedOut
        )
    }
}

/// Commits the outcome of an execution at most once.
pub(crate) struct Settler {
    state: ExecutionState,
    tx: Option<oneshot::Sender<Result<Option<String>>>>,
}

impl Settler {
    pub(crate) fn new(tx: oneshot::Sender<Result<Option<String>>>) -> Self {
        Self {
            state: ExecutionState::Starting,
            tx: Some(tx),
        }
    }

    pub(crate) fn state(&self) -> ExecutionState {
        self.state
    }

    /// Move from `Starting` to `Running`.
    pub(crate) fn start(&mut self) -> bool {
        self.state.transition_to(ExecutionState::Running).is_ok()
    }

    /// Enter terminal state `target` and deliver `outcome`.
    ///
    /// Returns `false`, dropping `outcome`, if the execution already settled
    /// or `target` is not reachable from the current state.
    pub(crate) fn settle(
        &mut self,
        target: ExecutionState,
        outcome: Result<Option<String>>,
    ) -> bool {
        if !target.is_terminal() || self.tx.is_none() {
            debug!(state = ?self.state, target = ?target, "ignoring late settlement");
            return false;
        }
        if let Err(e) = self.state.transition_to(target) {
            debug!(error = %e, "ignoring settlement");
            return false;
        }
        if let Some(tx) = self.tx.take() {
            // The receiver may already be gone if the caller dropped the deferred.
            let _ = tx.send(outcome);
        }
        true
    }
}
