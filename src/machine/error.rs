//! Planning and execution errors.
//!
//! Every error here is structural and deterministic: the same tree and the
//! same request reproduce the same failure. None are retryable - they abort
//! the owning machine instance and surface to the host.

use thiserror::Error;

/// Errors raised by transition planning and action draining.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExecutionError {
    /// A transition request named a state that does not exist in the tree.
    #[error("state '{target}' does not exist in the state tree")]
    InvalidStateReference { target: String },

    /// Ascending from the current state exhausted the tree without finding
    /// an ancestor containing the target.
    #[error("no path from the current state to state '{target}'")]
    UnableToTransition { target: String },

    /// The target is not a leaf state, or descent hit a node whose subtree
    /// claims the target but no child holds it.
    #[error("state '{target}' is not a valid transition target")]
    InvalidTransitionPath { target: String },

    /// A queued action refers to a state no longer present in the tree.
    #[error("queued action is bound to unknown state '{state}'")]
    InvalidAction { state: String },

    /// An action was enqueued while the queue still held unprocessed items.
    #[error("cannot enqueue while the action queue is locked")]
    QueueLocked,

    /// The machine has no current state yet.
    #[error("the state machine has not been started")]
    NotStarted,

    /// `start` was called on a machine that already has a current state.
    #[error("the state machine has already been started")]
    AlreadyStarted,
}
