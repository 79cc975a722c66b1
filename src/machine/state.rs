//! Per-instance execution state.

use crate::machine::queue::ActionQueue;
use serde::{Deserialize, Serialize};

/// The mutable state of one running machine instance.
///
/// Owned exclusively by one activation and fully serializable: everything
/// the instance needs to survive a suspension lives here (plus the
/// [`crate::core::TransitionHistory`]), so the host can snapshot it
/// between callbacks.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExecutionState {
    pub(crate) current_state: Option<String>,
    pub(crate) previous_state: Option<String>,
    pub(crate) next_state: Option<String>,
    pub(crate) completed: bool,
    pub(crate) scheduler_busy: bool,
    pub(crate) queue: ActionQueue,
}

impl ExecutionState {
    /// The innermost state the machine is currently in. Names a leaf state
    /// whenever the machine is at rest; passes through composite states
    /// while a transition drains. `None` before start.
    pub fn current_state(&self) -> Option<&str> {
        self.current_state.as_deref()
    }

    /// The leaf state most recently closed by a transition.
    pub fn previous_state(&self) -> Option<&str> {
        self.previous_state.as_deref()
    }

    /// The pending transition request, if one has been made and not yet
    /// planned.
    pub fn next_state(&self) -> Option<&str> {
        self.next_state.as_deref()
    }

    /// True once the machine has reached its completed state or closed its
    /// root. No further transitions are planned after this.
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// True while the host scheduler has outstanding work from an executed
    /// action. Queue draining halts while this is set.
    pub fn is_scheduler_busy(&self) -> bool {
        self.scheduler_busy
    }

    /// The pending action queue.
    pub fn queue(&self) -> &ActionQueue {
        &self.queue
    }
}
