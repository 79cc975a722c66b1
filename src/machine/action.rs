//! Queued units of transition work.

use serde::{Deserialize, Serialize};

/// One deferred unit of work in a transition.
///
/// Actions are produced in one burst by the transition planner and drained
/// one at a time by the executor. Each action is bound to the state whose
/// closure callback triggers it: a `Close` fires in the context of the
/// state being closed, an `Enter` fires in the context of the parent that
/// receives the new child.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Close the named currently-open state.
    Close {
        /// Qualified name of the state to close
        state: String,
    },
    /// Begin executing the named child state under the named parent.
    Enter {
        /// Qualified name of the enclosing state
        parent: String,
        /// Qualified name of the child state to enter
        child: String,
    },
}

impl Action {
    /// The state whose closure callback this action fires on.
    pub fn bound_state(&self) -> &str {
        match self {
            Action::Close { state } => state,
            Action::Enter { parent, .. } => parent,
        }
    }
}
