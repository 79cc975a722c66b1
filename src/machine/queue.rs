//! Ordered queue of pending transition actions.

use crate::machine::action::Action;
use crate::machine::error::ExecutionError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// FIFO queue of pending [`Action`]s for one machine instance.
///
/// The queue carries a lock flag mirroring its drain discipline: the planner
/// fills the queue in one burst and locks it, the executor drains it one
/// action per scheduler callback, and the lock drops only once the queue is
/// empty again. Enqueueing into a locked queue is a programming error, not
/// a recoverable condition.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActionQueue {
    actions: VecDeque<Action>,
    locked: bool,
}

impl ActionQueue {
    /// Create an empty, unlocked queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action.
    ///
    /// Fails with [`ExecutionError::QueueLocked`] if the queue still holds
    /// unprocessed items from a previous plan.
    pub fn enqueue(&mut self, action: Action) -> Result<(), ExecutionError> {
        if self.locked {
            return Err(ExecutionError::QueueLocked);
        }
        self.actions.push_back(action);
        Ok(())
    }

    /// Lock the queue until it drains empty.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// The next action to execute, if any.
    pub fn front(&self) -> Option<&Action> {
        self.actions.front()
    }

    /// Remove and return the head action. Drops the lock when the last
    /// action leaves the queue.
    pub fn dequeue(&mut self) -> Option<Action> {
        let action = self.actions.pop_front();
        if self.actions.is_empty() {
            self.locked = false;
        }
        action
    }

    /// True iff no actions are pending.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of pending actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// True while the queue holds unprocessed items from a plan.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Pending actions in drain order.
    pub fn pending(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }
}
