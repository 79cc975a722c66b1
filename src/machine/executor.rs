//! The execution-state driver.
//!
//! [`StateMachineExecutor`] owns one instance's [`ExecutionState`] and
//! drains its action queue against the host engine, one scheduler callback
//! at a time. The host is passed into each entry point and never stored, so
//! the instance can be snapshotted between callbacks.
//!
//! The driver cycles through four logical phases, discriminated by its
//! flags: **idle** (queue empty, scheduler idle), **planning** (a pending
//! request is turned into queued actions), **draining** (queued actions
//! execute until the queue empties or the scheduler reports it is busy),
//! and **suspended** (`scheduler_busy` set; every entry is a no-op until
//! the next closure callback).

use crate::core::{StateTree, TransitionHistory, TransitionRecord};
use crate::machine::action::Action;
use crate::machine::error::ExecutionError;
use crate::machine::host::{HostEngine, SchedulerStatus};
use crate::machine::planner::plan_transition;
use crate::machine::state::ExecutionState;
use chrono::Utc;
use std::sync::Arc;

/// Drives one state machine instance against a host engine.
///
/// # Example
///
/// ```rust
/// use canopy::builder::StateTreeBuilder;
/// use canopy::machine::{HostEngine, SchedulerStatus, StateMachineExecutor};
/// use std::sync::Arc;
///
/// // A host that executes everything inline.
/// struct InlineHost;
/// impl HostEngine for InlineHost {
///     fn close_state(&mut self, _state: &str) -> SchedulerStatus {
///         SchedulerStatus::Idle
///     }
///     fn execute_child(&mut self, _parent: &str, _child: &str) -> SchedulerStatus {
///         SchedulerStatus::Idle
///     }
/// }
///
/// let tree = Arc::new(
///     StateTreeBuilder::new("Root")
///         .child("Root", "A")
///         .child("A", "A1")
///         .child("A", "A2")
///         .initial("A1")
///         .build()
///         .unwrap(),
/// );
///
/// let mut host = InlineHost;
/// let mut executor = StateMachineExecutor::new(tree);
/// executor.start(&mut host).unwrap();
/// assert_eq!(executor.execution_state().current_state(), Some("A1"));
///
/// executor.request_transition("A2");
/// executor.on_state_closed(&mut host, "A1").unwrap();
/// assert_eq!(executor.execution_state().current_state(), Some("A2"));
/// ```
pub struct StateMachineExecutor {
    tree: Arc<StateTree>,
    exec: ExecutionState,
    history: TransitionHistory,
}

impl StateMachineExecutor {
    /// Create an executor for a fresh, unstarted instance.
    pub fn new(tree: Arc<StateTree>) -> Self {
        Self {
            tree,
            exec: ExecutionState::default(),
            history: TransitionHistory::new(),
        }
    }

    pub(crate) fn from_snapshot(
        tree: Arc<StateTree>,
        exec: ExecutionState,
        history: TransitionHistory,
    ) -> Self {
        Self {
            tree,
            exec,
            history,
        }
    }

    /// The shared definition tree this instance runs over.
    pub fn tree(&self) -> &StateTree {
        &self.tree
    }

    /// The instance's execution state.
    pub fn execution_state(&self) -> &ExecutionState {
        &self.exec
    }

    /// Completed transitions so far.
    pub fn history(&self) -> &TransitionHistory {
        &self.history
    }

    /// Enter the tree's initial leaf state.
    ///
    /// Plans the descent from the root and drains it in the root's context.
    /// Fails with [`ExecutionError::AlreadyStarted`] if the machine already
    /// has a current state or has completed.
    pub fn start(&mut self, host: &mut dyn HostEngine) -> Result<(), ExecutionError> {
        if self.exec.current_state.is_some() || self.exec.completed {
            return Err(ExecutionError::AlreadyStarted);
        }
        let root = self.tree.root();
        let root_name = self.tree.name(root).to_string();
        self.exec.current_state = Some(root_name.clone());

        let plan = plan_transition(&self.tree, root, self.tree.initial_state())?;
        for action in plan {
            self.exec.queue.enqueue(action)?;
        }
        if !self.exec.queue.is_empty() {
            self.exec.queue.lock();
        }
        self.process_actions(host, &root_name)
    }

    /// Request a transition to the named leaf state.
    ///
    /// This is the external collaborator's single write: it only records
    /// the pending target. The request is planned on the next closure
    /// callback (or an explicit [`process_transition_request`] call).
    ///
    /// [`process_transition_request`]: StateMachineExecutor::process_transition_request
    pub fn request_transition(&mut self, target: impl Into<String>) {
        self.exec.next_state = Some(target.into());
    }

    /// Convert a pending transition request into queued actions.
    ///
    /// No-op when no request is pending. A completed machine discards the
    /// request and plans nothing. The request is cleared once a plan has
    /// been computed from it; on success the queue holds the plan and is
    /// locked until drained.
    pub fn process_transition_request(&mut self) -> Result<(), ExecutionError> {
        if self.exec.completed {
            self.exec.next_state = None;
            return Ok(());
        }
        let Some(target) = self.exec.next_state.take() else {
            return Ok(());
        };
        let current = self
            .exec
            .current_state
            .clone()
            .ok_or(ExecutionError::NotStarted)?;
        let current_id =
            self.tree
                .find(&current)
                .ok_or_else(|| ExecutionError::InvalidStateReference {
                    target: current.clone(),
                })?;
        if self.tree.find(&target).is_none() {
            return Err(ExecutionError::InvalidStateReference { target });
        }

        let plan = plan_transition(&self.tree, current_id, &target)?;
        for action in plan {
            self.exec.queue.enqueue(action)?;
        }
        if !self.exec.queue.is_empty() {
            self.exec.queue.lock();
        }
        Ok(())
    }

    /// Drain queued actions in the context of `context_state`.
    ///
    /// A guaranteed no-op while the scheduler is busy - this is how a
    /// nested host callback yields control back up without double-draining.
    /// Otherwise actions execute from the head of the queue for as long as
    /// each head is bound to the current context; the context follows the
    /// executed actions (into the parent after a close, into the child
    /// after an enter), which is exactly the sequence of closure callbacks
    /// a synchronous host would deliver. Draining halts immediately after
    /// any action that leaves the scheduler busy; the remaining actions
    /// stay queued for the next callback.
    pub fn process_actions(
        &mut self,
        host: &mut dyn HostEngine,
        context_state: &str,
    ) -> Result<(), ExecutionError> {
        if self.exec.scheduler_busy {
            return Ok(());
        }
        let was_locked = self.exec.queue.is_locked();
        let mut context = context_state.to_string();
        loop {
            match self.exec.queue.front() {
                Some(head) if head.bound_state() == context => {}
                _ => break,
            }
            let Some(action) = self.exec.queue.dequeue() else {
                break;
            };
            context = self.execute_action(host, &action)?;
            if self.exec.scheduler_busy {
                break;
            }
        }

        // The last action of a plan completes the transition even when it
        // left the scheduler busy.
        if was_locked && self.exec.queue.is_empty() {
            self.record_completed_transition();
        }
        Ok(())
    }

    /// The closure-event subscription target.
    ///
    /// The host invokes this once per state completing, passing the state
    /// in whose context the callback runs. The callback itself signals that
    /// the host's outstanding work finished, so the busy flag is cleared
    /// before planning and draining.
    pub fn on_state_closed(
        &mut self,
        host: &mut dyn HostEngine,
        state: &str,
    ) -> Result<(), ExecutionError> {
        self.exec.scheduler_busy = false;
        self.process_transition_request()?;
        self.process_actions(host, state)
    }

    fn execute_action(
        &mut self,
        host: &mut dyn HostEngine,
        action: &Action,
    ) -> Result<String, ExecutionError> {
        match action {
            Action::Close { state } => {
                let id = self
                    .tree
                    .find(state)
                    .ok_or_else(|| ExecutionError::InvalidAction {
                        state: state.clone(),
                    })?;
                let status = host.close_state(state);
                if self.tree.is_leaf(id) {
                    self.exec.previous_state = Some(state.clone());
                }
                let next_context = match self.tree.parent_of(id) {
                    Some(parent) => {
                        let name = self.tree.name(parent).to_string();
                        self.exec.current_state = Some(name.clone());
                        name
                    }
                    None => {
                        // The root closed: the machine is done.
                        self.exec.current_state = None;
                        self.exec.completed = true;
                        state.clone()
                    }
                };
                self.exec.scheduler_busy = status == SchedulerStatus::Busy;
                Ok(next_context)
            }
            Action::Enter { parent, child } => {
                if self.tree.find(parent).is_none() {
                    return Err(ExecutionError::InvalidAction {
                        state: parent.clone(),
                    });
                }
                if self.tree.find(child).is_none() {
                    return Err(ExecutionError::InvalidAction {
                        state: child.clone(),
                    });
                }
                let status = host.execute_child(parent, child);
                self.exec.current_state = Some(child.clone());
                if self.tree.completed_state() == Some(child.as_str()) {
                    self.exec.completed = true;
                }
                self.exec.scheduler_busy = status == SchedulerStatus::Busy;
                Ok(child.clone())
            }
        }
    }

    fn record_completed_transition(&mut self) {
        let (Some(from), Some(to)) = (
            self.exec.previous_state.clone(),
            self.exec.current_state.clone(),
        ) else {
            return;
        };
        let Some(id) = self.tree.find(&to) else {
            return;
        };
        if !self.tree.is_leaf(id) {
            return;
        }
        self.history = self.history.record(TransitionRecord {
            from,
            to,
            timestamp: Utc::now(),
        });
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::StateTreeBuilder;

    /// Test host that records every call and reports a scripted status.
    struct RecordingHost {
        calls: Vec<String>,
        busy: bool,
    }

    impl RecordingHost {
        fn synchronous() -> Self {
            Self {
                calls: Vec::new(),
                busy: false,
            }
        }

        fn asynchronous() -> Self {
            Self {
                calls: Vec::new(),
                busy: true,
            }
        }

        fn status(&self) -> SchedulerStatus {
            if self.busy {
                SchedulerStatus::Busy
            } else {
                SchedulerStatus::Idle
            }
        }
    }

    impl HostEngine for RecordingHost {
        fn close_state(&mut self, state: &str) -> SchedulerStatus {
            self.calls.push(format!("close {state}"));
            self.status()
        }

        fn execute_child(&mut self, parent: &str, child: &str) -> SchedulerStatus {
            self.calls.push(format!("enter {parent}->{child}"));
            self.status()
        }
    }

    fn sample_tree() -> Arc<StateTree> {
        Arc::new(
            StateTreeBuilder::new("Root")
                .child("Root", "A")
                .child("A", "A1")
                .child("A", "A2")
                .child("Root", "B")
                .child("B", "B1")
                .child("B", "B2")
                .initial("A1")
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn start_enters_the_initial_leaf() {
        let mut host = RecordingHost::synchronous();
        let mut executor = StateMachineExecutor::new(sample_tree());

        executor.start(&mut host).unwrap();

        assert_eq!(executor.execution_state().current_state(), Some("A1"));
        assert!(executor.execution_state().queue().is_empty());
        assert!(!executor.execution_state().is_completed());
        assert_eq!(host.calls, vec!["enter Root->A", "enter A->A1"]);
    }

    #[test]
    fn start_twice_is_an_error() {
        let mut host = RecordingHost::synchronous();
        let mut executor = StateMachineExecutor::new(sample_tree());

        executor.start(&mut host).unwrap();
        let err = executor.start(&mut host).unwrap_err();
        assert_eq!(err, ExecutionError::AlreadyStarted);
    }

    #[test]
    fn synchronous_host_drains_a_transition_in_one_callback() {
        let mut host = RecordingHost::synchronous();
        let mut executor = StateMachineExecutor::new(sample_tree());
        executor.start(&mut host).unwrap();
        host.calls.clear();

        executor.request_transition("B2");
        executor.on_state_closed(&mut host, "A1").unwrap();

        assert_eq!(executor.execution_state().current_state(), Some("B2"));
        assert_eq!(executor.execution_state().previous_state(), Some("A1"));
        assert!(executor.execution_state().queue().is_empty());
        assert!(!executor.execution_state().queue().is_locked());
        assert_eq!(
            host.calls,
            vec!["close A1", "close A", "enter Root->B", "enter B->B2"]
        );
        assert_eq!(executor.history().records().len(), 1);
        assert_eq!(executor.history().path(), vec!["A1", "B2"]);
    }

    #[test]
    fn request_to_the_current_state_plans_nothing() {
        let mut host = RecordingHost::synchronous();
        let mut executor = StateMachineExecutor::new(sample_tree());
        executor.start(&mut host).unwrap();
        host.calls.clear();

        executor.request_transition("A1");
        executor.on_state_closed(&mut host, "A1").unwrap();

        assert!(executor.execution_state().queue().is_empty());
        assert!(executor.execution_state().next_state().is_none());
        assert_eq!(executor.execution_state().current_state(), Some("A1"));
        assert!(host.calls.is_empty());
        assert!(executor.history().records().is_empty());
    }

    #[test]
    fn asynchronous_host_drains_one_action_per_callback() {
        let mut host = RecordingHost::asynchronous();
        let mut executor = StateMachineExecutor::new(sample_tree());

        // Entry suspends after each enter.
        executor.start(&mut host).unwrap();
        assert_eq!(host.calls, vec!["enter Root->A"]);
        assert!(executor.execution_state().is_scheduler_busy());
        assert_eq!(executor.execution_state().queue().len(), 1);

        executor.on_state_closed(&mut host, "A").unwrap();
        assert_eq!(executor.execution_state().current_state(), Some("A1"));
        assert!(executor.execution_state().queue().is_empty());
        host.calls.clear();

        executor.request_transition("B2");

        executor.on_state_closed(&mut host, "A1").unwrap();
        assert_eq!(host.calls, vec!["close A1"]);
        assert_eq!(executor.execution_state().queue().len(), 3);

        executor.on_state_closed(&mut host, "A").unwrap();
        assert_eq!(host.calls, vec!["close A1", "close A"]);

        executor.on_state_closed(&mut host, "Root").unwrap();
        assert_eq!(
            host.calls,
            vec!["close A1", "close A", "enter Root->B"]
        );

        executor.on_state_closed(&mut host, "B").unwrap();
        assert_eq!(
            host.calls,
            vec!["close A1", "close A", "enter Root->B", "enter B->B2"]
        );
        assert_eq!(executor.execution_state().current_state(), Some("B2"));
        assert_eq!(executor.execution_state().previous_state(), Some("A1"));
        assert!(executor.execution_state().queue().is_empty());
        assert_eq!(executor.history().path(), vec!["A1", "B2"]);
    }

    #[test]
    fn process_actions_is_a_noop_while_the_scheduler_is_busy() {
        let mut host = RecordingHost::asynchronous();
        let mut executor = StateMachineExecutor::new(sample_tree());
        executor.start(&mut host).unwrap();
        executor.on_state_closed(&mut host, "A").unwrap();
        executor.request_transition("B2");
        executor.on_state_closed(&mut host, "A1").unwrap();

        // Mid-transition: busy, three actions pending.
        assert!(executor.execution_state().is_scheduler_busy());
        let pending = executor.execution_state().queue().len();
        host.calls.clear();

        executor.process_actions(&mut host, "A").unwrap();

        assert!(host.calls.is_empty());
        assert_eq!(executor.execution_state().queue().len(), pending);
        assert!(executor.execution_state().is_scheduler_busy());
        assert!(executor.execution_state().queue().is_locked());
    }

    #[test]
    fn mismatched_context_leaves_the_queue_untouched() {
        let mut host = RecordingHost::asynchronous();
        let mut executor = StateMachineExecutor::new(sample_tree());
        executor.start(&mut host).unwrap();
        executor.on_state_closed(&mut host, "A").unwrap();
        executor.request_transition("B2");
        executor.on_state_closed(&mut host, "A1").unwrap();
        host.calls.clear();

        // The head action is bound to "A"; a callback in an unrelated
        // context must not execute it.
        executor.on_state_closed(&mut host, "B1").unwrap();

        assert!(host.calls.is_empty());
        assert_eq!(executor.execution_state().queue().len(), 3);
        assert_eq!(
            executor.execution_state().queue().front(),
            Some(&Action::Close {
                state: "A".to_string()
            })
        );
    }

    #[test]
    fn unknown_request_target_is_an_invalid_reference() {
        let mut host = RecordingHost::synchronous();
        let mut executor = StateMachineExecutor::new(sample_tree());
        executor.start(&mut host).unwrap();

        executor.request_transition("Ghost");
        let err = executor.on_state_closed(&mut host, "A1").unwrap_err();
        assert_eq!(
            err,
            ExecutionError::InvalidStateReference {
                target: "Ghost".to_string()
            }
        );
    }

    #[test]
    fn composite_request_target_enqueues_nothing() {
        let mut host = RecordingHost::synchronous();
        let mut executor = StateMachineExecutor::new(sample_tree());
        executor.start(&mut host).unwrap();

        executor.request_transition("B");
        let err = executor.on_state_closed(&mut host, "A1").unwrap_err();
        assert_eq!(
            err,
            ExecutionError::InvalidTransitionPath {
                target: "B".to_string()
            }
        );
        assert!(executor.execution_state().queue().is_empty());
    }

    #[test]
    fn request_before_start_is_not_started() {
        let mut executor = StateMachineExecutor::new(sample_tree());
        executor.request_transition("A2");
        let err = executor.process_transition_request().unwrap_err();
        assert_eq!(err, ExecutionError::NotStarted);
    }

    #[test]
    fn request_while_draining_hits_the_queue_lock() {
        let mut host = RecordingHost::asynchronous();
        let mut executor = StateMachineExecutor::new(sample_tree());
        executor.start(&mut host).unwrap();
        executor.on_state_closed(&mut host, "A").unwrap();
        executor.request_transition("B2");
        executor.on_state_closed(&mut host, "A1").unwrap();

        // A second request while the first is still draining is a
        // programming error caught by the lock.
        executor.request_transition("A2");
        let err = executor.on_state_closed(&mut host, "A").unwrap_err();
        assert_eq!(err, ExecutionError::QueueLocked);
    }

    #[test]
    fn entering_the_completed_state_latches_completion() {
        let tree = Arc::new(
            StateTreeBuilder::new("Root")
                .child("Root", "Work")
                .child("Root", "Done")
                .initial("Work")
                .completed("Done")
                .build()
                .unwrap(),
        );
        let mut host = RecordingHost::synchronous();
        let mut executor = StateMachineExecutor::new(tree);
        executor.start(&mut host).unwrap();
        host.calls.clear();

        executor.request_transition("Done");
        executor.on_state_closed(&mut host, "Work").unwrap();

        // The machine stays in the completed leaf; teardown of the still
        // open chain is the host's business.
        assert!(executor.execution_state().is_completed());
        assert_eq!(executor.execution_state().current_state(), Some("Done"));
        assert_eq!(host.calls, vec!["close Work", "enter Root->Done"]);
        assert_eq!(executor.history().path(), vec!["Work", "Done"]);
    }

    #[test]
    fn completed_machine_discards_further_requests() {
        let tree = Arc::new(
            StateTreeBuilder::new("Root")
                .child("Root", "Work")
                .child("Root", "Done")
                .initial("Work")
                .completed("Done")
                .build()
                .unwrap(),
        );
        let mut host = RecordingHost::synchronous();
        let mut executor = StateMachineExecutor::new(tree);
        executor.start(&mut host).unwrap();
        executor.request_transition("Done");
        executor.on_state_closed(&mut host, "Work").unwrap();
        host.calls.clear();

        executor.request_transition("Work");
        executor.on_state_closed(&mut host, "Done").unwrap();

        assert!(executor.execution_state().next_state().is_none());
        assert!(executor.execution_state().queue().is_empty());
        assert!(host.calls.is_empty());
        assert_eq!(executor.execution_state().current_state(), Some("Done"));
    }

    #[test]
    fn history_records_every_completed_transition() {
        let mut host = RecordingHost::synchronous();
        let mut executor = StateMachineExecutor::new(sample_tree());
        executor.start(&mut host).unwrap();

        executor.request_transition("A2");
        executor.on_state_closed(&mut host, "A1").unwrap();
        executor.request_transition("B1");
        executor.on_state_closed(&mut host, "A2").unwrap();

        assert_eq!(executor.history().path(), vec!["A1", "A2", "B1"]);
    }
}
