//! Canopy: a hierarchical state machine execution core for durable workflows.
//!
//! Canopy separates a machine definition from its running instances. The
//! definition is an immutable [`core::StateTree`] - nested states with
//! unique qualified names, built once and shared read-only by every
//! instance. Each instance owns a serializable
//! [`machine::ExecutionState`] and drains transitions cooperatively
//! against a host execution engine that may suspend at any step.
//!
//! # Core Concepts
//!
//! - **State tree**: nested states; only leaf states can be occupied
//! - **Transition planning**: a pure walk producing the close/enter
//!   actions connecting two leaves through their common ancestor
//! - **Action queue**: the planned actions, drained one scheduler
//!   callback at a time, locked until empty
//! - **Checkpoints**: the whole instance state snapshots to JSON or
//!   binary and resumes mid-transition
//!
//! # Example
//!
//! ```rust
//! use canopy::builder::StateTreeBuilder;
//! use canopy::machine::{HostEngine, SchedulerStatus, StateMachineExecutor};
//! use std::sync::Arc;
//!
//! struct InlineHost;
//!
//! impl HostEngine for InlineHost {
//!     fn close_state(&mut self, _state: &str) -> SchedulerStatus {
//!         SchedulerStatus::Idle
//!     }
//!     fn execute_child(&mut self, _parent: &str, _child: &str) -> SchedulerStatus {
//!         SchedulerStatus::Idle
//!     }
//! }
//!
//! let tree = Arc::new(
//!     StateTreeBuilder::new("Order")
//!         .child("Order", "Open")
//!         .child("Open", "AwaitingPayment")
//!         .child("Open", "AwaitingShipment")
//!         .child("Order", "Closed")
//!         .initial("AwaitingPayment")
//!         .completed("Closed")
//!         .build()
//!         .unwrap(),
//! );
//!
//! let mut host = InlineHost;
//! let mut executor = StateMachineExecutor::new(tree);
//! executor.start(&mut host).unwrap();
//! assert_eq!(
//!     executor.execution_state().current_state(),
//!     Some("AwaitingPayment")
//! );
//!
//! executor.request_transition("AwaitingShipment");
//! executor.on_state_closed(&mut host, "AwaitingPayment").unwrap();
//! assert_eq!(
//!     executor.execution_state().current_state(),
//!     Some("AwaitingShipment")
//! );
//! ```

pub mod builder;
pub mod checkpoint;
pub mod core;
pub mod machine;

// Re-export commonly used types
pub use builder::{BuildError, StateTreeBuilder};
pub use checkpoint::{Checkpoint, CheckpointError};
pub use core::{StateId, StateTree, TransitionHistory, TransitionRecord};
pub use machine::{
    Action, ActionQueue, ExecutionError, ExecutionState, HostEngine, SchedulerStatus,
    StateMachineExecutor,
};
