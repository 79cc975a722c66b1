//! Checkpoint and resume functionality for machine instances.
//!
//! Everything an instance needs between scheduler callbacks lives in its
//! [`ExecutionState`] and [`TransitionHistory`], so a checkpoint is a plain
//! value: capture it at any suspension point, persist it as JSON or binary,
//! and restore it later against the same definition tree.

use crate::core::TransitionHistory;
use crate::machine::{ExecutionState, StateMachineExecutor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for the checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of one machine instance.
///
/// The definition tree is not part of the snapshot: it is shared,
/// immutable configuration that the host supplies again at restore time.
/// Restoring validates the snapshot's state names against that tree;
/// queued actions are re-validated as they drain.
///
/// # Example
///
/// ```rust
/// use canopy::builder::StateTreeBuilder;
/// use canopy::checkpoint::Checkpoint;
/// use canopy::machine::StateMachineExecutor;
/// use std::sync::Arc;
///
/// let tree = Arc::new(
///     StateTreeBuilder::new("Root")
///         .child("Root", "A")
///         .initial("A")
///         .build()
///         .unwrap(),
/// );
///
/// let executor = StateMachineExecutor::new(Arc::clone(&tree));
/// let checkpoint = Checkpoint::capture(&executor);
///
/// let json = checkpoint.to_json().unwrap();
/// let restored = Checkpoint::from_json(&json).unwrap();
/// let executor = restored.restore(tree).unwrap();
/// assert!(executor.execution_state().current_state().is_none());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Unique checkpoint identifier
    pub id: Uuid,

    /// When the checkpoint was captured
    pub timestamp: DateTime<Utc>,

    /// The instance's execution state
    pub execution: ExecutionState,

    /// Completed transition history
    pub history: TransitionHistory,
}

impl Checkpoint {
    /// Capture a snapshot of the executor's current state.
    pub fn capture(executor: &StateMachineExecutor) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            execution: executor.execution_state().clone(),
            history: executor.history().clone(),
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from JSON, validating the format version.
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    /// Serialize to a compact binary format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from the binary format, validating the format version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.check_version()?;
        Ok(checkpoint)
    }

    /// Rebuild an executor from this snapshot against its definition tree.
    ///
    /// Validates that every state name held in the snapshot still exists in
    /// the tree. Queued actions are not checked here; the executor
    /// re-validates each one as it drains.
    pub fn restore(
        self,
        tree: Arc<crate::core::StateTree>,
    ) -> Result<StateMachineExecutor, CheckpointError> {
        self.check_version()?;
        for name in [
            self.execution.current_state(),
            self.execution.previous_state(),
            self.execution.next_state(),
        ]
        .into_iter()
        .flatten()
        {
            if tree.find(name).is_none() {
                return Err(CheckpointError::ValidationFailed(format!(
                    "state '{name}' does not exist in the definition tree"
                )));
            }
        }
        Ok(StateMachineExecutor::from_snapshot(
            tree,
            self.execution,
            self.history,
        ))
    }

    fn check_version(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(())
    }
}
