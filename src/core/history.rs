//! Transition history tracking.
//!
//! Records every completed leaf-to-leaf transition of a machine instance.
//! The history is immutable - `record` returns a new history with the
//! entry added - and serializes as part of the instance's durable snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of one completed transition between leaf states.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Qualified name of the leaf state the machine left
    pub from: String,
    /// Qualified name of the leaf state the machine arrived in
    pub to: String,
    /// When the transition finished draining
    pub timestamp: DateTime<Utc>,
}

/// Ordered history of completed transitions.
///
/// # Example
///
/// ```rust
/// use canopy::core::{TransitionHistory, TransitionRecord};
/// use chrono::Utc;
///
/// let history = TransitionHistory::new();
/// let history = history.record(TransitionRecord {
///     from: "Draft".to_string(),
///     to: "Review".to_string(),
///     timestamp: Utc::now(),
/// });
///
/// assert_eq!(history.records().len(), 1);
/// assert_eq!(history.path(), vec!["Draft", "Review"]);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransitionHistory {
    records: Vec<TransitionRecord>,
}

impl TransitionHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    ///
    /// The existing history is left unchanged.
    pub fn record(&self, record: TransitionRecord) -> Self {
        let mut records = self.records.clone();
        records.push(record);
        Self { records }
    }

    /// The sequence of leaf states visited: the first record's source
    /// followed by every record's destination.
    pub fn path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        if let Some(first) = self.records.first() {
            path.push(first.from.as_str());
        }
        for record in &self.records {
            path.push(record.to.as_str());
        }
        path
    }

    /// Elapsed time between the first and last recorded transition, or
    /// `None` for an empty history.
    pub fn duration(&self) -> Option<Duration> {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => last
                .timestamp
                .signed_duration_since(first.timestamp)
                .to_std()
                .ok(),
            _ => None,
        }
    }

    /// All recorded transitions in order.
    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }
}
