//! Build errors for state tree construction.

use thiserror::Error;

/// Errors that can occur when building a state tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("state name must not be empty")]
    EmptyStateName,

    #[error("state '{0}' is already defined")]
    DuplicateState(String),

    #[error("parent state '{0}' is not defined")]
    UnknownParent(String),

    #[error("initial state not specified. Call .initial(name) before .build()")]
    MissingInitialState,

    #[error("state '{0}' is not defined")]
    UnknownState(String),

    #[error("state '{0}' is not a leaf state")]
    NotALeafState(String),
}
