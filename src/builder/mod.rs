//! Fluent construction and validation of state trees.

pub mod error;
mod tree;

pub use error::BuildError;
pub use tree::StateTreeBuilder;
