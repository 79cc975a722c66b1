//! Builder for constructing state trees.

use crate::builder::error::BuildError;
use crate::core::{StateId, StateNode, StateTree};
use std::collections::HashMap;

/// Builder for constructing state trees with a fluent API.
///
/// States are declared top-down: the root first, then each child under an
/// already-declared parent. Declaration order of siblings is preserved and
/// significant for transition planning. All validation happens in
/// [`build`](StateTreeBuilder::build).
///
/// # Example
///
/// ```rust
/// use canopy::builder::StateTreeBuilder;
///
/// let tree = StateTreeBuilder::new("Order")
///     .child("Order", "Open")
///     .child("Open", "AwaitingPayment")
///     .child("Open", "AwaitingShipment")
///     .child("Order", "Closed")
///     .initial("AwaitingPayment")
///     .completed("Closed")
///     .build()
///     .unwrap();
///
/// assert_eq!(tree.initial_state(), "AwaitingPayment");
/// ```
pub struct StateTreeBuilder {
    root: String,
    children: Vec<(String, String)>,
    initial: Option<String>,
    completed: Option<String>,
}

impl StateTreeBuilder {
    /// Start a tree with the given root state.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            children: Vec::new(),
            initial: None,
            completed: None,
        }
    }

    /// Declare a child state under an already-declared parent.
    pub fn child(mut self, parent: impl Into<String>, name: impl Into<String>) -> Self {
        self.children.push((parent.into(), name.into()));
        self
    }

    /// Set the leaf state the machine starts in (required).
    pub fn initial(mut self, name: impl Into<String>) -> Self {
        self.initial = Some(name.into());
        self
    }

    /// Set the leaf state that marks the machine as completed (optional).
    pub fn completed(mut self, name: impl Into<String>) -> Self {
        self.completed = Some(name.into());
        self
    }

    /// Build the tree.
    ///
    /// Validates that every name is non-empty and unique, every parent was
    /// declared before its children, an initial state was given, and the
    /// initial and completed states are leaves.
    pub fn build(self) -> Result<StateTree, BuildError> {
        let mut nodes: Vec<StateNode> = Vec::with_capacity(self.children.len() + 1);
        let mut by_name: HashMap<String, StateId> = HashMap::new();

        if self.root.is_empty() {
            return Err(BuildError::EmptyStateName);
        }
        by_name.insert(self.root.clone(), StateId(0));
        nodes.push(StateNode {
            name: self.root,
            parent: None,
            children: Vec::new(),
        });

        for (parent, name) in self.children {
            if name.is_empty() {
                return Err(BuildError::EmptyStateName);
            }
            if by_name.contains_key(&name) {
                return Err(BuildError::DuplicateState(name));
            }
            let parent_id = *by_name
                .get(&parent)
                .ok_or(BuildError::UnknownParent(parent))?;

            let id = StateId(nodes.len());
            by_name.insert(name.clone(), id);
            nodes.push(StateNode {
                name,
                parent: Some(parent_id),
                children: Vec::new(),
            });
            nodes[parent_id.0].children.push(id);
        }

        let initial = self.initial.ok_or(BuildError::MissingInitialState)?;
        require_leaf(&nodes, &by_name, &initial)?;
        if let Some(completed) = &self.completed {
            require_leaf(&nodes, &by_name, completed)?;
        }

        Ok(StateTree::from_parts(nodes, by_name, initial, self.completed))
    }
}

fn require_leaf(
    nodes: &[StateNode],
    by_name: &HashMap<String, StateId>,
    name: &str,
) -> Result<(), BuildError> {
    let id = by_name
        .get(name)
        .ok_or_else(|| BuildError::UnknownState(name.to_string()))?;
    if !nodes[id.0].children.is_empty() {
        return Err(BuildError::NotALeafState(name.to_string()));
    }
    Ok(())
}
