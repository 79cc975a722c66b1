//! Hierarchical state tree shared by all instances of a machine definition.
//!
//! A `StateTree` is built once (see [`crate::builder::StateTreeBuilder`]),
//! then shared read-only by every running instance of the same definition.
//! Nodes live in an arena and refer to each other by [`StateId`] index, so
//! the tree is cheap to clone, serialize, and share.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of a state node within its tree's arena.
///
/// Ids are only meaningful for the tree that produced them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct StateId(pub(crate) usize);

/// A single state in the tree.
///
/// A node with no children is a **leaf state** - the only kind of state a
/// machine instance may be "currently in". A node's children keep their
/// declaration order, which is significant: transition planning always picks
/// the first matching child.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateNode {
    pub(crate) name: String,
    pub(crate) parent: Option<StateId>,
    pub(crate) children: Vec<StateId>,
}

impl StateNode {
    /// The node's qualified name, unique within its tree.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The enclosing state, or `None` for the root.
    pub fn parent(&self) -> Option<StateId> {
        self.parent
    }

    /// Child states in declaration order.
    pub fn children(&self) -> &[StateId] {
        &self.children
    }
}

/// Immutable hierarchical state tree.
///
/// Exactly one root; every other node has exactly one parent. The tree also
/// records which leaf the machine starts in and, optionally, which leaf
/// marks the machine as completed.
///
/// # Example
///
/// ```rust
/// use canopy::builder::StateTreeBuilder;
///
/// let tree = StateTreeBuilder::new("Root")
///     .child("Root", "A")
///     .child("A", "A1")
///     .child("A", "A2")
///     .initial("A1")
///     .build()
///     .unwrap();
///
/// let a1 = tree.find("A1").unwrap();
/// assert!(tree.is_leaf(a1));
/// assert_eq!(tree.name(tree.root()), "Root");
/// assert!(tree.contains(tree.root(), "A2"));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateTree {
    nodes: Vec<StateNode>,
    by_name: HashMap<String, StateId>,
    initial: String,
    completed: Option<String>,
}

impl StateTree {
    pub(crate) fn from_parts(
        nodes: Vec<StateNode>,
        by_name: HashMap<String, StateId>,
        initial: String,
        completed: Option<String>,
    ) -> Self {
        Self {
            nodes,
            by_name,
            initial,
            completed,
        }
    }

    /// The root state. The root is the unique node with no parent.
    pub fn root(&self) -> StateId {
        StateId(0)
    }

    /// Look up a state by qualified name.
    ///
    /// Returns `None` if no state with that name exists in the tree.
    pub fn find(&self, name: &str) -> Option<StateId> {
        self.by_name.get(name).copied()
    }

    /// The node behind an id.
    pub fn node(&self, id: StateId) -> &StateNode {
        &self.nodes[id.0]
    }

    /// The qualified name of a state.
    pub fn name(&self, id: StateId) -> &str {
        &self.nodes[id.0].name
    }

    /// The enclosing state, or `None` for the root.
    pub fn parent_of(&self, id: StateId) -> Option<StateId> {
        self.nodes[id.0].parent
    }

    /// Child states in declaration order.
    pub fn children_of(&self, id: StateId) -> &[StateId] {
        &self.nodes[id.0].children
    }

    /// True iff the state has no child states.
    pub fn is_leaf(&self, id: StateId) -> bool {
        self.nodes[id.0].children.is_empty()
    }

    /// True iff the state has no enclosing state.
    pub fn is_root(&self, id: StateId) -> bool {
        self.nodes[id.0].parent.is_none()
    }

    /// True iff a state named `name` exists in `ancestor`'s subtree,
    /// `ancestor` itself included.
    pub fn contains(&self, ancestor: StateId, name: &str) -> bool {
        let mut stack = vec![ancestor];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.name == name {
                return true;
            }
            stack.extend(node.children.iter().copied());
        }
        false
    }

    /// The leaf state the machine starts in.
    pub fn initial_state(&self) -> &str {
        &self.initial
    }

    /// The leaf state that marks the machine as completed, if one was
    /// declared.
    pub fn completed_state(&self) -> Option<&str> {
        self.completed.as_deref()
    }

    /// Number of states in the tree.
    pub fn state_count(&self) -> usize {
        self.nodes.len()
    }
}
