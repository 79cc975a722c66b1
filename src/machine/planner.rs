//! Transition planning over the state tree.
//!
//! Planning is pure: given the current state and a target name, it produces
//! the ordered action sequence connecting them through their lowest common
//! ancestor, or an error. Callers enqueue the plan only on success, so a
//! failed plan never touches the queue.

use crate::core::{StateId, StateTree};
use crate::machine::action::Action;
use crate::machine::error::ExecutionError;

/// Compute the actions taking the machine from `current` to the leaf state
/// named `target`.
///
/// The walk has two phases over the unique tree path:
///
/// 1. **Ascend** from `current`, emitting a `Close` for every state left
///    behind, stopping as soon as the node equals the target or the target
///    lies in its subtree. Running out of ancestors fails with
///    [`ExecutionError::UnableToTransition`].
/// 2. **Descend** from that common ancestor, emitting an `Enter` for the
///    first declared child containing the target at each level, until the
///    target itself is reached.
///
/// The final node must be a leaf; a composite target fails with
/// [`ExecutionError::InvalidTransitionPath`]. A transition to the state the
/// machine is already in yields an empty plan.
///
/// # Example
///
/// ```rust
/// use canopy::builder::StateTreeBuilder;
/// use canopy::machine::{plan_transition, Action};
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
/// let plan = plan_transition(&tree, a1, "A2").unwrap();
/// assert_eq!(
///     plan,
///     vec![
///         Action::Close { state: "A1".into() },
///         Action::Enter { parent: "A".into(), child: "A2".into() },
///     ]
/// );
/// ```
pub fn plan_transition(
    tree: &StateTree,
    current: StateId,
    target: &str,
) -> Result<Vec<Action>, ExecutionError> {
    let mut actions = Vec::new();
    let mut node = current;

    // Ascend: close everything between the current state and the first
    // ancestor that equals the target or holds it in its subtree.
    while tree.name(node) != target && !tree.contains(node, target) {
        actions.push(Action::Close {
            state: tree.name(node).to_string(),
        });
        node = match tree.parent_of(node) {
            Some(parent) => parent,
            None => {
                return Err(ExecutionError::UnableToTransition {
                    target: target.to_string(),
                })
            }
        };
    }

    // Descend: enter the first declared child containing the target at
    // each level until the target itself is reached.
    while tree.name(node) != target {
        let child = tree
            .children_of(node)
            .iter()
            .copied()
            .find(|&child| tree.contains(child, target))
            .ok_or_else(|| ExecutionError::InvalidTransitionPath {
                target: target.to_string(),
            })?;
        actions.push(Action::Enter {
            parent: tree.name(node).to_string(),
            child: tree.name(child).to_string(),
        });
        node = child;
    }

    if !tree.is_leaf(node) {
        return Err(ExecutionError::InvalidTransitionPath {
            target: target.to_string(),
        });
    }

    Ok(actions)
}
