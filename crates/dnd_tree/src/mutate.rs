use std::sync::Arc;

use crate::error::{IllegalMoveReason, MoveError};
use crate::position::DropPosition;
use crate::tree::{Forest, Node, NodeKey};

/// A move that passed every check, in post-removal coordinates.
struct MovePlan<K> {
    source_parent: Vec<usize>,
    source_index: usize,
    dest_parent: Vec<usize>,
    dest_index: usize,
    new_pid: Option<K>,
}

/// Move `dragged_id` next to, or into, `target_id` and return the new forest.
///
/// - [`DropPosition::Before`] / [`DropPosition::After`] make the dragged node the
///   sibling right before / after the target, under the target's parent.
/// - [`DropPosition::Child`] makes it the *first* child of the target.
///
/// The dragged subtree travels unchanged. `forest` is left as it was; the result
/// shares every subtree off the paths to the source and destination.
pub fn move_node<K: NodeKey, D: Clone>(
    forest: &Forest<K, D>,
    dragged_id: &K,
    target_id: &K,
    position: DropPosition,
) -> Result<Forest<K, D>, MoveError<K>> {
    let plan = plan_move(forest, dragged_id, target_id, position)?;

    let mut roots = forest.roots().to_vec();
    let mut dragged = collection_mut(&mut roots, &plan.source_parent).remove(plan.source_index);
    Arc::make_mut(&mut dragged).pid = plan.new_pid;
    collection_mut(&mut roots, &plan.dest_parent).insert(plan.dest_index, dragged);

    Ok(Forest::from_roots(roots))
}

/// Run every check [`move_node`] runs without building a new forest.
pub fn check_move<K: NodeKey, D: Clone>(
    forest: &Forest<K, D>,
    dragged_id: &K,
    target_id: &K,
    position: DropPosition,
) -> Result<(), MoveError<K>> {
    plan_move(forest, dragged_id, target_id, position).map(|_| ())
}

fn plan_move<K: NodeKey, D: Clone>(
    forest: &Forest<K, D>,
    dragged_id: &K,
    target_id: &K,
    position: DropPosition,
) -> Result<MovePlan<K>, MoveError<K>> {
    let illegal = |reason| MoveError::IllegalMove {
        dragged: dragged_id.clone(),
        target: target_id.clone(),
        reason,
    };

    if dragged_id == target_id {
        return Err(illegal(IllegalMoveReason::SelfDrop));
    }
    if !position.is_known() {
        return Err(MoveError::AmbiguousGeometry);
    }

    let (_, dragged_path) = forest
        .locate(dragged_id)?
        .ok_or_else(|| MoveError::NodeNotFound(dragged_id.clone()))?;
    let (target, mut target_path) = forest
        .locate(target_id)?
        .ok_or_else(|| MoveError::NodeNotFound(target_id.clone()))?;

    // The target sits in the dragged subtree exactly when the dragged path prefixes it.
    if target_path.starts_with(&dragged_path) {
        return Err(illegal(IllegalMoveReason::IntoDescendant));
    }

    let Some((&source_index, source_parent)) = dragged_path.split_last() else {
        return Err(MoveError::NodeNotFound(dragged_id.clone()));
    };

    // Taking the dragged node out shifts its later siblings up by one.
    let level = source_parent.len();
    if target_path.len() > level
        && target_path[..level] == *source_parent
        && target_path[level] > source_index
    {
        target_path[level] -= 1;
    }

    let (dest_parent, dest_index, new_pid) = match position {
        DropPosition::Child => (target_path, 0, Some(target_id.clone())),
        DropPosition::Before | DropPosition::After => {
            let Some(target_index) = target_path.pop() else {
                return Err(MoveError::NodeNotFound(target_id.clone()));
            };
            let dest_index = if position == DropPosition::After {
                target_index + 1
            } else {
                target_index
            };
            (target_path, dest_index, target.pid.clone())
        }
        DropPosition::Unknown => return Err(MoveError::AmbiguousGeometry),
    };

    Ok(MovePlan {
        source_parent: source_parent.to_vec(),
        source_index,
        dest_parent,
        dest_index,
        new_pid,
    })
}

/// The child list at `parent_path` (the roots for an empty path), copying every
/// shared node on the way down.
fn collection_mut<'a, K: Clone, D: Clone>(
    roots: &'a mut Vec<Arc<Node<K, D>>>,
    parent_path: &[usize],
) -> &'a mut Vec<Arc<Node<K, D>>> {
    let mut items = roots;
    for &ix in parent_path {
        items = &mut Arc::make_mut(&mut items[ix]).children;
    }
    items
}
