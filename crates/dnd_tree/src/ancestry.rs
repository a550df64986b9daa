use std::collections::HashSet;

use crate::error::IntegrityError;
use crate::tree::{Forest, NodeKey, locate_in};

/// Whether `candidate_id` lies in the subtree under `ancestor_id`.
///
/// Only the ancestor's children are searched, so a node is never its own
/// descendant. Unknown ids are simply unrelated.
pub fn is_descendant<K: NodeKey, D: Clone>(
    forest: &Forest<K, D>,
    ancestor_id: &K,
    candidate_id: &K,
) -> bool {
    try_is_descendant(forest, ancestor_id, candidate_id).unwrap_or(false)
}

/// Like [`is_descendant`], but reports a repeated id met on the way instead of
/// answering `false`.
pub fn try_is_descendant<K: NodeKey, D: Clone>(
    forest: &Forest<K, D>,
    ancestor_id: &K,
    candidate_id: &K,
) -> Result<bool, IntegrityError<K>> {
    let Some((ancestor, _)) = forest.locate(ancestor_id)? else {
        return Ok(false);
    };
    let found = locate_in(
        ancestor.children(),
        candidate_id,
        &mut Vec::new(),
        &mut HashSet::new(),
    )?;
    Ok(found.is_some())
}

/// Whether `dragged_id` may be dropped on `target_id` at all.
///
/// False for a drop on itself, on one of its own descendants, or when either
/// node is missing.
pub fn can_drop<K: NodeKey, D: Clone>(
    forest: &Forest<K, D>,
    dragged_id: &K,
    target_id: &K,
) -> bool {
    if dragged_id == target_id {
        return false;
    }
    if !forest.contains(dragged_id) || !forest.contains(target_id) {
        return false;
    }
    !is_descendant(forest, dragged_id, target_id)
}
