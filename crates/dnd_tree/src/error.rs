use thiserror::Error;

/// Why a move was refused even though both nodes exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum IllegalMoveReason {
    #[error("a node cannot be dropped onto itself")]
    SelfDrop,
    #[error("the target lies inside the dragged node's subtree")]
    IntoDescendant,
}

/// A forest that breaks one of its structural invariants.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum IntegrityError<K> {
    #[error("node {0:?} appears more than once")]
    DuplicateId(K),
    #[error("node {id:?} records parent {recorded:?} but sits under {actual:?}")]
    ParentMismatch {
        id: K,
        recorded: Option<K>,
        actual: Option<K>,
    },
}

/// Errors returned by [`move_node`](crate::move_node) and friends.
///
/// Every variant is recoverable: the caller still owns the forest it passed in.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MoveError<K> {
    #[error("drop position could not be determined")]
    AmbiguousGeometry,
    #[error("node {0:?} is not in the tree")]
    NodeNotFound(K),
    #[error("cannot move {dragged:?} relative to {target:?}: {reason}")]
    IllegalMove {
        dragged: K,
        target: K,
        reason: IllegalMoveReason,
    },
    #[error("{0}")]
    Integrity(IntegrityError<K>),
}

impl<K> MoveError<K> {
    /// Whether the rejection came from the ancestry rule (self drop or cycle).
    pub fn is_illegal_move(&self) -> bool {
        matches!(self, MoveError::IllegalMove { .. })
    }
}

impl<K> From<IntegrityError<K>> for MoveError<K> {
    fn from(err: IntegrityError<K>) -> Self {
        MoveError::Integrity(err)
    }
}

/// Errors from [`Forest::from_flat`](crate::Forest::from_flat).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BuildError<K> {
    #[error("record {0:?} appears more than once")]
    DuplicateId(K),
    #[error("record {0:?} is part of a parent cycle")]
    Cycle(K),
}
