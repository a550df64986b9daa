use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::ancestry::can_drop;
use crate::error::MoveError;
use crate::mutate::{check_move, move_node};
use crate::position::{DropPosition, DropRect, DropZoneConfig};
use crate::tree::{Forest, NodeKey, Revision};

/// A drop of `dragged` on `target`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveRequest<K> {
    pub dragged: K,
    pub target: K,
    pub position: DropPosition,
}

impl<K> MoveRequest<K> {
    pub fn new(dragged: K, target: K, position: DropPosition) -> Self {
        Self {
            dragged,
            target,
            position,
        }
    }
}

/// What the row under the pointer should show while hovered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HoverFeedback {
    pub position: DropPosition,
    pub can_drop: bool,
}

impl HoverFeedback {
    /// The position to highlight, `None` when nothing may be dropped here.
    pub fn drop_target(&self) -> Option<DropPosition> {
        (self.can_drop && self.position.is_known()).then_some(self.position)
    }
}

/// Per-row drag state handed to the row renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RowState {
    pub dragging: bool,
    pub drop_target: Option<DropPosition>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelReason {
    /// A drop arrived with no drag in progress.
    NotDragging,
    /// The forest was replaced while the drag was in flight.
    StaleTree,
}

/// Result of releasing the pointer over a row.
#[derive(Debug)]
pub enum DropOutcome<K, D = ()> {
    Moved {
        forest: Forest<K, D>,
        request: MoveRequest<K>,
    },
    Rejected {
        request: MoveRequest<K>,
        error: MoveError<K>,
    },
    /// The `on_moving` hook refused the move.
    Vetoed(MoveRequest<K>),
    Cancelled(CancelReason),
}

impl<K, D> DropOutcome<K, D> {
    pub fn is_moved(&self) -> bool {
        matches!(self, DropOutcome::Moved { .. })
    }

    /// The new forest, if the drop moved something.
    pub fn into_forest(self) -> Option<Forest<K, D>> {
        match self {
            DropOutcome::Moved { forest, .. } => Some(forest),
            _ => None,
        }
    }
}

type MovingHook<K> = Rc<dyn Fn(&MoveRequest<K>) -> bool>;
type MovedHook<K> = Rc<dyn Fn(&MoveRequest<K>)>;

struct ActiveDrag<K> {
    dragged_id: K,
    revision: Revision,
}

struct Hover<K> {
    target_id: K,
    feedback: HoverFeedback,
}

/// State of one drag gesture over a forest.
///
/// The session only remembers ids and the revision of the forest the drag
/// started on; every call takes the current forest. A forest with another
/// revision cancels the gesture.
pub struct DragSession<K> {
    config: DropZoneConfig,
    active: Option<ActiveDrag<K>>,
    hover: Option<Hover<K>>,
    on_moving: Option<MovingHook<K>>,
    on_moved: Option<MovedHook<K>>,
}

impl<K: NodeKey> Default for DragSession<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: NodeKey> DragSession<K> {
    pub fn new() -> Self {
        Self {
            config: DropZoneConfig::default(),
            active: None,
            hover: None,
            on_moving: None,
            on_moved: None,
        }
    }

    pub fn config(mut self, config: DropZoneConfig) -> Self {
        self.config = config;
        self
    }

    /// Ask before applying a move; returning `false` leaves the forest as it is.
    pub fn on_moving(mut self, hook: impl Fn(&MoveRequest<K>) -> bool + 'static) -> Self {
        self.on_moving = Some(Rc::new(hook));
        self
    }

    /// Called after a move was applied.
    pub fn on_moved(mut self, hook: impl Fn(&MoveRequest<K>) + 'static) -> Self {
        self.on_moved = Some(Rc::new(hook));
        self
    }

    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    pub fn dragged_id(&self) -> Option<&K> {
        self.active.as_ref().map(|active| &active.dragged_id)
    }

    /// Start dragging `dragged_id`. Replaces a gesture already in flight.
    pub fn begin<D: Clone>(
        &mut self,
        forest: &Forest<K, D>,
        dragged_id: K,
    ) -> Result<(), MoveError<K>> {
        if !forest.contains(&dragged_id) {
            return Err(MoveError::NodeNotFound(dragged_id));
        }
        if let Some(previous) = self.active.take() {
            trace!(dragged = ?previous.dragged_id, "replacing drag in flight");
        }
        trace!(dragged = ?dragged_id, revision = forest.revision().get(), "drag started");
        self.hover = None;
        self.active = Some(ActiveDrag {
            dragged_id,
            revision: forest.revision(),
        });
        Ok(())
    }

    /// Track the pointer over `target_id`.
    pub fn hover<D: Clone>(
        &mut self,
        forest: &Forest<K, D>,
        target_id: K,
        rect: Option<DropRect>,
        pointer_y: Option<f32>,
    ) -> HoverFeedback {
        if self.is_stale(forest) {
            debug!("tree changed during drag, cancelling");
            self.cancel();
        }
        let Some(active) = self.active.as_ref() else {
            return HoverFeedback::default();
        };

        let feedback = HoverFeedback {
            position: self.config.classify(rect, pointer_y),
            can_drop: can_drop(forest, &active.dragged_id, &target_id),
        };
        self.hover = Some(Hover {
            target_id,
            feedback,
        });
        feedback
    }

    /// The pointer left `target_id`.
    pub fn leave(&mut self, target_id: &K) {
        if self
            .hover
            .as_ref()
            .is_some_and(|hover| hover.target_id == *target_id)
        {
            self.hover = None;
        }
    }

    pub fn row_state(&self, id: &K) -> RowState {
        let dragging = self
            .active
            .as_ref()
            .is_some_and(|active| active.dragged_id == *id);
        let drop_target = self
            .hover
            .as_ref()
            .filter(|hover| hover.target_id == *id)
            .and_then(|hover| hover.feedback.drop_target());
        RowState {
            dragging,
            drop_target,
        }
    }

    /// Whether `forest` is not the forest the gesture started on.
    pub fn is_stale<D>(&self, forest: &Forest<K, D>) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.revision != forest.revision())
    }

    /// Release the pointer over `target_id`. Ends the gesture whatever the outcome.
    pub fn drop_on<D: Clone>(
        &mut self,
        forest: &Forest<K, D>,
        target_id: K,
        rect: Option<DropRect>,
        pointer_y: Option<f32>,
    ) -> DropOutcome<K, D> {
        self.hover = None;
        let Some(active) = self.active.take() else {
            return DropOutcome::Cancelled(CancelReason::NotDragging);
        };
        if active.revision != forest.revision() {
            debug!(dragged = ?active.dragged_id, "tree changed during drag, cancelling");
            return DropOutcome::Cancelled(CancelReason::StaleTree);
        }

        let position = self.config.classify(rect, pointer_y);
        let request = MoveRequest::new(active.dragged_id, target_id, position);
        self.apply(forest, request)
    }

    /// Release the pointer outside any row, or abort the drag. Returns the id
    /// that was being dragged.
    pub fn cancel(&mut self) -> Option<K> {
        self.hover = None;
        self.active.take().map(|active| active.dragged_id)
    }

    fn apply<D: Clone>(
        &self,
        forest: &Forest<K, D>,
        request: MoveRequest<K>,
    ) -> DropOutcome<K, D> {
        if let Err(error) = check_move(forest, &request.dragged, &request.target, request.position)
        {
            debug!(dragged = ?request.dragged, target = ?request.target, %error, "drop rejected");
            return DropOutcome::Rejected { request, error };
        }

        if let Some(on_moving) = self.on_moving.as_ref()
            && !on_moving(&request)
        {
            debug!(dragged = ?request.dragged, target = ?request.target, "drop vetoed");
            return DropOutcome::Vetoed(request);
        }

        match move_node(forest, &request.dragged, &request.target, request.position) {
            Ok(forest) => {
                trace!(
                    dragged = ?request.dragged,
                    target = ?request.target,
                    position = ?request.position,
                    "node moved"
                );
                if let Some(on_moved) = self.on_moved.as_ref() {
                    on_moved(&request);
                }
                DropOutcome::Moved { forest, request }
            }
            Err(error) => DropOutcome::Rejected { request, error },
        }
    }
}
