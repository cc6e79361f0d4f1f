//! Drag Reconciler
//!
//! Turns one drag gesture into speculative board mutations. Hovering only
//! touches the local board; nothing is sent until the gesture ends and the
//! finished gesture is handed to the commit coordinator.

use board_dragdrop::{DragEvent, DropTarget};

use crate::handle::BoardHandle;
use crate::models::{Bucket, ItemId};
use crate::store::Board;

/// What the dragged card is over: another card or a column's empty area
pub type HoverTarget = DropTarget<Bucket>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEnd {
    Dropped,
    /// Released outside any target. Hover effects are kept and committed.
    Cancelled,
}

/// A gesture that reached its end, ready to be committed
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedGesture {
    pub item_id: ItemId,
    pub origin_bucket: Bucket,
    /// The origin bucket's sequence when the gesture started
    pub origin_sequence: Vec<ItemId>,
    pub end: GestureEnd,
}

#[derive(Debug, Clone)]
struct ActiveGesture {
    item_id: ItemId,
    origin_bucket: Bucket,
    origin_sequence: Vec<ItemId>,
    /// Last target applied, repeats of it are ignored
    last_target: Option<HoverTarget>,
}

pub struct DragReconciler {
    board: BoardHandle,
    active: Option<ActiveGesture>,
}

impl DragReconciler {
    pub fn new(board: BoardHandle) -> Self {
        Self { board, active: None }
    }

    pub fn active_item(&self) -> Option<ItemId> {
        self.active.as_ref().map(|g| g.item_id)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Idle -> Active. Ignored while another gesture is active or if the item is unknown.
    pub fn start(&mut self, id: ItemId) -> bool {
        if let Some(active) = &self.active {
            log::debug!("[DND] start {} ignored, {} is being dragged", id, active.item_id);
            return false;
        }
        let origin = self
            .board
            .with(|b| b.bucket_of(id).map(|bucket| (bucket, b.bucket_sequence(bucket))));
        let Some((origin_bucket, origin_sequence)) = origin else {
            log::debug!("[DND] start ignored, unknown item {}", id);
            return false;
        };
        log::debug!("[DND] start: dragged={} bucket={}", id, origin_bucket);
        self.active = Some(ActiveGesture {
            item_id: id,
            origin_bucket,
            origin_sequence,
            last_target: None,
        });
        true
    }

    /// Recompute the speculative placement. Returns true if the board changed.
    pub fn hover(&mut self, target: HoverTarget) -> bool {
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if active.last_target == Some(target) {
            return false;
        }
        active.last_target = Some(target);
        let dragged = active.item_id;
        if !self.board.with(|b| is_actionable(b, dragged, target)) {
            return false;
        }
        let applied = self.board.update(|b| apply_hover(b, dragged, target));
        if applied {
            log::debug!("[DND] over: dragged={} target={:?}", dragged, target);
        }
        applied
    }

    /// Active -> Idle
    pub fn finish(&mut self, end: GestureEnd) -> Option<FinishedGesture> {
        let gesture = self.active.take()?;
        log::debug!("[DND] end: dragged={} {:?}", gesture.item_id, end);
        Some(FinishedGesture {
            item_id: gesture.item_id,
            origin_bucket: gesture.origin_bucket,
            origin_sequence: gesture.origin_sequence,
            end,
        })
    }

    /// Drop the current gesture without producing anything to commit
    pub fn reset(&mut self) {
        self.active = None;
    }

    /// Feed an event from the gesture recognizer
    pub fn handle(&mut self, event: DragEvent<Bucket>) -> Option<FinishedGesture> {
        match event {
            DragEvent::Start { id } => {
                self.start(id);
                None
            }
            DragEvent::Over { id, target } => {
                if self.active_item() == Some(id) {
                    self.hover(target);
                }
                None
            }
            DragEvent::End { id, target } => {
                if self.active_item() != Some(id) {
                    return None;
                }
                match target {
                    Some(target) => {
                        self.hover(target);
                        self.finish(GestureEnd::Dropped)
                    }
                    None => self.finish(GestureEnd::Cancelled),
                }
            }
        }
    }
}

/// Whether `target` can move `dragged` at all, checked before taking a write borrow
fn is_actionable(board: &Board, dragged: ItemId, target: HoverTarget) -> bool {
    let Some(current) = board.bucket_of(dragged) else {
        return false;
    };
    match target {
        DropTarget::Column(bucket) => bucket != current,
        DropTarget::Item(over) => over != dragged && board.bucket_of(over).is_some(),
    }
}

/// Place `dragged` according to the hover target.
///
/// Same bucket and another card: take that card's index. Other bucket: splice
/// in before the hovered card, or last when hovering the column itself.
pub fn apply_hover(board: &mut Board, dragged: ItemId, target: HoverTarget) -> bool {
    let Some(current) = board.bucket_of(dragged) else {
        return false;
    };
    match target {
        DropTarget::Column(bucket) => {
            if bucket == current {
                return false;
            }
            board.move_to_bucket(dragged, bucket, None)
        }
        DropTarget::Item(over) => {
            if over == dragged {
                return false;
            }
            let Some(target_bucket) = board.bucket_of(over) else {
                return false;
            };
            if target_bucket == current {
                board.reorder_within_bucket(dragged, over)
            } else {
                board.move_to_bucket(dragged, target_bucket, Some(over))
            }
        }
    }
}
