//! Board DragDrop Utilities
//!
//! Simple drag-and-drop gesture tracking for board columns using pointer events.
//! Uses movement threshold to distinguish click from drag.

/// Movement threshold in pixels to start dragging
pub const DRAG_THRESHOLD_PX: i32 = 5;

/// Primary pointer button
const PRIMARY_BUTTON: i16 = 0;

/// Drop target types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DropTarget<C> {
    /// Hovering another card
    Item(u32),
    /// Hovering the empty area of a column
    Column(C),
}

/// Gesture events emitted by the tracker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragEvent<C> {
    /// Pointer moved past the threshold while pressed on a card
    Start { id: u32 },
    /// The dragged card entered a new target
    Over { id: u32, target: DropTarget<C> },
    /// Pointer released. `target` is `None` when released outside any target.
    End { id: u32, target: Option<DropTarget<C>> },
}

/// Pending press that has not moved far enough to become a drag
#[derive(Clone, Copy, Debug, PartialEq)]
struct Pending {
    id: u32,
    start_x: i32,
    start_y: i32,
}

/// DnD state for a single pointer
#[derive(Clone, Debug)]
pub struct DragTracker<C> {
    threshold: i32,
    pending: Option<Pending>,
    dragging_id: Option<u32>,
    drop_target: Option<DropTarget<C>>,
}

impl<C> Default for DragTracker<C> {
    fn default() -> Self {
        Self::with_threshold(DRAG_THRESHOLD_PX)
    }
}

impl<C: Copy + PartialEq> DragTracker<C> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C> DragTracker<C> {
    pub fn with_threshold(threshold: i32) -> Self {
        Self {
            threshold: threshold.max(0),
            pending: None,
            dragging_id: None,
            drop_target: None,
        }
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    /// Card currently being dragged
    pub fn dragging_id(&self) -> Option<u32> {
        self.dragging_id
    }

    /// Card pressed but not yet dragged
    pub fn pending_id(&self) -> Option<u32> {
        self.pending.map(|p| p.id)
    }

    pub fn drop_target(&self) -> Option<&DropTarget<C>> {
        self.drop_target.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging_id.is_some()
    }
}

impl<C: Copy + PartialEq> DragTracker<C> {
    /// Record a pending drag with its start position.
    /// Only the primary button arms a drag.
    pub fn pointer_down(&mut self, id: u32, x: i32, y: i32, button: i16) {
        if button != PRIMARY_BUTTON || self.dragging_id.is_some() {
            return;
        }
        self.pending = Some(Pending { id, start_x: x, start_y: y });
    }

    /// Starts the drag once the pointer has moved past the threshold
    pub fn pointer_move(&mut self, x: i32, y: i32) -> Option<DragEvent<C>> {
        if self.dragging_id.is_some() {
            return None;
        }
        let pending = self.pending?;
        let dx = (x - pending.start_x).abs();
        let dy = (y - pending.start_y).abs();
        if dx > self.threshold || dy > self.threshold {
            self.dragging_id = Some(pending.id);
            return Some(DragEvent::Start { id: pending.id });
        }
        None
    }

    /// Pointer entered a card. Entering the dragged card itself emits nothing.
    pub fn enter_item(&mut self, item_id: u32) -> Option<DragEvent<C>> {
        let dragging = self.dragging_id?;
        if dragging == item_id {
            return None;
        }
        self.set_target(dragging, DropTarget::Item(item_id))
    }

    /// Pointer entered the empty area of a column
    pub fn enter_column(&mut self, column: C) -> Option<DragEvent<C>> {
        let dragging = self.dragging_id?;
        self.set_target(dragging, DropTarget::Column(column))
    }

    /// Pointer left the current target
    pub fn leave(&mut self) {
        if self.dragging_id.is_some() {
            self.drop_target = None;
        }
    }

    /// Ends the gesture. Returns `None` when the press never became a drag
    /// (a click).
    pub fn pointer_up(&mut self) -> Option<DragEvent<C>> {
        self.pending = None;
        let id = self.dragging_id.take()?;
        let target = self.drop_target.take();
        Some(DragEvent::End { id, target })
    }

    /// Abandons the gesture without a target (e.g. escape key)
    pub fn cancel(&mut self) -> Option<DragEvent<C>> {
        self.pending = None;
        self.drop_target = None;
        let id = self.dragging_id.take()?;
        Some(DragEvent::End { id, target: None })
    }

    fn set_target(&mut self, dragging: u32, target: DropTarget<C>) -> Option<DragEvent<C>> {
        if self.drop_target == Some(target) {
            return None;
        }
        self.drop_target = Some(target);
        Some(DragEvent::Over { id: dragging, target })
    }
}
