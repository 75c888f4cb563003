//! # Drag-and-Drop Reordering
//!
//! Turns pointer-drag gestures over a list into a new order of ids. The session
//! knows nothing about pages or storage; it hands the complete resulting order
//! back to the caller, which passes it to
//! [`NoteStore::reorder_blocks`](crate::notes::NoteStore::reorder_blocks)
//! (or uses [`NoteStore::drop_block`](crate::notes::NoteStore::drop_block)).
//!
//! ## States
//!
//! ```text
//!            start(id, i)
//!   Idle ───────────────────▶ Dragging { source, target? }
//!    ▲                              │  enter / over / leave update target
//!    └──────── end() / drop_at() ───┘
//! ```
//!
//! - `enter(i)` marks `i` as the insertion target and deepens the enter count.
//! - `over(i)` marks `i` as the target unless it is the source itself.
//! - `leave()` undoes one `enter`; when the count reaches zero the target clears.
//! - `drop_at(t, items)` moves the source to `t` and returns the full order.
//! - `end()` abandons the drag and leaves the order as it was.
//!
//! Dropping onto the source's own slot still yields an order (identical to the
//! input). A session covers a single list; there is no cross-list drag.

use log::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragState<Id> {
    Idle,
    Dragging {
        source_id: Id,
        source_index: usize,
        target_index: Option<usize>,
        enter_depth: usize,
    },
}

/// Which edge of an item shows the insertion marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropEdge {
    Above,
    Below,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSession<Id> {
    state: DragState<Id>,
}

impl<Id: Copy + PartialEq + std::fmt::Debug> Default for DragSession<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: Copy + PartialEq + std::fmt::Debug> DragSession<Id> {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
        }
    }

    pub fn state(&self) -> &DragState<Id> {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DragState::Idle)
    }

    pub fn source(&self) -> Option<(Id, usize)> {
        match self.state {
            DragState::Dragging {
                source_id,
                source_index,
                ..
            } => Some((source_id, source_index)),
            DragState::Idle => None,
        }
    }

    pub fn target_index(&self) -> Option<usize> {
        match self.state {
            DragState::Dragging { target_index, .. } => target_index,
            DragState::Idle => None,
        }
    }

    /// Pointer pressed on the item at `index`. Restarts any drag in progress.
    pub fn start(&mut self, source_id: Id, source_index: usize) {
        debug!("drag start {:?} at {}", source_id, source_index);
        self.state = DragState::Dragging {
            source_id,
            source_index,
            target_index: None,
            enter_depth: 0,
        };
    }

    pub fn enter(&mut self, index: usize) {
        if let DragState::Dragging {
            target_index,
            enter_depth,
            ..
        } = &mut self.state
        {
            *enter_depth += 1;
            *target_index = Some(index);
        }
    }

    pub fn over(&mut self, index: usize) {
        if let DragState::Dragging {
            source_index,
            target_index,
            ..
        } = &mut self.state
        {
            if *source_index != index {
                *target_index = Some(index);
            }
        }
    }

    pub fn leave(&mut self) {
        if let DragState::Dragging {
            target_index,
            enter_depth,
            ..
        } = &mut self.state
        {
            *enter_depth = enter_depth.saturating_sub(1);
            if *enter_depth == 0 {
                *target_index = None;
            }
        }
    }

    /// Drag finished without a drop.
    pub fn end(&mut self) {
        self.state = DragState::Idle;
    }

    /// Drops the dragged item at `target_index` of `items`.
    ///
    /// Returns the whole reordered sequence, or `None` if no drag is active.
    /// The session is idle afterwards either way.
    pub fn drop_at(&mut self, target_index: usize, items: &[Id]) -> Option<Vec<Id>> {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        let DragState::Dragging {
            source_id,
            source_index,
            ..
        } = state
        else {
            return None;
        };

        // The list may have changed under the drag; trust the id over the index.
        let from = if items.get(source_index) == Some(&source_id) {
            source_index
        } else {
            match items.iter().position(|id| *id == source_id) {
                Some(found) => found,
                None => {
                    warn!("drop: dragged item {:?} is no longer in the list", source_id);
                    return Some(items.to_vec());
                }
            }
        };
        debug!("drop {:?} from {} to {}", source_id, from, target_index);
        Some(move_item(items, from, target_index))
    }

    /// Marker to draw on the item at `index` while it is the drop target.
    pub fn drop_indicator(&self, index: usize) -> Option<DropEdge> {
        match self.state {
            DragState::Dragging {
                source_index,
                target_index: Some(target),
                ..
            } if target == index && source_index != index => {
                if source_index < index {
                    Some(DropEdge::Below)
                } else {
                    Some(DropEdge::Above)
                }
            }
            _ => None,
        }
    }
}

/// Removes the element at `from` and reinserts it at `to`.
///
/// `to` is clamped to the end of the shortened list. An out-of-range `from`
/// returns the list unchanged.
pub fn move_item<T: Clone>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut moved = items.to_vec();
    if from >= moved.len() {
        return moved;
    }
    let item = moved.remove(from);
    let to = to.min(moved.len());
    moved.insert(to, item);
    moved
}
