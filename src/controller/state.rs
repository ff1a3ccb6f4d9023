//! Transient gesture state.
//!
//! Everything a gesture needs between pointer events lives in one value,
//! so it can be inspected, saved and restored independently of the
//! controller.

use crate::editors::{Cursor, DragContext, HitType};
use crate::geometry::Point;

/// Annotation under the pointer and the part of it that was hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hover {
    pub index: usize,
    pub hit: HitType,
}

/// Screen-space panning with the secondary button.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanState {
    pub is_panning: bool,
    /// Last pointer position for calculating delta
    pub last_pos: Option<Point>,
}

impl PanState {
    pub fn start_drag(&mut self, pos: Point) {
        self.is_panning = true;
        self.last_pos = Some(pos);
    }

    /// Update drag position and return the delta.
    pub fn update_drag(&mut self, pos: Point) -> Option<Point> {
        if !self.is_panning {
            return None;
        }
        let last = self.last_pos.replace(pos)?;
        Some(pos - last)
    }

    pub fn end_drag(&mut self) {
        self.is_panning = false;
        self.last_pos = None;
    }
}

/// Selection, hover, drag and pointer bookkeeping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionState {
    pub selected: Option<usize>,
    pub hovered: Option<Hover>,
    /// Edit drag in progress
    pub drag: Option<DragContext>,
    /// Most recently created or clicked annotation; relabel target when
    /// nothing is selected
    pub last_created: Option<usize>,
    pub pan: PanState,
    /// Pointer position in image space, for the crosshair
    pub crosshair: Option<Point>,
    /// Last pointer position in screen space
    pub pointer: Option<Point>,
    pub cursor: Cursor,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget selection, hover and any drag.
    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.hovered = None;
        self.drag = None;
        self.last_created = None;
    }

    pub fn is_dragging(&self, index: usize) -> bool {
        self.drag.as_ref().is_some_and(|d| d.index == index)
    }

    pub fn hover_of(&self, index: usize) -> Option<Hover> {
        self.hovered.filter(|h| h.index == index)
    }

    /// Fix up indices after annotation `removed` was deleted.
    pub fn forget_index(&mut self, removed: usize) {
        let shift = |i: Option<usize>| match i {
            Some(i) if i == removed => None,
            Some(i) if i > removed => Some(i - 1),
            other => other,
        };
        self.selected = shift(self.selected);
        self.last_created = shift(self.last_created);
        self.hovered = None;
        self.drag = None;
    }
}
