//! Per-shape drawing and editing state machines.
//!
//! Each shape kind has one editor implementing [`ShapeEditor`]:
//! - [`RectEditor`]: press, drag, release
//! - [`PolygonEditor`]: one click per vertex, explicit close
//! - [`ObbEditor`]: edge, then width, over three clicks
//!
//! Editors own only their in-progress drawing state. Committed shapes live
//! in the annotation store and are passed in for hit-testing and dragging.

pub mod obb;
pub mod polygon;
pub mod rect;
pub mod render;

use std::fmt;

use crate::config::EditorConfig;
use crate::error::{EditorError, Rejection};
use crate::events::Advisory;
use crate::geometry::{Handle, ImageSize, Point};
use crate::model::{Annotation, Label, Shape, ShapeKind};

pub use obb::ObbEditor;
pub use polygon::{PolygonEditor, PolygonFix};
pub use rect::RectEditor;
pub use render::{Paint, Primitive, RenderState, Stroke, TextAlign};

// ============================================================================
// Hit testing
// ============================================================================

/// What part of a shape the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitType {
    /// Shape body; dragging translates
    Move,
    /// A resize handle
    Resize(Handle),
    /// A polygon vertex
    Vertex(usize),
    /// The rotate handle at an oriented box's centre
    Rotate,
}

impl HitType {
    /// Suggested pointer cursor.
    pub fn cursor(&self) -> Cursor {
        match self {
            HitType::Move => Cursor::Move,
            HitType::Resize(Handle::TopLeft | Handle::BottomRight) => Cursor::NwseResize,
            HitType::Resize(Handle::TopRight | Handle::BottomLeft) => Cursor::NeswResize,
            HitType::Resize(Handle::Top | Handle::Bottom) => Cursor::NsResize,
            HitType::Resize(Handle::Left | Handle::Right) => Cursor::EwResize,
            HitType::Vertex(_) => Cursor::Pointer,
            HitType::Rotate => Cursor::Alias,
        }
    }

    /// Whether this hit is a handle rather than the body.
    pub fn is_handle(&self) -> bool {
        !matches!(self, HitType::Move)
    }
}

impl fmt::Display for HitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HitType::Move => f.write_str("move"),
            HitType::Resize(handle) => f.write_str(handle.id()),
            HitType::Vertex(i) => write!(f, "vertex-{i}"),
            HitType::Rotate => f.write_str("rotate-center"),
        }
    }
}

/// Pointer cursor hints for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Crosshair,
    Move,
    Grabbing,
    NwseResize,
    NeswResize,
    NsResize,
    EwResize,
    Pointer,
    Alias,
}

// ============================================================================
// Drawing and dragging
// ============================================================================

/// Result of a drawing step.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    /// Nothing to commit yet (or nothing happened)
    Pending,
    /// A finished shape, ready to append to the store
    Committed {
        annotation: Annotation,
        /// Set when the geometry had to be corrected
        advisory: Option<Advisory>,
    },
    /// The gesture finished but produced nothing
    Rejected(Rejection),
}

impl DrawOutcome {
    pub(crate) fn committed(annotation: Annotation) -> Self {
        Self::Committed {
            annotation,
            advisory: None,
        }
    }
}

/// An edit drag in progress on a committed annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct DragContext {
    /// Index of the dragged annotation
    pub index: usize,
    pub hit: HitType,
    /// Pointer position when the drag started
    pub origin: Point,
    /// Geometry when the drag started; updates are computed from it
    pub original: Shape,
}

impl DragContext {
    pub fn new(index: usize, hit: HitType, origin: Point, original: Shape) -> Self {
        Self {
            index,
            hit,
            origin,
            original,
        }
    }

    /// Pointer displacement since the drag started.
    pub fn delta(&self, at: Point) -> Point {
        at - self.origin
    }
}

/// Capabilities every shape editor provides.
pub trait ShapeEditor {
    /// The shape kind this editor creates and edits.
    fn kind(&self) -> ShapeKind;

    /// Shapes accumulate over several clicks and need an explicit close.
    fn is_continuous(&self) -> bool {
        self.kind().is_continuous()
    }

    /// A shape is under construction.
    fn is_drawing(&self) -> bool;

    /// Primary button pressed while drawing.
    fn start_drawing(&mut self, at: Point, label: &Label, image: ImageSize) -> DrawOutcome;

    /// Pointer moved while drawing. Pure state update.
    fn update_drawing(&mut self, at: Point);

    /// Primary button released while drawing.
    fn release(&mut self, at: Point, image: ImageSize) -> DrawOutcome;

    /// Explicit closing action (Enter).
    fn finish(&mut self, _image: ImageSize) -> DrawOutcome {
        DrawOutcome::Pending
    }

    /// Secondary button pressed while drawing.
    fn secondary_action(&mut self, _image: ImageSize) -> DrawOutcome {
        self.cancel();
        DrawOutcome::Pending
    }

    /// Drop any in-progress shape.
    fn cancel(&mut self);

    /// Which part of `shape` is at `at`. With `handles_only`, the body is
    /// ignored.
    fn hit_test(
        &self,
        shape: &Shape,
        at: Point,
        zoom: f64,
        handles_only: bool,
    ) -> Result<Option<HitType>, EditorError>;

    /// Apply a drag to `shape`, computed from the drag's original geometry.
    fn update_drag(
        &self,
        drag: &DragContext,
        at: Point,
        image: ImageSize,
        shape: &mut Shape,
    ) -> Result<(), EditorError>;

    /// Primitives for a committed annotation of this kind.
    fn render(&self, annotation: &Annotation, state: &RenderState, zoom: f64) -> Vec<Primitive>;

    /// Primitives for the shape under construction.
    fn preview(&self, zoom: f64) -> Vec<Primitive>;
}

/// Check that `shape` is of the kind an editor handles.
pub(crate) fn expect_kind(expected: ShapeKind, shape: &Shape) -> Result<(), EditorError> {
    if shape.kind() == expected {
        Ok(())
    } else {
        Err(EditorError::shape_mismatch(expected, shape.kind()))
    }
}

// ============================================================================
// Registry
// ============================================================================

/// One editor per shape kind.
#[derive(Debug, Clone)]
pub struct EditorRegistry {
    rect: RectEditor,
    polygon: PolygonEditor,
    obb: ObbEditor,
}

impl EditorRegistry {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            rect: RectEditor::new(config),
            polygon: PolygonEditor::new(config),
            obb: ObbEditor::new(config),
        }
    }

    pub fn get(&self, kind: ShapeKind) -> &dyn ShapeEditor {
        match kind {
            ShapeKind::Rect => &self.rect,
            ShapeKind::Polygon => &self.polygon,
            ShapeKind::Obb => &self.obb,
        }
    }

    pub fn get_mut(&mut self, kind: ShapeKind) -> &mut dyn ShapeEditor {
        match kind {
            ShapeKind::Rect => &mut self.rect,
            ShapeKind::Polygon => &mut self.polygon,
            ShapeKind::Obb => &mut self.obb,
        }
    }

    pub fn polygon(&self) -> &PolygonEditor {
        &self.polygon
    }

    pub fn obb(&self) -> &ObbEditor {
        &self.obb
    }

    /// Cancel drawing on every editor.
    pub fn cancel_all(&mut self) {
        self.rect.cancel();
        self.polygon.cancel();
        self.obb.cancel();
    }
}

impl Default for EditorRegistry {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}
