//! Render contract.
//!
//! Editors describe what to draw as a list of [`Primitive`]s in image
//! coordinates. Line widths and font sizes are already divided by the zoom
//! level, so a host only applies its pan/zoom transform and paints.

use serde::Serialize;

use crate::constants::render;
use crate::geometry::{OrientedRect, Point, Rect};
use crate::model::HexColor;

/// A color with opacity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paint {
    pub color: HexColor,
    pub alpha: f64,
}

impl Paint {
    pub fn new(color: HexColor, alpha: f64) -> Self {
        Self { color, alpha }
    }

    pub fn solid(color: HexColor) -> Self {
        Self::new(color, 1.0)
    }

    pub fn white() -> Self {
        Self::solid(render::WHITE.into())
    }

    pub fn black() -> Self {
        Self::solid(render::BLACK.into())
    }
}

/// Outline style.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub paint: Paint,
    /// Width in image pixels
    pub width: f64,
    /// Dash pattern as `[on, off]` in screen pixels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<[f64; 2]>,
}

impl Stroke {
    pub fn new(paint: Paint, width: f64) -> Self {
        Self {
            paint,
            width,
            dash: None,
        }
    }

    pub fn dashed(mut self, on: f64, off: f64) -> Self {
        self.dash = Some([on, off]);
        self
    }
}

/// Horizontal anchoring of a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
}

/// One drawable element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    Rect {
        rect: Rect,
        fill: Option<Paint>,
        stroke: Option<Stroke>,
    },
    OrientedRect {
        obb: OrientedRect,
        fill: Option<Paint>,
        stroke: Option<Stroke>,
    },
    /// Open polyline or closed ring
    Path {
        points: Vec<Point>,
        closed: bool,
        fill: Option<Paint>,
        stroke: Option<Stroke>,
    },
    Circle {
        center: Point,
        radius: f64,
        fill: Option<Paint>,
        stroke: Option<Stroke>,
    },
    /// Line with an open arrowhead at `to`; `head` of zero draws a plain line
    Arrow {
        from: Point,
        to: Point,
        head: f64,
        stroke: Stroke,
    },
    /// Bold text drawn with an outline halo for legibility
    Text {
        text: String,
        at: Point,
        size: f64,
        align: TextAlign,
        fill: Paint,
        halo: Option<Stroke>,
    },
}

/// Interaction state of an annotation while it is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderState {
    pub selected: bool,
    pub hovered: bool,
    pub dragging: bool,
    /// Handles are only drawn while editing
    pub edit_mode: bool,
    /// What the pointer is over, when hovered
    pub hovered_hit: Option<super::HitType>,
}

impl RenderState {
    /// Whether handles should be shown for this shape.
    pub fn shows_handles(&self) -> bool {
        self.edit_mode && (self.selected || self.hovered || self.dragging)
    }

    /// Outline width for committed shapes.
    pub fn stroke_width(&self, zoom: f64) -> f64 {
        let width = if self.selected || self.dragging {
            render::SELECTED_STROKE_WIDTH
        } else {
            render::STROKE_WIDTH
        };
        width / zoom
    }
}

/// Label caption with a white halo, scaled so it stays readable.
pub fn label_text(text: impl Into<String>, at: Point, align: TextAlign, zoom: f64) -> Primitive {
    Primitive::Text {
        text: text.into(),
        at,
        size: render::MIN_FONT_SIZE.max(render::FONT_SIZE_SCREEN / zoom),
        align,
        fill: Paint::black(),
        halo: Some(Stroke::new(Paint::white(), render::TEXT_HALO_WIDTH / zoom)),
    }
}

/// Filled square handle with a thin black outline.
pub fn handle_square(rect: Rect, fill: Paint, zoom: f64) -> Primitive {
    Primitive::Rect {
        rect,
        fill: Some(fill),
        stroke: Some(Stroke::new(Paint::black(), 1.0 / zoom)),
    }
}
