//! Committed annotations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EditorError;
use crate::geometry::{
    OrientedRect, Point, Rect, bounding_rect, point_in_polygon, polygon_area,
};
use crate::model::label::{HexColor, Label};

/// The kind tag of a [`Shape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rect,
    Obb,
    Polygon,
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Rect => "rect",
            ShapeKind::Obb => "obb",
            ShapeKind::Polygon => "polygon",
        }
    }

    pub fn all() -> &'static [ShapeKind] {
        &[ShapeKind::Rect, ShapeKind::Obb, ShapeKind::Polygon]
    }

    /// Shapes of this kind accumulate over several clicks and need an
    /// explicit closing action.
    pub fn is_continuous(&self) -> bool {
        !matches!(self, ShapeKind::Rect)
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Geometry of an annotation, in image coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    /// Axis-aligned box, `(x, y)` top-left.
    Rect(Rect),
    /// Oriented box, `(x, y)` centre.
    Obb(OrientedRect),
    /// Closed ring of vertices.
    Polygon { points: Vec<Point> },
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rect(_) => ShapeKind::Rect,
            Shape::Obb(_) => ShapeKind::Obb,
            Shape::Polygon { .. } => ShapeKind::Polygon,
        }
    }

    /// Area used to rank overlapping shapes during hit resolution.
    ///
    /// Boxes use `w × h`; polygons use their bounding box.
    pub fn selection_area(&self) -> f64 {
        match self {
            Shape::Rect(r) => r.area(),
            Shape::Obb(o) => o.area(),
            Shape::Polygon { points } => bounding_rect(points).map_or(0.0, |b| b.area()),
        }
    }

    /// Axis-aligned bounds.
    pub fn bounding_rect(&self) -> Option<Rect> {
        match self {
            Shape::Rect(r) => Some(*r),
            Shape::Obb(o) => Some(o.bounding_rect()),
            Shape::Polygon { points } => bounding_rect(points),
        }
    }

    /// Whether `p` lies inside the shape body.
    pub fn contains(&self, p: Point) -> bool {
        match self {
            Shape::Rect(r) => r.contains(p),
            Shape::Obb(o) => o.contains(p),
            Shape::Polygon { points } => point_in_polygon(p, points),
        }
    }

    /// Check the structural invariants every committed shape must hold.
    pub fn validate(&self) -> Result<(), EditorError> {
        match self {
            Shape::Rect(r) if !r.is_valid() => Err(EditorError::invalid_shape(format!(
                "rect needs positive size, got {}x{}",
                r.w, r.h
            ))),
            Shape::Obb(o) if o.w < 1.0 || o.h < 1.0 => Err(EditorError::invalid_shape(format!(
                "oriented box sides must be at least 1, got {}x{}",
                o.w, o.h
            ))),
            Shape::Polygon { points } if points.len() < 3 => Err(EditorError::invalid_shape(
                format!("polygon needs 3 vertices, got {}", points.len()),
            )),
            Shape::Polygon { points } if polygon_area(points) <= 0.0 => {
                Err(EditorError::invalid_shape("polygon has no area"))
            }
            _ => Ok(()),
        }
    }

    pub fn as_rect(&self) -> Option<&Rect> {
        match self {
            Shape::Rect(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_obb(&self) -> Option<&OrientedRect> {
        match self {
            Shape::Obb(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_polygon(&self) -> Option<&[Point]> {
        match self {
            Shape::Polygon { points } => Some(points),
            _ => None,
        }
    }
}

/// A committed, labelled shape.
///
/// The color is copied from the label when the annotation is created and
/// stored independently from then on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub label: String,
    pub color: HexColor,
    pub shape: Shape,
}

impl Annotation {
    /// New annotation inheriting name and color from `label`.
    pub fn new(shape: Shape, label: &Label) -> Self {
        Self {
            label: label.name.clone(),
            color: label.color.clone(),
            shape,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    /// Adopt another label's name and color.
    pub fn relabel(&mut self, label: &Label) {
        self.label = label.name.clone();
        self.color = label.color.clone();
    }
}
