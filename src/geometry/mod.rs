//! Geometry kernel.
//!
//! Pure functions over image-space coordinates:
//! - Primitive types ([`Point`], [`Rect`], [`OrientedRect`], [`ImageSize`])
//! - Clamping and containment tests
//! - Polygon validation and normalization ([`polygon`])
//! - Douglas-Peucker simplification ([`simplify`])
//! - Contour tracing on binary masks ([`contour`])
//! - Self-intersection repair by mask projection ([`repair`])
//! - Oriented box helpers and orientation-constrained fitting ([`obb`])

pub mod contour;
pub mod obb;
pub mod polygon;
pub mod repair;
pub mod simplify;

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::ops::{Add, Mul, Sub};

pub use obb::{OrientedRect, fit_obb_with_orientation, obb_corners, obb_handle_rects};
pub use polygon::{
    bounding_rect, force_clockwise, is_polygon_self_intersecting, orientation_sum,
    point_in_polygon, polygon_area,
};
pub use repair::{RepairLimits, repair_polygon_by_mask_projection, repair_polygon_with_limits};
pub use simplify::simplify_points;

// ============================================================================
// Core Types
// ============================================================================

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: Point) -> f64 {
        self.distance_sq(other).sqrt()
    }

    pub fn distance_sq(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// An axis-aligned rectangle with `(x, y)` at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Normalized rectangle spanning two opposite corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            w: (a.x - b.x).abs(),
            h: (a.y - b.y).abs(),
        }
    }

    /// Square of side `size` centred on `center`.
    pub fn centered(center: Point, size: f64) -> Self {
        let half = size / 2.0;
        Self::new(center.x - half, center.y - half, size, size)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        point_in_rect(p, self)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// True when both sides are strictly positive.
    pub fn is_valid(&self) -> bool {
        self.w > 0.0 && self.h > 0.0
    }
}

/// Pixel dimensions of the image being annotated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

impl ImageSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }
}

// ============================================================================
// Resize Handles
// ============================================================================

/// A resize hotspot on a rectangle-like shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handle {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
    Top,
    Right,
    Bottom,
    Left,
}

impl Handle {
    /// All handles in hit-test order: corners first, then edge midpoints.
    pub const ALL: [Handle; 8] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomRight,
        Handle::BottomLeft,
        Handle::Top,
        Handle::Right,
        Handle::Bottom,
        Handle::Left,
    ];

    /// Corner handles only.
    pub const CORNERS: [Handle; 4] = [
        Handle::TopLeft,
        Handle::TopRight,
        Handle::BottomRight,
        Handle::BottomLeft,
    ];

    /// Short identifier, e.g. `resize-tl`.
    pub fn id(&self) -> &'static str {
        match self {
            Handle::TopLeft => "resize-tl",
            Handle::TopRight => "resize-tr",
            Handle::BottomRight => "resize-br",
            Handle::BottomLeft => "resize-bl",
            Handle::Top => "resize-t",
            Handle::Right => "resize-r",
            Handle::Bottom => "resize-b",
            Handle::Left => "resize-l",
        }
    }

    /// Which edges this handle moves, as `(left, top, right, bottom)`.
    pub fn edges(&self) -> (bool, bool, bool, bool) {
        match self {
            Handle::TopLeft => (true, true, false, false),
            Handle::TopRight => (false, true, true, false),
            Handle::BottomRight => (false, false, true, true),
            Handle::BottomLeft => (true, false, false, true),
            Handle::Top => (false, true, false, false),
            Handle::Right => (false, false, true, false),
            Handle::Bottom => (false, false, false, true),
            Handle::Left => (true, false, false, false),
        }
    }

    /// Anchor of this handle on `rect`.
    pub fn anchor(&self, rect: &Rect) -> Point {
        let Rect { x, y, w, h } = *rect;
        match self {
            Handle::TopLeft => Point::new(x, y),
            Handle::TopRight => Point::new(x + w, y),
            Handle::BottomRight => Point::new(x + w, y + h),
            Handle::BottomLeft => Point::new(x, y + h),
            Handle::Top => Point::new(x + w / 2.0, y),
            Handle::Right => Point::new(x + w, y + h / 2.0),
            Handle::Bottom => Point::new(x + w / 2.0, y + h),
            Handle::Left => Point::new(x, y + h / 2.0),
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The 8 handle squares of `rect`, each of side `size`, in [`Handle::ALL`] order.
pub fn handle_rects(rect: &Rect, size: f64) -> [(Handle, Rect); 8] {
    Handle::ALL.map(|handle| (handle, Rect::centered(handle.anchor(rect), size)))
}

// ============================================================================
// Clamping and Containment
// ============================================================================

fn clamp_coord(v: f64, max: f64) -> f64 {
    v.min(max).max(0.0)
}

/// Clamp a point into `[0, width] × [0, height]`.
pub fn clamp_point_to_image(p: Point, image: ImageSize) -> Point {
    Point::new(
        clamp_coord(p.x, image.width),
        clamp_coord(p.y, image.height),
    )
}

/// Clamp both corners of `rect` into the image and rebuild it from them.
///
/// A rectangle lying entirely outside the image collapses to zero size;
/// callers treat that as invalid.
pub fn clamp_rect_to_image(rect: Rect, image: ImageSize) -> Rect {
    let x1 = clamp_coord(rect.x, image.width);
    let y1 = clamp_coord(rect.y, image.height);
    let x2 = clamp_coord(rect.x + rect.w, image.width);
    let y2 = clamp_coord(rect.y + rect.h, image.height);
    Rect::new(x1, y1, x2 - x1, y2 - y1)
}

/// Inclusive point-in-rectangle test.
pub fn point_in_rect(p: Point, rect: &Rect) -> bool {
    p.x >= rect.x && p.x <= rect.x + rect.w && p.y >= rect.y && p.y <= rect.y + rect.h
}

/// Rotate `p` about `center` by `angle` radians.
pub fn rotate_point(p: Point, center: Point, angle: f64) -> Point {
    let (sin, cos) = angle.sin_cos();
    let dx = p.x - center.x;
    let dy = p.y - center.y;
    Point::new(
        center.x + (dx * cos - dy * sin),
        center.y + (dx * sin + dy * cos),
    )
}

/// Wrap an angle into `(-π, π]`.
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a <= -PI {
        a += 2.0 * PI;
    }
    a
}
