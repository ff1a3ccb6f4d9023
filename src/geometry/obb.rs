//! Oriented rectangles.

use serde::{Deserialize, Serialize};

use super::{Handle, Point, Rect, rotate_point};

/// A rectangle rotated about its centre.
///
/// `(x, y)` is the centre, `rotation` is in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OrientedRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub rotation: f64,
}

impl OrientedRect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64, rotation: f64) -> Self {
        Self {
            x,
            y,
            w,
            h,
            rotation,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Rotate `p` by `-rotation` about the centre, then test the half extents.
    pub fn contains(&self, p: Point) -> bool {
        let local = rotate_point(p, self.center(), -self.rotation);
        let (hw, hh) = (self.w / 2.0, self.h / 2.0);
        local.x >= self.x - hw
            && local.x <= self.x + hw
            && local.y >= self.y - hh
            && local.y <= self.y + hh
    }

    /// Axis-aligned box spanning the rotated corners.
    pub fn bounding_rect(&self) -> Rect {
        let corners = obb_corners(self);
        let mut bounds = Rect::from_corners(corners[0], corners[0]);
        for c in &corners[1..] {
            let x2 = (bounds.x + bounds.w).max(c.x);
            let y2 = (bounds.y + bounds.h).max(c.y);
            bounds.x = bounds.x.min(c.x);
            bounds.y = bounds.y.min(c.y);
            bounds.w = x2 - bounds.x;
            bounds.h = y2 - bounds.y;
        }
        bounds
    }
}

/// Corner points in tl, tr, br, bl order, rotated into image space.
pub fn obb_corners(obb: &OrientedRect) -> [Point; 4] {
    let (hw, hh) = (obb.w / 2.0, obb.h / 2.0);
    let center = obb.center();
    [
        Point::new(obb.x - hw, obb.y - hh),
        Point::new(obb.x + hw, obb.y - hh),
        Point::new(obb.x + hw, obb.y + hh),
        Point::new(obb.x - hw, obb.y + hh),
    ]
    .map(|p| rotate_point(p, center, obb.rotation))
}

/// Square corner handles of side `size`, centred on the rotated corners.
pub fn obb_handle_rects(obb: &OrientedRect, size: f64) -> [(Handle, Rect); 4] {
    let corners = obb_corners(obb);
    [0, 1, 2, 3].map(|i| (Handle::CORNERS[i], Rect::centered(corners[i], size)))
}

/// Smallest box with the given orientation that contains every point.
///
/// The points are rotated by `-angle`, boxed axis-aligned, and the box
/// centre is rotated back. `rotation` of the result is exactly `angle`.
/// Returns `None` for fewer than 3 points.
pub fn fit_obb_with_orientation(points: &[Point], angle: f64) -> Option<OrientedRect> {
    if points.len() < 3 {
        return None;
    }

    let (sin, cos) = (-angle).sin_cos();
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);

    for p in points {
        let rx = p.x * cos - p.y * sin;
        let ry = p.x * sin + p.y * cos;
        min_x = min_x.min(rx);
        max_x = max_x.max(rx);
        min_y = min_y.min(ry);
        max_y = max_y.max(ry);
    }

    let local_center = Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    let center = rotate_point(local_center, Point::default(), angle);

    Some(OrientedRect::new(
        center.x,
        center.y,
        max_x - min_x,
        max_y - min_y,
        angle,
    ))
}
