//! Self-intersection repair by mask projection.
//!
//! A self-intersecting ring has no trustworthy vertex order, so instead of
//! untangling its edges the filled area it describes is rasterized and its
//! outer boundary traced back into a simple ring:
//!
//! 1. Fill the path (non-zero winding) plus a thin round-joined outline
//! 2. Find the first solid pixel in raster order
//! 3. Trace the outer boundary with Moore-neighbor following
//! 4. Map pixels back to image space and simplify with Douglas-Peucker
//! 5. Normalize the vertex order with [`force_clockwise`]

use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use super::contour::{BinaryMask, trace_outer_boundary};
use super::polygon::{bounding_rect, force_clockwise};
use super::simplify::simplify_points;
use super::{ImageSize, Point};
use crate::constants::repair::{ALPHA_THRESHOLD, MAX_DIMENSION, PADDING, STROKE_WIDTH};

/// Raster size limits for [`repair_polygon_with_limits`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepairLimits {
    /// Longest raster side; larger images are downscaled
    pub max_dimension: f64,
    /// Empty border around the rasterized shape, in raster pixels
    pub padding: u32,
}

impl Default for RepairLimits {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            padding: PADDING,
        }
    }
}

/// Raster window into the full padded canvas of the image.
///
/// Only the part around the polygon is allocated, but pixel `(0, 0)` of
/// the window sits at `(origin_x, origin_y)` of the full canvas, so the
/// pixel grid matches a whole-image render.
#[derive(Debug, Clone, Copy)]
struct RasterWindow {
    scale: f64,
    padding: u32,
    origin_x: u32,
    origin_y: u32,
    width: u32,
    height: u32,
}

impl RasterWindow {
    fn new(points: &[Point], image: ImageSize, limits: &RepairLimits) -> Option<Self> {
        let max_dim = image.width.max(image.height);
        if max_dim <= 0.0 || !max_dim.is_finite() || limits.max_dimension <= 0.0 {
            return None;
        }
        let scale = if max_dim > limits.max_dimension {
            limits.max_dimension / max_dim
        } else {
            1.0
        };

        let pad = f64::from(limits.padding);
        let canvas_w = (image.width * scale).ceil() + 2.0 * pad;
        let canvas_h = (image.height * scale).ceil() + 2.0 * pad;

        let bounds = bounding_rect(points)?;
        let x0 = (bounds.x * scale).floor().clamp(0.0, canvas_w);
        let y0 = (bounds.y * scale).floor().clamp(0.0, canvas_h);
        let x1 = ((bounds.x + bounds.w) * scale + 2.0 * pad + 1.0)
            .ceil()
            .clamp(0.0, canvas_w);
        let y1 = ((bounds.y + bounds.h) * scale + 2.0 * pad + 1.0)
            .ceil()
            .clamp(0.0, canvas_h);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(Self {
            scale,
            padding: limits.padding,
            origin_x: x0 as u32,
            origin_y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    /// Canvas-to-window translation, applied after scaling.
    fn transform(&self) -> Transform {
        let pad = self.padding as f32;
        Transform::from_translate(pad - self.origin_x as f32, pad - self.origin_y as f32)
    }

    fn to_image(&self, px: usize, py: usize) -> Point {
        let pad = f64::from(self.padding);
        Point::new(
            (px as f64 + f64::from(self.origin_x) - pad) / self.scale,
            (py as f64 + f64::from(self.origin_y) - pad) / self.scale,
        )
    }
}

fn rasterize(points: &[Point], window: &RasterWindow) -> Option<BinaryMask> {
    let mut pb = PathBuilder::new();
    let scaled = |p: &Point| ((p.x * window.scale) as f32, (p.y * window.scale) as f32);

    let (first, rest) = points.split_first()?;
    let (fx, fy) = scaled(first);
    pb.move_to(fx, fy);
    for p in rest {
        let (x, y) = scaled(p);
        pb.line_to(x, y);
    }
    pb.close();
    let path = pb.finish()?;

    let mut pixmap = Pixmap::new(window.width, window.height)?;
    let mut paint = Paint::default();
    paint.set_color_rgba8(255, 255, 255, 255);
    paint.anti_alias = true;

    let transform = window.transform();
    pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);

    let stroke = Stroke {
        width: STROKE_WIDTH,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint, &stroke, transform, None);

    Some(BinaryMask::from_rgba_alpha(
        window.width as usize,
        window.height as usize,
        pixmap.data(),
        ALPHA_THRESHOLD,
    ))
}

/// Replace a (possibly self-intersecting) ring with the simple outline of
/// the area it fills.
///
/// Inputs with fewer than 3 vertices, or whose raster comes out empty, are
/// returned unchanged.
pub fn repair_polygon_by_mask_projection(points: &[Point], image: ImageSize) -> Vec<Point> {
    repair_polygon_with_limits(points, image, &RepairLimits::default())
}

/// [`repair_polygon_by_mask_projection`] with explicit raster limits.
pub fn repair_polygon_with_limits(
    points: &[Point],
    image: ImageSize,
    limits: &RepairLimits,
) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let Some(window) = RasterWindow::new(points, image, limits) else {
        log::warn!("Polygon repair: no raster area for {} points", points.len());
        return points.to_vec();
    };

    let Some(mask) = rasterize(points, &window) else {
        log::warn!(
            "Polygon repair: failed to rasterize {}x{} window",
            window.width,
            window.height
        );
        return points.to_vec();
    };

    let Some(start) = mask.first_solid() else {
        log::debug!("Polygon repair: raster is empty, keeping input");
        return points.to_vec();
    };

    let contour: Vec<Point> = trace_outer_boundary(&mask, start)
        .into_iter()
        .map(|(px, py)| window.to_image(px, py))
        .collect();

    let mut simplified = simplify_points(&contour, 1.0 / window.scale);
    if simplified.len() > 1 && simplified.first() == simplified.last() {
        simplified.pop();
    }

    log::debug!(
        "Polygon repair: {} input points -> {} traced -> {} simplified",
        points.len(),
        contour.len(),
        simplified.len()
    );

    force_clockwise(simplified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::polygon::{
        is_polygon_self_intersecting, orientation_sum, polygon_area,
    };
    use std::f64::consts::PI;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn pentagram(center: Point, radius: f64) -> Vec<Point> {
        (0..5)
            .map(|k| {
                let angle = -PI / 2.0 + f64::from(k * 2 % 5) * 2.0 * PI / 5.0;
                Point::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                )
            })
            .collect()
    }

    #[test]
    fn test_short_input_unchanged() {
        let line = pts(&[(0.0, 0.0), (10.0, 10.0)]);
        let image = ImageSize::new(100.0, 100.0);
        assert_eq!(repair_polygon_by_mask_projection(&line, image), line);
    }

    #[test]
    fn test_pentagram_becomes_simple_outline() {
        let star = pentagram(Point::new(100.0, 100.0), 80.0);
        assert!(is_polygon_self_intersecting(&star));

        let repaired = repair_polygon_by_mask_projection(&star, ImageSize::new(200.0, 200.0));

        assert!(repaired.len() >= 3);
        assert!(!is_polygon_self_intersecting(&repaired));
        assert!(orientation_sum(&repaired) >= 0.0);
        // The filled star keeps its centre, so the outline covers more
        // than the five tips alone.
        assert!(polygon_area(&repaired) > 5000.0);
    }

    #[test]
    fn test_bow_tie_repaired_has_area() {
        let bow_tie = pts(&[(20.0, 20.0), (120.0, 120.0), (120.0, 20.0), (20.0, 120.0)]);
        let repaired = repair_polygon_by_mask_projection(&bow_tie, ImageSize::new(200.0, 200.0));

        assert!(repaired.len() >= 3);
        assert!(polygon_area(&repaired) > 0.0);
        assert!(repaired.first() != repaired.last());
    }

    #[test]
    fn test_simple_square_round_trips_closely() {
        let square = pts(&[(10.0, 10.0), (60.0, 10.0), (60.0, 60.0), (10.0, 60.0)]);
        let repaired = repair_polygon_by_mask_projection(&square, ImageSize::new(100.0, 100.0));
        let area = polygon_area(&repaired);
        assert!((area - 2500.0).abs() < 250.0, "area {area}");
        for p in &repaired {
            assert!(p.x >= 7.0 && p.x <= 63.0 && p.y >= 7.0 && p.y <= 63.0, "{p}");
        }
    }

    #[test]
    fn test_large_image_is_downscaled() {
        let image = ImageSize::new(8000.0, 8000.0);
        let limits = RepairLimits::default();
        let window = RasterWindow::new(&pts(&[(0.0, 0.0), (8000.0, 8000.0)]), image, &limits)
            .expect("window");
        assert_eq!(window.scale, 0.5);
        assert!(window.width <= 4000 + 2 * PADDING);

        let square = pts(&[(1000.0, 1000.0), (3000.0, 1000.0), (3000.0, 3000.0), (1000.0, 3000.0)]);
        let repaired = repair_polygon_by_mask_projection(&square, image);
        let area = polygon_area(&repaired);
        assert!((area - 4.0e6).abs() < 4.0e4, "area {area}");
    }

    #[test]
    fn test_tighter_raster_cap_still_repairs() {
        let bow_tie = pts(&[(20.0, 20.0), (120.0, 120.0), (120.0, 20.0), (20.0, 120.0)]);
        let image = ImageSize::new(200.0, 200.0);
        let limits = RepairLimits {
            max_dimension: 100.0,
            padding: 4,
        };
        let window = RasterWindow::new(&bow_tie, image, &limits).expect("window");
        assert_eq!(window.scale, 0.5);
        assert_eq!(window.padding, 4);

        let repaired = repair_polygon_with_limits(&bow_tie, image, &limits);
        assert!(repaired.len() >= 3);
        assert!(polygon_area(&repaired) > 0.0);
    }
}
