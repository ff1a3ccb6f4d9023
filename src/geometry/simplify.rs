//! Douglas-Peucker polyline simplification.

use super::Point;

/// Squared distance from `p` to the segment `a`-`b`.
fn sq_segment_distance(p: Point, a: Point, b: Point) -> f64 {
    let mut closest = a;
    let dx = b.x - a.x;
    let dy = b.y - a.y;

    if dx != 0.0 || dy != 0.0 {
        let t = ((p.x - a.x) * dx + (p.y - a.y) * dy) / (dx * dx + dy * dy);
        if t > 1.0 {
            closest = b;
        } else if t > 0.0 {
            closest = Point::new(a.x + dx * t, a.y + dy * t);
        }
    }

    p.distance_sq(closest)
}

/// Simplify a polyline, keeping both endpoints.
///
/// Points farther than `tolerance` from the chord of their span survive;
/// inputs of two points or fewer are returned as they are.
pub fn simplify_points(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let sq_tolerance = tolerance * tolerance;
    let mut out = Vec::with_capacity(points.len() / 2 + 2);
    simplify_span(points, sq_tolerance, &mut out);
    out
}

/// Append the simplified span to `out`, including its last point.
fn simplify_span(points: &[Point], sq_tolerance: f64, out: &mut Vec<Point>) {
    let first = points[0];
    let last = points[points.len() - 1];

    let mut max_sq_dist = 0.0;
    let mut index = 0;
    for (i, p) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let sq_dist = sq_segment_distance(*p, first, last);
        if sq_dist > max_sq_dist {
            index = i;
            max_sq_dist = sq_dist;
        }
    }

    if max_sq_dist > sq_tolerance {
        simplify_span(&points[..=index], sq_tolerance, out);
        // The left half already ended on `points[index]`.
        out.pop();
        simplify_span(&points[index..], sq_tolerance, out);
    } else {
        out.push(first);
        out.push(last);
    }
}
