//! Polygon predicates and normalization.

use super::{Point, Rect};

/// Tolerance for collinearity and on-segment tests.
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

fn orientation(p: Point, q: Point, r: Point) -> Orientation {
    let val = (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y);
    if val.abs() < EPSILON {
        Orientation::Collinear
    } else if val > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// Whether `q` lies within the bounding box of segment `p`-`r`.
fn on_segment(p: Point, q: Point, r: Point) -> bool {
    q.x <= p.x.max(r.x) + EPSILON
        && q.x >= p.x.min(r.x) - EPSILON
        && q.y <= p.y.max(r.y) + EPSILON
        && q.y >= p.y.min(r.y) - EPSILON
}

fn segments_intersect(p1: Point, q1: Point, p2: Point, q2: Point) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == Orientation::Collinear && on_segment(p1, p2, q1))
        || (o2 == Orientation::Collinear && on_segment(p1, q2, q1))
        || (o3 == Orientation::Collinear && on_segment(p2, p1, q2))
        || (o4 == Orientation::Collinear && on_segment(p2, q1, q2))
}

fn boxes_disjoint(p1: Point, q1: Point, p2: Point, q2: Point) -> bool {
    p1.x.max(q1.x) < p2.x.min(q2.x)
        || p2.x.max(q2.x) < p1.x.min(q1.x)
        || p1.y.max(q1.y) < p2.y.min(q2.y)
        || p2.y.max(q2.y) < p1.y.min(q1.y)
}

/// Test every non-adjacent edge pair of the closed ring for an intersection.
///
/// The pair formed by the first and the closing edge is adjacent and skipped.
pub fn is_polygon_self_intersecting(points: &[Point]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }

    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }

            let (p1, q1) = (points[i], points[(i + 1) % n]);
            let (p2, q2) = (points[j], points[(j + 1) % n]);

            if boxes_disjoint(p1, q1, p2, q2) {
                continue;
            }
            if segments_intersect(p1, q1, p2, q2) {
                return true;
            }
        }
    }
    false
}

/// Orientation sum `Σ (x₂ − x₁)(y₂ + y₁)` over the closed ring.
pub fn orientation_sum(points: &[Point]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let p1 = points[i];
            let p2 = points[(i + 1) % n];
            (p2.x - p1.x) * (p2.y + p1.y)
        })
        .sum()
}

/// Reverse the vertex order when the orientation sum is negative.
///
/// Rings with fewer than 3 vertices are returned unchanged.
pub fn force_clockwise(points: Vec<Point>) -> Vec<Point> {
    if points.len() < 3 {
        return points;
    }
    let mut points = points;
    if orientation_sum(&points) < 0.0 {
        points.reverse();
    }
    points
}

/// Absolute shoelace area; zero for fewer than 3 vertices.
pub fn polygon_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let j = (i + 1) % n;
            points[i].x * points[j].y - points[j].x * points[i].y
        })
        .sum();
    twice.abs() / 2.0
}

/// Even-odd ray casting containment test.
pub fn point_in_polygon(p: Point, points: &[Point]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = points[i];
        let vj = points[j];
        if ((vi.y > p.y) != (vj.y > p.y))
            && (p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Axis-aligned bounds of a point set.
pub fn bounding_rect(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
}
