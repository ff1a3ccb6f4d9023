//! Polygon editor: one click per vertex, closed explicitly.
//!
//! Closing runs the ring through [`PolygonEditor::fix`]: self-intersecting
//! rings are repaired by mask projection, simple ones are made clockwise,
//! and anything left with too little area is rejected.

use crate::config::EditorConfig;
use crate::constants::polygon::MIN_VERTICES;
use crate::constants::render as style;
use crate::error::{EditorError, Rejection};
use crate::events::Advisory;
use crate::geometry::{
    ImageSize, Point, Rect, bounding_rect, clamp_point_to_image, force_clockwise,
    RepairLimits, is_polygon_self_intersecting, point_in_polygon, point_in_rect, polygon_area,
    repair_polygon_with_limits,
};
use crate::model::{Annotation, Label, Shape, ShapeKind};

use super::render::{self, Paint, Primitive, RenderState, Stroke, TextAlign};
use super::{DragContext, DrawOutcome, HitType, ShapeEditor, expect_kind};

/// A ring that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFix {
    /// Clockwise, non-self-intersecting vertices
    pub points: Vec<Point>,
    /// Whether mask-projection repair was needed
    pub repaired: bool,
}

/// Draws and edits [`Shape::Polygon`].
#[derive(Debug, Clone)]
pub struct PolygonEditor {
    handle_size: f64,
    min_point_dist_sq: f64,
    min_area: f64,
    repair: RepairLimits,
    /// Vertices placed so far; empty when idle
    points: Vec<Point>,
    /// Clamped pointer position, drawn as a rubber-band vertex
    hover: Option<Point>,
    label: Option<Label>,
    image: Option<ImageSize>,
}

impl PolygonEditor {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            handle_size: config.handle_size,
            min_point_dist_sq: config.polygon_min_point_dist_sq,
            min_area: config.polygon_min_area,
            repair: config.repair_limits(),
            points: Vec::new(),
            hover: None,
            label: None,
            image: None,
        }
    }

    /// Vertices placed so far.
    pub fn vertices(&self) -> &[Point] {
        &self.points
    }

    fn reset(&mut self) {
        self.points.clear();
        self.hover = None;
        self.label = None;
        self.image = None;
    }

    /// Validate a ring: repair self-intersections, otherwise force
    /// clockwise order, then enforce the minimum area.
    pub fn fix(&self, points: &[Point], image: ImageSize) -> Result<PolygonFix, Rejection> {
        if points.len() < MIN_VERTICES {
            return Err(Rejection::TooFewVertices {
                count: points.len(),
                min: MIN_VERTICES,
            });
        }

        let repaired = is_polygon_self_intersecting(points);
        let fixed = if repaired {
            repair_polygon_with_limits(points, image, &self.repair)
        } else {
            force_clockwise(points.to_vec())
        };

        if fixed.len() < MIN_VERTICES {
            return Err(Rejection::TooFewVertices {
                count: fixed.len(),
                min: MIN_VERTICES,
            });
        }
        let area = polygon_area(&fixed);
        if area < self.min_area {
            return Err(Rejection::AreaTooSmall {
                area,
                min: self.min_area,
            });
        }

        Ok(PolygonFix {
            points: fixed,
            repaired,
        })
    }

    /// Close the polygon under construction.
    pub fn close(&mut self, image: ImageSize) -> DrawOutcome {
        if self.points.is_empty() {
            return DrawOutcome::Pending;
        }
        let points = std::mem::take(&mut self.points);
        let label = self.label.take();
        self.reset();

        let Some(label) = label else {
            return DrawOutcome::Pending;
        };

        match self.fix(&points, image) {
            Ok(fix) => {
                log::info!(
                    "Polygon: committed {} vertices as '{}'{}",
                    fix.points.len(),
                    label.name,
                    if fix.repaired { " (repaired)" } else { "" }
                );
                let advisory = fix.repaired.then_some(Advisory::PolygonRepaired {
                    before: points.len(),
                    after: fix.points.len(),
                });
                DrawOutcome::Committed {
                    annotation: Annotation::new(Shape::Polygon { points: fix.points }, &label),
                    advisory,
                }
            }
            Err(rejection) => {
                log::debug!("Polygon: rejected on close: {}", rejection);
                DrawOutcome::Rejected(rejection)
            }
        }
    }
}

/// Square markers on every vertex.
fn vertex_squares(
    points: &[Point],
    size: f64,
    zoom: f64,
    fill: impl Fn(usize) -> Paint,
    outline: &Paint,
) -> Vec<Primitive> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| Primitive::Rect {
            rect: Rect::centered(*p, size),
            fill: Some(fill(i)),
            stroke: Some(Stroke::new(outline.clone(), 1.0 / zoom)),
        })
        .collect()
}

impl Default for PolygonEditor {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl ShapeEditor for PolygonEditor {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Polygon
    }

    fn is_drawing(&self) -> bool {
        !self.points.is_empty()
    }

    fn start_drawing(&mut self, at: Point, label: &Label, image: ImageSize) -> DrawOutcome {
        let p = clamp_point_to_image(at, image);

        if let Some(last) = self.points.last() {
            if p.distance_sq(*last) < self.min_point_dist_sq {
                log::trace!("Polygon: click at {} repeats the last vertex", p);
                return DrawOutcome::Pending;
            }
        } else {
            self.label = Some(label.clone());
            self.image = Some(image);
            log::debug!("Polygon: drawing started at {}", p);
        }

        self.points.push(p);
        log::trace!("Polygon: vertex {} at {}", self.points.len(), p);
        DrawOutcome::Pending
    }

    fn update_drawing(&mut self, at: Point) {
        if self.is_drawing() {
            self.hover = Some(self.image.map_or(at, |image| clamp_point_to_image(at, image)));
        }
    }

    fn release(&mut self, _at: Point, _image: ImageSize) -> DrawOutcome {
        DrawOutcome::Pending
    }

    fn finish(&mut self, image: ImageSize) -> DrawOutcome {
        self.close(image)
    }

    fn secondary_action(&mut self, image: ImageSize) -> DrawOutcome {
        self.close(image)
    }

    fn cancel(&mut self) {
        if self.is_drawing() {
            log::debug!("Polygon: discarded {} vertices", self.points.len());
        }
        self.reset();
    }

    fn hit_test(
        &self,
        shape: &Shape,
        at: Point,
        zoom: f64,
        handles_only: bool,
    ) -> Result<Option<HitType>, EditorError> {
        expect_kind(ShapeKind::Polygon, shape)?;
        let Shape::Polygon { points } = shape else {
            return Ok(None);
        };

        let size = self.handle_size / zoom;
        if let Some(i) = points
            .iter()
            .position(|p| point_in_rect(at, &Rect::centered(*p, size)))
        {
            return Ok(Some(HitType::Vertex(i)));
        }

        Ok((!handles_only && point_in_polygon(at, points)).then_some(HitType::Move))
    }

    fn update_drag(
        &self,
        drag: &DragContext,
        at: Point,
        image: ImageSize,
        shape: &mut Shape,
    ) -> Result<(), EditorError> {
        expect_kind(ShapeKind::Polygon, shape)?;
        expect_kind(ShapeKind::Polygon, &drag.original)?;
        let (Shape::Polygon { points: original }, Shape::Polygon { points: target }) =
            (&drag.original, shape)
        else {
            return Ok(());
        };

        let delta = clamp_point_to_image(at, image) - drag.origin;

        match drag.hit {
            HitType::Move => {
                let moved: Vec<Point> = original.iter().map(|p| *p + delta).collect();
                let Some(bounds) = bounding_rect(&moved) else {
                    return Ok(());
                };
                // One corrective shift keeps the whole ring inside the image
                let shift_x = if bounds.x < 0.0 {
                    -bounds.x
                } else if bounds.x + bounds.w > image.width {
                    image.width - (bounds.x + bounds.w)
                } else {
                    0.0
                };
                let shift_y = if bounds.y < 0.0 {
                    -bounds.y
                } else if bounds.y + bounds.h > image.height {
                    image.height - (bounds.y + bounds.h)
                } else {
                    0.0
                };
                let shift = Point::new(shift_x, shift_y);
                *target = moved.into_iter().map(|p| p + shift).collect();
            }
            HitType::Vertex(i) => {
                let (Some(orig), true) = (original.get(i), i < target.len()) else {
                    return Err(EditorError::index_out_of_range(i, original.len()));
                };
                target[i] = clamp_point_to_image(*orig + delta, image);
            }
            HitType::Resize(_) | HitType::Rotate => {}
        }
        Ok(())
    }

    fn render(&self, annotation: &Annotation, state: &RenderState, zoom: f64) -> Vec<Primitive> {
        let Shape::Polygon { points } = &annotation.shape else {
            return Vec::new();
        };
        let color = annotation.color.clone();

        let mut out = vec![Primitive::Path {
            points: points.clone(),
            closed: true,
            fill: Some(Paint::new(color.clone(), style::FILL_ALPHA)),
            stroke: Some(Stroke::new(Paint::solid(color.clone()), state.stroke_width(zoom))),
        }];

        if let Some(first) = points.first() {
            out.push(render::label_text(
                annotation.label.clone(),
                Point::new(first.x, first.y - style::LABEL_OFFSET_SCREEN / zoom),
                TextAlign::Left,
                zoom,
            ));
        }

        if state.shows_handles() {
            // Hover highlighting applies to the selected shape only
            let hovered_vertex = match state.hovered_hit {
                Some(HitType::Vertex(i)) if state.selected => Some(i),
                _ => None,
            };
            let outline = Paint::solid(color.clone());
            out.extend(vertex_squares(
                points,
                self.handle_size / zoom,
                zoom,
                |i| {
                    if hovered_vertex == Some(i) {
                        Paint::white()
                    } else {
                        Paint::solid(color.clone())
                    }
                },
                &outline,
            ));
        }
        out
    }

    fn preview(&self, zoom: f64) -> Vec<Primitive> {
        let Some(label) = &self.label else {
            return Vec::new();
        };
        if self.points.is_empty() {
            return Vec::new();
        }
        let color = label.color.clone();

        let mut ring = self.points.clone();
        ring.extend(self.hover);

        let mut out = vec![Primitive::Path {
            points: ring,
            closed: true,
            fill: Some(Paint::new(color.clone(), style::PREVIEW_FILL_ALPHA)),
            stroke: Some(Stroke::new(
                Paint::solid(color.clone()),
                style::PREVIEW_STROKE_WIDTH / zoom,
            )),
        }];
        let outline = Paint::solid(color.clone());
        out.extend(vertex_squares(
            &self.points,
            self.handle_size / zoom,
            zoom,
            |_| Paint::solid(color.clone()),
            &outline,
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::orientation_sum;

    fn tree() -> Label {
        Label::parse("tree", "#00ff00").unwrap()
    }

    fn image() -> ImageSize {
        ImageSize::new(500.0, 500.0)
    }

    fn click_all(editor: &mut PolygonEditor, points: &[(f64, f64)]) {
        for &(x, y) in points {
            editor.start_drawing(Point::new(x, y), &tree(), image());
            editor.release(Point::new(x, y), image());
        }
    }

    fn committed_points(outcome: DrawOutcome) -> Vec<Point> {
        match outcome {
            DrawOutcome::Committed { annotation, .. } => annotation.shape.as_polygon().unwrap().to_vec(),
            other => panic!("expected a commit, got {:?}", other),
        }
    }

    fn square(x: f64, y: f64, s: f64) -> Vec<Point> {
        vec![
            Point::new(x, y),
            Point::new(x + s, y),
            Point::new(x + s, y + s),
            Point::new(x, y + s),
        ]
    }

    #[test]
    fn test_clicks_accumulate_and_close() {
        let mut editor = PolygonEditor::default();
        click_all(&mut editor, &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (5.0, 5.0)]);
        assert_eq!(editor.vertices().len(), 5);

        let points = committed_points(editor.close(image()));
        assert!(points.len() >= 3);
        assert!(!is_polygon_self_intersecting(&points));
        assert!(polygon_area(&points) > 0.0);
        assert!(!editor.is_drawing());
    }

    #[test]
    fn test_close_enforces_clockwise() {
        let mut editor = PolygonEditor::default();
        let input = [(0.0, 0.0), (50.0, 0.0), (50.0, 50.0), (0.0, 50.0)];
        assert!(orientation_sum(&square(0.0, 0.0, 50.0)) < 0.0);
        click_all(&mut editor, &input);
        let points = committed_points(editor.close(image()));
        assert!(orientation_sum(&points) >= 0.0);
        assert_eq!(points[0], Point::new(0.0, 50.0));
        assert_eq!(points.len(), 4);
    }

    #[test]
    fn test_nearby_click_is_ignored() {
        let mut editor = PolygonEditor::default();
        click_all(&mut editor, &[(10.0, 10.0), (13.0, 13.0), (20.0, 10.0)]);
        assert_eq!(editor.vertices(), &[Point::new(10.0, 10.0), Point::new(20.0, 10.0)]);
    }

    #[test]
    fn test_clicks_are_clamped() {
        let mut editor = PolygonEditor::default();
        click_all(&mut editor, &[(-10.0, 600.0)]);
        assert_eq!(editor.vertices(), &[Point::new(0.0, 500.0)]);
    }

    #[test]
    fn test_too_few_vertices_rejected_and_reset() {
        let mut editor = PolygonEditor::default();
        click_all(&mut editor, &[(0.0, 0.0), (50.0, 0.0)]);
        assert_eq!(
            editor.close(image()),
            DrawOutcome::Rejected(Rejection::TooFewVertices { count: 2, min: 3 })
        );
        assert!(!editor.is_drawing());
    }

    #[test]
    fn test_sliver_rejected() {
        let mut editor = PolygonEditor::default();
        click_all(&mut editor, &[(0.0, 0.0), (100.0, 0.0), (50.0, 0.08)]);
        assert!(matches!(
            editor.close(image()),
            DrawOutcome::Rejected(Rejection::AreaTooSmall { .. })
        ));
    }

    #[test]
    fn test_bow_tie_is_repaired() {
        let editor = PolygonEditor::default();
        let bow_tie = [
            Point::new(100.0, 100.0),
            Point::new(200.0, 200.0),
            Point::new(200.0, 100.0),
            Point::new(100.0, 200.0),
        ];
        let fix = editor.fix(&bow_tie, image()).unwrap();
        assert!(fix.repaired);
        assert!(fix.points.len() >= 3);
        assert!(!is_polygon_self_intersecting(&fix.points));
    }

    #[test]
    fn test_secondary_action_closes() {
        let mut editor = PolygonEditor::default();
        click_all(&mut editor, &[(0.0, 0.0), (40.0, 0.0), (40.0, 40.0)]);
        assert!(matches!(
            editor.secondary_action(image()),
            DrawOutcome::Committed { advisory: None, .. }
        ));
    }

    #[test]
    fn test_hit_test_vertices_then_body() {
        let editor = PolygonEditor::default();
        let shape = Shape::Polygon {
            points: square(100.0, 100.0, 100.0),
        };
        let hit = |x, y, only| editor.hit_test(&shape, Point::new(x, y), 1.0, only).unwrap();
        assert_eq!(hit(198.0, 103.0, false), Some(HitType::Vertex(1)));
        assert_eq!(hit(150.0, 150.0, false), Some(HitType::Move));
        assert_eq!(hit(150.0, 150.0, true), None);
        assert_eq!(hit(250.0, 150.0, false), None);
    }

    #[test]
    fn test_move_shifts_back_inside() {
        let editor = PolygonEditor::default();
        let mut shape = Shape::Polygon {
            points: square(10.0, 10.0, 50.0),
        };
        let ctx = DragContext::new(0, HitType::Move, Point::new(30.0, 30.0), shape.clone());
        editor.update_drag(&ctx, Point::new(0.0, 40.0), image(), &mut shape).unwrap();
        // dx = -30 would push x to -20; the ring is shifted back to 0
        assert_eq!(shape.as_polygon().unwrap(), square(0.0, 20.0, 50.0).as_slice());
    }

    #[test]
    fn test_vertex_drag_is_clamped() {
        let editor = PolygonEditor::default();
        let mut shape = Shape::Polygon {
            points: square(10.0, 10.0, 50.0),
        };
        let ctx = DragContext::new(0, HitType::Vertex(2), Point::new(60.0, 60.0), shape.clone());
        editor.update_drag(&ctx, Point::new(80.0, 70.0), image(), &mut shape).unwrap();
        assert_eq!(shape.as_polygon().unwrap()[2], Point::new(80.0, 70.0));
        assert_eq!(shape.as_polygon().unwrap()[0], Point::new(10.0, 10.0));

        let bad = DragContext::new(0, HitType::Vertex(9), Point::new(60.0, 60.0), shape.clone());
        assert!(editor.update_drag(&bad, Point::new(0.0, 0.0), image(), &mut shape).is_err());
    }

    #[test]
    fn test_preview_includes_vertices() {
        let mut editor = PolygonEditor::default();
        assert!(editor.preview(1.0).is_empty());
        click_all(&mut editor, &[(0.0, 0.0), (40.0, 0.0)]);
        // One ring plus one square per vertex
        assert_eq!(editor.preview(1.0).len(), 3);
    }
}
