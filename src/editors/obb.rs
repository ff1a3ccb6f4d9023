//! Oriented box editor.
//!
//! Construction takes three clicks:
//! 1. Press fixes `p1`; dragging shows the first edge.
//! 2. Release fixes `p2` once the edge is long enough; the edge sets the
//!    rotation.
//! 3. The next click's perpendicular distance from the edge sets the height.
//!
//! Rotation of committed boxes is wheel-driven through the centre handle.

use crate::config::EditorConfig;
use crate::constants::render as style;
use crate::error::{EditorError, Rejection};
use crate::geometry::{
    ImageSize, OrientedRect, Point, clamp_point_to_image, normalize_angle, obb_handle_rects,
    point_in_rect, rotate_point,
};
use crate::model::{Annotation, Label, Shape, ShapeKind};

use super::render::{self, Paint, Primitive, RenderState, Stroke, TextAlign};
use super::{DragContext, DrawOutcome, HitType, ShapeEditor, expect_kind};

/// Construction progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ObbStep {
    #[default]
    Idle,
    /// First point placed; `p2` follows the pointer
    EdgeDrawn { p1: Point, p2: Point },
    /// Edge fixed; `p3` follows the pointer
    WidthPending { p1: Point, p2: Point, p3: Point },
}

/// Box whose first edge runs from `p1` to `p2` and whose far edge passes
/// through `p3`.
pub fn obb_from_points(p1: Point, p2: Point, p3: Point) -> OrientedRect {
    let edge = p2 - p1;
    let len = p1.distance_to(p2);
    if len == 0.0 {
        return OrientedRect::new(p1.x, p1.y, 0.0, 0.0, 0.0);
    }
    let angle = edge.y.atan2(edge.x);
    let perp = Point::new(-edge.y / len, edge.x / len);

    let v3 = p3 - p1;
    let width = v3.x * perp.x + v3.y * perp.y;
    let center = p1.midpoint(p2) + perp * (width / 2.0);

    OrientedRect::new(center.x, center.y, len, width.abs(), angle)
}

/// Draws and edits [`Shape::Obb`].
#[derive(Debug, Clone)]
pub struct ObbEditor {
    handle_size: f64,
    min_edge: f64,
    min_size: f64,
    center_handle_radius: f64,
    rotate_step: f64,
    step: ObbStep,
    label: Option<Label>,
}

impl ObbEditor {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            handle_size: config.handle_size,
            min_edge: config.obb_min_edge,
            min_size: config.obb_min_size,
            center_handle_radius: config.obb_center_handle_radius,
            rotate_step: config.rotate_step_degrees.to_radians(),
            step: ObbStep::Idle,
            label: None,
        }
    }

    pub fn step(&self) -> ObbStep {
        self.step
    }

    fn reset(&mut self) {
        self.step = ObbStep::Idle;
        self.label = None;
    }

    /// Reject boxes with a side under the minimum size.
    pub fn check_size(&self, obb: &OrientedRect) -> Result<(), Rejection> {
        if obb.w < self.min_size || obb.h < self.min_size {
            return Err(Rejection::BoxTooSmall {
                width: obb.w,
                height: obb.h,
                min: self.min_size,
            });
        }
        Ok(())
    }

    fn finalize(&mut self, p1: Point, p2: Point, p3: Point) -> DrawOutcome {
        let label = self.label.take();
        self.reset();
        let Some(label) = label else {
            return DrawOutcome::Pending;
        };

        let obb = obb_from_points(p1, p2, p3);
        if let Err(rejection) = self.check_size(&obb) {
            log::debug!("OBB: {:.1}x{:.1} box discarded", obb.w, obb.h);
            return DrawOutcome::Rejected(rejection);
        }

        log::info!(
            "OBB: committed {:.1}x{:.1} at ({:.1}, {:.1}), {:.1}° as '{}'",
            obb.w,
            obb.h,
            obb.x,
            obb.y,
            obb.rotation.to_degrees(),
            label.name
        );
        DrawOutcome::committed(Annotation::new(Shape::Obb(obb), &label))
    }

    /// Rotate by one step: clockwise on scroll down, counter-clockwise on
    /// scroll up.
    pub fn rotate_by_wheel(&self, shape: &mut Shape, delta_y: f64) -> Result<(), EditorError> {
        expect_kind(ShapeKind::Obb, shape)?;
        if let Shape::Obb(obb) = shape {
            let step = if delta_y > 0.0 {
                self.rotate_step
            } else {
                -self.rotate_step
            };
            obb.rotation = normalize_angle(obb.rotation + step);
            log::trace!("OBB: rotated to {:.1}°", obb.rotation.to_degrees());
        }
        Ok(())
    }

    /// Centre disc with a direction arrow; shows the angle when hovered.
    fn center_indicator(&self, obb: &OrientedRect, outline: &Paint, hovered: bool, zoom: f64) -> Vec<Primitive> {
        let r = self.center_handle_radius / zoom;
        let center = obb.center();
        let tip = rotate_point(
            Point::new(obb.x + obb.w / 2.0 * 0.8, obb.y),
            center,
            obb.rotation,
        );
        let disc = if hovered {
            Paint::white()
        } else {
            Paint::new(style::YELLOW.into(), 0.8)
        };

        let mut out = vec![
            Primitive::Circle {
                center,
                radius: r,
                fill: Some(disc),
                stroke: Some(Stroke::new(outline.clone(), style::PREVIEW_STROKE_WIDTH / zoom)),
            },
            Primitive::Arrow {
                from: center,
                to: tip,
                head: r,
                stroke: Stroke::new(Paint::new(style::RED.into(), 0.8), 2.0 / zoom),
            },
        ];
        if hovered {
            out.push(render::label_text(
                format!("{:.1}°", obb.rotation.to_degrees()),
                Point::new(obb.x + 15.0 / zoom, obb.y),
                TextAlign::Left,
                zoom,
            ));
        }
        out
    }
}

impl Default for ObbEditor {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl ShapeEditor for ObbEditor {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Obb
    }

    fn is_drawing(&self) -> bool {
        self.step != ObbStep::Idle
    }

    fn start_drawing(&mut self, at: Point, label: &Label, image: ImageSize) -> DrawOutcome {
        let p = clamp_point_to_image(at, image);
        match self.step {
            ObbStep::Idle => {
                self.label = Some(label.clone());
                self.step = ObbStep::EdgeDrawn { p1: p, p2: p };
                log::debug!("OBB: first point at {}", p);
                DrawOutcome::Pending
            }
            ObbStep::EdgeDrawn { .. } => DrawOutcome::Pending,
            ObbStep::WidthPending { p1, p2, .. } => self.finalize(p1, p2, p),
        }
    }

    fn update_drawing(&mut self, at: Point) {
        match &mut self.step {
            ObbStep::Idle => {}
            ObbStep::EdgeDrawn { p2, .. } => *p2 = at,
            ObbStep::WidthPending { p3, .. } => *p3 = at,
        }
    }

    fn release(&mut self, at: Point, _image: ImageSize) -> DrawOutcome {
        if let ObbStep::EdgeDrawn { p1, .. } = self.step {
            let len = p1.distance_to(at);
            if len < self.min_edge {
                self.step = ObbStep::EdgeDrawn { p1, p2: at };
                log::trace!("OBB: edge of {:.1} px too short, still drawing", len);
            } else {
                self.step = ObbStep::WidthPending { p1, p2: at, p3: at };
                log::debug!("OBB: edge fixed, {:.1} px", len);
            }
        }
        DrawOutcome::Pending
    }

    fn cancel(&mut self) {
        if self.is_drawing() {
            log::debug!("OBB: drawing cancelled");
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
        expect_kind(ShapeKind::Obb, shape)?;
        let Shape::Obb(obb) = shape else {
            return Ok(None);
        };

        let rotate_radius = self.center_handle_radius * 1.5 / zoom;
        if at.distance_sq(obb.center()) < rotate_radius * rotate_radius {
            return Ok(Some(HitType::Rotate));
        }

        if let Some((handle, _)) = obb_handle_rects(obb, self.handle_size / zoom)
            .into_iter()
            .find(|(_, r)| point_in_rect(at, r))
        {
            return Ok(Some(HitType::Resize(handle)));
        }

        Ok((!handles_only && obb.contains(at)).then_some(HitType::Move))
    }

    fn update_drag(
        &self,
        drag: &DragContext,
        at: Point,
        _image: ImageSize,
        shape: &mut Shape,
    ) -> Result<(), EditorError> {
        expect_kind(ShapeKind::Obb, shape)?;
        expect_kind(ShapeKind::Obb, &drag.original)?;
        let (Shape::Obb(original), Shape::Obb(target)) = (&drag.original, shape) else {
            return Ok(());
        };

        match drag.hit {
            HitType::Move => {
                let delta = drag.delta(at);
                target.x = original.x + delta.x;
                target.y = original.y + delta.y;
            }
            HitType::Resize(handle) => {
                let center = original.center();
                let local = rotate_point(at, center, -original.rotation) - center;

                let (hw, hh) = (original.w / 2.0, original.h / 2.0);
                let (mut left, mut top, mut right, mut bottom) = (-hw, -hh, hw, hh);
                let (moves_left, moves_top, moves_right, moves_bottom) = handle.edges();
                if moves_left {
                    left = local.x;
                }
                if moves_right {
                    right = local.x;
                }
                if moves_top {
                    top = local.y;
                }
                if moves_bottom {
                    bottom = local.y;
                }
                if left > right {
                    std::mem::swap(&mut left, &mut right);
                }
                if top > bottom {
                    std::mem::swap(&mut top, &mut bottom);
                }

                let local_center = Point::new((left + right) / 2.0, (top + bottom) / 2.0);
                let new_center = rotate_point(center + local_center, center, original.rotation);
                target.x = new_center.x;
                target.y = new_center.y;
                target.w = (right - left).max(1.0);
                target.h = (bottom - top).max(1.0);
            }
            // Rotation is wheel-driven
            HitType::Rotate | HitType::Vertex(_) => {}
        }
        Ok(())
    }

    fn render(&self, annotation: &Annotation, state: &RenderState, zoom: f64) -> Vec<Primitive> {
        let Shape::Obb(obb) = &annotation.shape else {
            return Vec::new();
        };
        let color = annotation.color.clone();
        let outline = Paint::solid(color.clone());

        let mut out = vec![
            Primitive::OrientedRect {
                obb: *obb,
                fill: Some(Paint::new(color.clone(), if state.selected { 0.4 } else { 0.2 })),
                stroke: Some(Stroke::new(outline.clone(), state.stroke_width(zoom))),
            },
            render::label_text(
                annotation.label.clone(),
                Point::new(obb.x, obb.y - obb.h / 2.0 - 8.0 / zoom),
                TextAlign::Center,
                zoom,
            ),
        ];

        if state.edit_mode && (state.selected || state.hovered) {
            let center_hovered = state.hovered_hit == Some(HitType::Rotate);
            out.extend(self.center_indicator(obb, &outline, center_hovered, zoom));

            for (handle, r) in obb_handle_rects(obb, self.handle_size / zoom) {
                let fill = if state.hovered_hit == Some(HitType::Resize(handle)) {
                    Paint::white()
                } else {
                    Paint::new(color.clone(), 0.9)
                };
                out.push(render::handle_square(r, fill, zoom));
            }
        }
        out
    }

    fn preview(&self, zoom: f64) -> Vec<Primitive> {
        let Some(label) = &self.label else {
            return Vec::new();
        };
        let color = label.color.clone();
        let stroke = Stroke::new(Paint::solid(color.clone()), style::PREVIEW_STROKE_WIDTH / zoom);

        match self.step {
            ObbStep::Idle => Vec::new(),
            ObbStep::EdgeDrawn { p1, p2 } => vec![
                Primitive::Arrow {
                    from: p1,
                    to: p2,
                    head: 15.0 / zoom,
                    stroke,
                },
                Primitive::Text {
                    text: "Edge 1".to_string(),
                    at: p1.midpoint(p2),
                    size: 12.0 / zoom,
                    align: TextAlign::Left,
                    fill: Paint::solid(color),
                    halo: None,
                },
            ],
            ObbStep::WidthPending { p1, p2, p3 } => {
                let obb = obb_from_points(p1, p2, p3);
                let mut out = vec![Primitive::OrientedRect {
                    obb,
                    fill: Some(Paint::new(color.clone(), 0.2)),
                    stroke: Some(stroke.clone()),
                }];
                out.extend(self.center_indicator(&obb, &stroke.paint, false, zoom));
                out
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::geometry::Handle;

    const EPSILON: f64 = 1e-9;
    const FULL_TURN: f64 = 2.0 * PI;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn sign() -> Label {
        Label::parse("sign", "#0000ff").unwrap()
    }

    fn image() -> ImageSize {
        ImageSize::new(500.0, 500.0)
    }

    fn committed_obb(outcome: DrawOutcome) -> OrientedRect {
        match outcome {
            DrawOutcome::Committed { annotation, .. } => *annotation.shape.as_obb().unwrap(),
            other => panic!("expected a commit, got {:?}", other),
        }
    }

    fn build(editor: &mut ObbEditor, p1: Point, p2: Point, p3: Point) -> DrawOutcome {
        editor.start_drawing(p1, &sign(), image());
        editor.update_drawing(p2);
        editor.release(p2, image());
        editor.update_drawing(p3);
        editor.start_drawing(p3, &sign(), image())
    }

    fn drag(original: OrientedRect, hit: HitType, from: Point, to: Point) -> OrientedRect {
        let editor = ObbEditor::default();
        let mut shape = Shape::Obb(original);
        let ctx = DragContext::new(0, hit, from, shape.clone());
        editor.update_drag(&ctx, to, image(), &mut shape).unwrap();
        *shape.as_obb().unwrap()
    }

    #[test]
    fn test_three_click_construction() {
        let mut editor = ObbEditor::default();
        let obb = committed_obb(build(
            &mut editor,
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(50.0, 20.0),
        ));
        assert_eq!(obb, OrientedRect::new(50.0, 10.0, 100.0, 20.0, 0.0));
        assert_eq!(editor.step(), ObbStep::Idle);
    }

    #[test]
    fn test_rotation_follows_first_edge() {
        let mut editor = ObbEditor::default();
        let obb = committed_obb(build(
            &mut editor,
            Point::new(100.0, 100.0),
            Point::new(100.0, 200.0),
            Point::new(70.0, 150.0),
        ));
        assert!(approx_eq(obb.rotation, PI / 2.0));
        assert!(approx_eq(obb.w, 100.0));
        assert!(approx_eq(obb.h, 30.0));
        assert!(approx_eq(obb.x, 85.0));
        assert!(approx_eq(obb.y, 150.0));
    }

    #[test]
    fn test_short_edge_keeps_drawing() {
        let mut editor = ObbEditor::default();
        editor.start_drawing(Point::new(10.0, 10.0), &sign(), image());
        editor.release(Point::new(12.0, 11.0), image());
        assert!(matches!(editor.step(), ObbStep::EdgeDrawn { .. }));

        editor.update_drawing(Point::new(40.0, 10.0));
        editor.release(Point::new(40.0, 10.0), image());
        assert!(matches!(editor.step(), ObbStep::WidthPending { .. }));
    }

    #[test]
    fn test_flat_box_rejected() {
        let mut editor = ObbEditor::default();
        let outcome = build(
            &mut editor,
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(50.0, 1.0),
        );
        assert!(matches!(outcome, DrawOutcome::Rejected(Rejection::BoxTooSmall { .. })));
        assert!(!editor.is_drawing());
    }

    #[test]
    fn test_cancel_and_secondary_action_reset() {
        let mut editor = ObbEditor::default();
        editor.start_drawing(Point::new(0.0, 0.0), &sign(), image());
        editor.release(Point::new(50.0, 0.0), image());
        assert_eq!(editor.secondary_action(image()), DrawOutcome::Pending);
        assert_eq!(editor.step(), ObbStep::Idle);
        assert!(editor.preview(1.0).is_empty());
    }

    #[test]
    fn test_hit_test_order() {
        let editor = ObbEditor::default();
        let shape = Shape::Obb(OrientedRect::new(100.0, 100.0, 40.0, 20.0, 0.0));
        let hit = |x, y| editor.hit_test(&shape, Point::new(x, y), 1.0, false).unwrap();
        assert_eq!(hit(100.0, 100.0), Some(HitType::Rotate));
        assert_eq!(hit(81.0, 91.0), Some(HitType::Resize(Handle::TopLeft)));
        assert_eq!(hit(108.0, 108.0), Some(HitType::Move));
        assert_eq!(hit(200.0, 200.0), None);
    }

    #[test]
    fn test_rotated_box_still_contains_center() {
        let editor = ObbEditor::default();
        let shape = Shape::Obb(OrientedRect::new(100.0, 100.0, 40.0, 20.0, PI / 2.0));
        assert!(shape.contains(Point::new(100.0, 100.0)));
        // Long side now runs vertically
        let hit = editor.hit_test(&shape, Point::new(100.0, 114.0), 2.0, false).unwrap();
        assert_eq!(hit, Some(HitType::Move));
        let miss = editor.hit_test(&shape, Point::new(116.0, 100.0), 2.0, false).unwrap();
        assert_eq!(miss, None);
    }

    #[test]
    fn test_wheel_rotation_wraps() {
        let editor = ObbEditor::default();
        let mut shape = Shape::Obb(OrientedRect::new(0.0, 0.0, 10.0, 10.0, PI - 0.01));
        editor.rotate_by_wheel(&mut shape, 1.0).unwrap();
        let r = shape.as_obb().unwrap().rotation;
        assert!(r > -PI && r < 0.0);
        assert!(approx_eq(r, PI - 0.01 + 5f64.to_radians() - FULL_TURN));

        editor.rotate_by_wheel(&mut shape, -1.0).unwrap();
        assert!(approx_eq(shape.as_obb().unwrap().rotation, PI - 0.01));
    }

    #[test]
    fn test_move_is_not_clamped() {
        let moved = drag(
            OrientedRect::new(10.0, 10.0, 20.0, 10.0, 0.3),
            HitType::Move,
            Point::new(10.0, 10.0),
            Point::new(-40.0, 15.0),
        );
        assert!(approx_eq(moved.x, -40.0));
        assert!(approx_eq(moved.y, 15.0));
        assert!(approx_eq(moved.rotation, 0.3));
    }

    #[test]
    fn test_resize_right_edge_unrotated() {
        let r = drag(
            OrientedRect::new(100.0, 100.0, 40.0, 20.0, 0.0),
            HitType::Resize(Handle::BottomRight),
            Point::new(120.0, 110.0),
            Point::new(140.0, 120.0),
        );
        assert!(approx_eq(r.w, 60.0));
        assert!(approx_eq(r.h, 30.0));
        assert!(approx_eq(r.x, 110.0));
        assert!(approx_eq(r.y, 105.0));
    }

    #[test]
    fn test_resize_in_local_frame() {
        // Rotated a quarter turn: local +x points down the image
        let r = drag(
            OrientedRect::new(100.0, 100.0, 40.0, 20.0, PI / 2.0),
            HitType::Resize(Handle::BottomRight),
            Point::new(90.0, 120.0),
            Point::new(90.0, 130.0),
        );
        assert!(approx_eq(r.w, 50.0));
        assert!(approx_eq(r.h, 20.0));
        assert!(approx_eq(r.x, 100.0));
        assert!(approx_eq(r.y, 105.0));
    }

    #[test]
    fn test_resize_past_opposite_edge_swaps() {
        let r = drag(
            OrientedRect::new(100.0, 100.0, 40.0, 20.0, 0.0),
            HitType::Resize(Handle::BottomRight),
            Point::new(120.0, 110.0),
            Point::new(70.0, 110.0),
        );
        // Right edge moved to x=70, left stays at x=80
        assert!(approx_eq(r.w, 10.0));
        assert!(approx_eq(r.x, 75.0));
    }

    #[test]
    fn test_rotate_handle_drag_keeps_geometry() {
        let base = OrientedRect::new(100.0, 100.0, 40.0, 20.0, 0.5);
        let r = drag(base, HitType::Rotate, Point::new(100.0, 100.0), Point::new(150.0, 150.0));
        assert_eq!(r, base);
    }

    #[test]
    fn test_preview_steps() {
        let mut editor = ObbEditor::default();
        editor.start_drawing(Point::new(0.0, 0.0), &sign(), image());
        editor.update_drawing(Point::new(60.0, 0.0));
        let edge = editor.preview(1.0);
        assert!(matches!(edge[0], Primitive::Arrow { .. }));

        editor.release(Point::new(60.0, 0.0), image());
        editor.update_drawing(Point::new(30.0, 20.0));
        let candidate = editor.preview(1.0);
        let Primitive::OrientedRect { obb, .. } = &candidate[0] else {
            panic!("expected the candidate box first");
        };
        assert!(approx_eq(obb.h, 20.0));
    }
}
