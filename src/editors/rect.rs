//! Axis-aligned rectangle editor: one press-drag-release per box.

use crate::config::EditorConfig;
use crate::error::{EditorError, Rejection};
use crate::geometry::{
    Handle, ImageSize, Point, Rect, clamp_rect_to_image, handle_rects, point_in_rect,
};
use crate::model::{Annotation, Label, Shape, ShapeKind};

use super::render::{self, Paint, Primitive, RenderState, Stroke, TextAlign};
use super::{DragContext, DrawOutcome, HitType, ShapeEditor, expect_kind};
use crate::constants::render as style;

/// Draws and edits [`Shape::Rect`].
#[derive(Debug, Clone)]
pub struct RectEditor {
    min_drag_distance: f64,
    handle_size: f64,
    /// Press position of the box being drawn
    start: Option<Point>,
    /// Latest pointer position while drawing
    current: Option<Point>,
    label: Option<Label>,
    /// Image the box is being drawn on, for the preview clamp
    image: Option<ImageSize>,
}

impl RectEditor {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            min_drag_distance: config.min_drag_distance,
            handle_size: config.handle_size,
            start: None,
            current: None,
            label: None,
            image: None,
        }
    }

    fn reset(&mut self) {
        self.start = None;
        self.current = None;
        self.label = None;
        self.image = None;
    }
}

impl Default for RectEditor {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

/// Move or resize `original` by `delta` according to `hit`, keeping it
/// inside the image.
///
/// A resize past the opposite edge flips the box. Returns `None` when the
/// result collapses to zero size.
pub(crate) fn drag_rect(original: Rect, hit: HitType, delta: Point, image: ImageSize) -> Option<Rect> {
    let Rect { x, y, w, h } = original;
    let (dx, dy) = (delta.x, delta.y);

    let moved = match hit {
        HitType::Move => Rect::new(
            (x + dx).min(image.width - w).max(0.0),
            (y + dy).min(image.height - h).max(0.0),
            w,
            h,
        ),
        HitType::Resize(handle) => {
            let (left, top, right, bottom) = handle.edges();
            let mut r = original;
            if left {
                r.x += dx;
                r.w -= dx;
            }
            if right {
                r.w += dx;
            }
            if top {
                r.y += dy;
                r.h -= dy;
            }
            if bottom {
                r.h += dy;
            }
            // Flip inverted boxes
            if r.w < 0.0 {
                r.x += r.w;
                r.w = -r.w;
            }
            if r.h < 0.0 {
                r.y += r.h;
                r.h = -r.h;
            }
            r
        }
        HitType::Vertex(_) | HitType::Rotate => return None,
    };

    let clamped = clamp_rect_to_image(moved, image);
    clamped.is_valid().then_some(clamped)
}

impl ShapeEditor for RectEditor {
    fn kind(&self) -> ShapeKind {
        ShapeKind::Rect
    }

    fn is_drawing(&self) -> bool {
        self.start.is_some()
    }

    fn start_drawing(&mut self, at: Point, label: &Label, image: ImageSize) -> DrawOutcome {
        self.start = Some(at);
        self.current = Some(at);
        self.label = Some(label.clone());
        self.image = Some(image);
        log::debug!("Rect: drawing started at {}", at);
        DrawOutcome::Pending
    }

    fn update_drawing(&mut self, at: Point) {
        if self.start.is_some() {
            self.current = Some(at);
        }
    }

    fn release(&mut self, at: Point, image: ImageSize) -> DrawOutcome {
        let (Some(start), Some(label)) = (self.start, self.label.clone()) else {
            self.reset();
            return DrawOutcome::Pending;
        };
        self.reset();

        let raw = Rect::from_corners(start, at);
        if raw.w < self.min_drag_distance && raw.h < self.min_drag_distance {
            return DrawOutcome::Rejected(Rejection::DragTooShort {
                width: raw.w,
                height: raw.h,
                min: self.min_drag_distance,
            });
        }

        let rect = clamp_rect_to_image(raw, image);
        if !rect.is_valid() {
            return DrawOutcome::Rejected(Rejection::OutsideImage);
        }

        log::info!(
            "Rect: committed {:.1}x{:.1} at ({:.1}, {:.1}) as '{}'",
            rect.w,
            rect.h,
            rect.x,
            rect.y,
            label.name
        );
        DrawOutcome::committed(Annotation::new(Shape::Rect(rect), &label))
    }

    fn cancel(&mut self) {
        if self.is_drawing() {
            log::debug!("Rect: drawing cancelled");
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
        expect_kind(ShapeKind::Rect, shape)?;
        let Shape::Rect(rect) = shape else {
            return Ok(None);
        };

        let handle = handle_at(rect, at, self.handle_size / zoom).map(HitType::Resize);
        Ok(handle.or_else(|| (!handles_only && rect.contains(at)).then_some(HitType::Move)))
    }

    fn update_drag(
        &self,
        drag: &DragContext,
        at: Point,
        image: ImageSize,
        shape: &mut Shape,
    ) -> Result<(), EditorError> {
        expect_kind(ShapeKind::Rect, shape)?;
        expect_kind(ShapeKind::Rect, &drag.original)?;
        let (Shape::Rect(original), Shape::Rect(target)) = (&drag.original, shape) else {
            return Ok(());
        };

        match drag_rect(*original, drag.hit, drag.delta(at), image) {
            Some(rect) => *target = rect,
            None => log::trace!("Rect: {} drag would collapse the box, ignored", drag.hit),
        }
        Ok(())
    }

    fn render(&self, annotation: &Annotation, state: &RenderState, zoom: f64) -> Vec<Primitive> {
        let Shape::Rect(rect) = &annotation.shape else {
            return Vec::new();
        };
        let color = annotation.color.clone();

        let mut out = vec![
            Primitive::Rect {
                rect: *rect,
                fill: Some(Paint::new(color.clone(), style::FILL_ALPHA)),
                stroke: Some(Stroke::new(Paint::solid(color.clone()), state.stroke_width(zoom))),
            },
            render::label_text(
                annotation.label.clone(),
                Point::new(rect.x, rect.y - style::LABEL_OFFSET_SCREEN / zoom),
                TextAlign::Left,
                zoom,
            ),
        ];

        if state.shows_handles() {
            for (handle, r) in handle_rects(rect, self.handle_size / zoom) {
                let alpha = if state.dragging {
                    style::HANDLE_DRAG_ALPHA
                } else if state.hovered_hit == Some(HitType::Resize(handle)) {
                    style::HANDLE_HOVER_ALPHA
                } else {
                    style::HANDLE_ALPHA
                };
                out.push(Primitive::Rect {
                    rect: r,
                    fill: Some(Paint::new(color.clone(), alpha)),
                    stroke: None,
                });
            }
        }
        out
    }

    fn preview(&self, zoom: f64) -> Vec<Primitive> {
        let (Some(start), Some(current), Some(label)) = (self.start, self.current, &self.label) else {
            return Vec::new();
        };
        let mut rect = Rect::from_corners(start, current);
        if let Some(image) = self.image {
            rect = clamp_rect_to_image(rect, image);
        }
        vec![Primitive::Rect {
            rect,
            fill: None,
            stroke: Some(
                Stroke::new(
                    Paint::solid(label.color.clone()),
                    style::PREVIEW_STROKE_WIDTH / zoom,
                )
                .dashed(4.0, 2.0),
            ),
        }]
    }
}

/// Handle under `at` on a rectangle, if any.
pub(crate) fn handle_at(rect: &Rect, at: Point, size: f64) -> Option<Handle> {
    handle_rects(rect, size)
        .into_iter()
        .find(|(_, r)| point_in_rect(at, r))
        .map(|(handle, _)| handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car() -> Label {
        Label::parse("car", "#ff0000").unwrap()
    }

    fn image() -> ImageSize {
        ImageSize::new(500.0, 500.0)
    }

    fn draw(editor: &mut RectEditor, from: Point, to: Point) -> DrawOutcome {
        editor.start_drawing(from, &car(), image());
        editor.update_drawing(to);
        editor.release(to, image())
    }

    fn committed_rect(outcome: DrawOutcome) -> Rect {
        match outcome {
            DrawOutcome::Committed { annotation, .. } => *annotation.shape.as_rect().unwrap(),
            other => panic!("expected a commit, got {:?}", other),
        }
    }

    fn drag(original: Rect, hit: HitType, from: Point, to: Point) -> Rect {
        let editor = RectEditor::default();
        let mut shape = Shape::Rect(original);
        let ctx = DragContext::new(0, hit, from, shape.clone());
        editor.update_drag(&ctx, to, image(), &mut shape).unwrap();
        *shape.as_rect().unwrap()
    }

    #[test]
    fn test_drag_creates_rect() {
        let mut editor = RectEditor::default();
        let rect = committed_rect(draw(&mut editor, Point::new(10.0, 10.0), Point::new(60.0, 40.0)));
        assert_eq!(rect, Rect::new(10.0, 10.0, 50.0, 30.0));
        assert!(!editor.is_drawing());
    }

    #[test]
    fn test_reverse_drag_is_normalized() {
        let mut editor = RectEditor::default();
        let rect = committed_rect(draw(&mut editor, Point::new(60.0, 40.0), Point::new(10.0, 10.0)));
        assert_eq!(rect, Rect::new(10.0, 10.0, 50.0, 30.0));
    }

    #[test]
    fn test_short_drag_rejected() {
        let mut editor = RectEditor::default();
        let outcome = draw(&mut editor, Point::new(10.0, 10.0), Point::new(13.0, 14.0));
        assert!(matches!(outcome, DrawOutcome::Rejected(Rejection::DragTooShort { .. })));
    }

    #[test]
    fn test_thin_but_long_drag_is_kept() {
        let mut editor = RectEditor::default();
        let rect = committed_rect(draw(&mut editor, Point::new(10.0, 10.0), Point::new(60.0, 12.0)));
        assert_eq!(rect.h, 2.0);
    }

    #[test]
    fn test_drag_outside_image_rejected() {
        let mut editor = RectEditor::default();
        let outcome = draw(&mut editor, Point::new(600.0, 600.0), Point::new(700.0, 700.0));
        assert_eq!(outcome, DrawOutcome::Rejected(Rejection::OutsideImage));
    }

    #[test]
    fn test_drag_is_clamped() {
        let mut editor = RectEditor::default();
        let rect = committed_rect(draw(&mut editor, Point::new(-20.0, 480.0), Point::new(30.0, 520.0)));
        assert_eq!(rect, Rect::new(0.0, 480.0, 30.0, 20.0));
    }

    #[test]
    fn test_hit_test_handles_before_body() {
        let editor = RectEditor::default();
        let shape = Shape::Rect(Rect::new(100.0, 100.0, 200.0, 100.0));
        let hit = |x, y, zoom, only| editor.hit_test(&shape, Point::new(x, y), zoom, only).unwrap();

        assert_eq!(hit(101.0, 101.0, 1.0, false), Some(HitType::Resize(Handle::TopLeft)));
        assert_eq!(hit(200.0, 199.0, 1.0, false), Some(HitType::Resize(Handle::Bottom)));
        assert_eq!(hit(150.0, 150.0, 1.0, false), Some(HitType::Move));
        assert_eq!(hit(150.0, 150.0, 1.0, true), None);
        assert_eq!(hit(50.0, 50.0, 1.0, false), None);
        // Handles shrink in image space as zoom grows.
        assert_eq!(hit(108.0, 108.0, 1.0, false), Some(HitType::Resize(Handle::TopLeft)));
        assert_eq!(hit(108.0, 108.0, 4.0, false), Some(HitType::Move));
    }

    #[test]
    fn test_move_is_clamped_to_image() {
        let moved = drag(
            Rect::new(0.0, 0.0, 50.0, 50.0),
            HitType::Move,
            Point::new(25.0, 25.0),
            Point::new(-975.0, 25.0),
        );
        assert_eq!(moved.x, 0.0);
        assert_eq!(moved.w, 50.0);

        let moved = drag(
            Rect::new(100.0, 100.0, 50.0, 50.0),
            HitType::Move,
            Point::new(0.0, 0.0),
            Point::new(1000.0, 10.0),
        );
        assert_eq!(moved, Rect::new(450.0, 110.0, 50.0, 50.0));
    }

    #[test]
    fn test_resize_handles_move_their_edges() {
        let base = Rect::new(100.0, 100.0, 100.0, 100.0);
        let o = Point::new(0.0, 0.0);
        let d = Point::new(10.0, 20.0);
        let cases = [
            (Handle::TopLeft, Rect::new(110.0, 120.0, 90.0, 80.0)),
            (Handle::TopRight, Rect::new(100.0, 120.0, 110.0, 80.0)),
            (Handle::BottomRight, Rect::new(100.0, 100.0, 110.0, 120.0)),
            (Handle::BottomLeft, Rect::new(110.0, 100.0, 90.0, 120.0)),
            (Handle::Top, Rect::new(100.0, 120.0, 100.0, 80.0)),
            (Handle::Right, Rect::new(100.0, 100.0, 110.0, 100.0)),
            (Handle::Bottom, Rect::new(100.0, 100.0, 100.0, 120.0)),
            (Handle::Left, Rect::new(110.0, 100.0, 90.0, 100.0)),
        ];
        for (handle, expected) in cases {
            assert_eq!(drag(base, HitType::Resize(handle), o, d), expected, "{handle}");
        }
    }

    #[test]
    fn test_resize_past_opposite_edge_flips() {
        let r = drag(
            Rect::new(100.0, 100.0, 50.0, 50.0),
            HitType::Resize(Handle::Right),
            Point::new(150.0, 125.0),
            Point::new(80.0, 125.0),
        );
        assert_eq!(r, Rect::new(80.0, 100.0, 20.0, 50.0));
    }

    #[test]
    fn test_collapsing_resize_keeps_previous_geometry() {
        let base = Rect::new(100.0, 100.0, 50.0, 50.0);
        let r = drag(
            base,
            HitType::Resize(Handle::Right),
            Point::new(150.0, 125.0),
            Point::new(100.0, 125.0),
        );
        assert_eq!(r, base);
    }

    #[test]
    fn test_render_handles_only_when_editing() {
        let editor = RectEditor::default();
        let ann = Annotation::new(Shape::Rect(Rect::new(0.0, 10.0, 20.0, 20.0)), &car());
        let plain = editor.render(&ann, &RenderState::default(), 1.0);
        assert_eq!(plain.len(), 2);

        let editing = RenderState {
            selected: true,
            edit_mode: true,
            ..Default::default()
        };
        assert_eq!(editor.render(&ann, &editing, 1.0).len(), 10);
    }

    #[test]
    fn test_preview_is_dashed_and_clamped() {
        let mut editor = RectEditor::default();
        assert!(editor.preview(1.0).is_empty());
        editor.start_drawing(Point::new(450.0, 450.0), &car(), image());
        editor.update_drawing(Point::new(600.0, 480.0));
        let prims = editor.preview(2.0);
        let [Primitive::Rect { rect, stroke: Some(stroke), .. }] = prims.as_slice() else {
            panic!("expected one stroked rect");
        };
        assert_eq!(*rect, Rect::new(450.0, 450.0, 50.0, 30.0));
        assert_eq!(stroke.width, 1.0);
        assert_eq!(stroke.dash, Some([4.0, 2.0]));
    }

    #[test]
    fn test_cancel_drops_start_point() {
        let mut editor = RectEditor::default();
        editor.start_drawing(Point::new(1.0, 1.0), &car(), image());
        editor.cancel();
        assert!(!editor.is_drawing());
        assert_eq!(editor.release(Point::new(50.0, 50.0), image()), DrawOutcome::Pending);
    }
}
