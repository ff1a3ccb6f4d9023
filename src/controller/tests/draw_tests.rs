use super::*;
use crate::controller::{Command, ToolMode, Viewport};
use crate::editors::{Cursor, Primitive};
use crate::error::Rejection;
use crate::events::Advisory;
use crate::geometry::{OrientedRect, Rect};

#[test]
fn test_drag_commits_rectangle() {
    let mut h = Harness::rect();
    h.drag((10.0, 10.0), (60.0, 40.0));

    assert_eq!(h.image.len(), 1);
    assert_eq!(*h.shape(0), Shape::Rect(Rect::new(10.0, 10.0, 50.0, 30.0)));
    assert_eq!(h.image.get(0).unwrap().label, "car");
    assert_eq!(h.controller.selected(), Some(0));
    assert_eq!(h.undo_depth(), 1);
    assert!(h.events().contains(&EditorEvent::AnnotationCommitted {
        index: 0,
        kind: ShapeKind::Rect
    }));
}

#[test]
fn test_drag_past_the_border_is_clamped() {
    let mut h = Harness::rect();
    h.drag((450.0, 450.0), (600.0, 700.0));
    assert_eq!(*h.shape(0), Shape::Rect(Rect::new(450.0, 450.0, 50.0, 50.0)));
}

#[test]
fn test_short_drag_is_rejected() {
    let mut h = Harness::rect();
    h.drag((10.0, 10.0), (12.0, 13.0));

    assert!(h.image.is_empty());
    assert_eq!(h.undo_depth(), 0);
    assert!(h.events().iter().any(|e| matches!(
        e,
        EditorEvent::Advisory(Advisory::Rejected(Rejection::DragTooShort { .. }))
    )));
}

#[test]
fn test_drawing_without_label_advises() {
    let mut h = Harness::rect();
    h.label = None;
    h.press(10.0, 10.0);

    assert!(!h.controller.editors().get(ShapeKind::Rect).is_drawing());
    assert_eq!(h.events(), vec![EditorEvent::Advisory(Advisory::NoLabel)]);
}

#[test]
fn test_polygon_closed_by_secondary_click() {
    let mut h = Harness::new(ShapeKind::Polygon);
    for (x, y) in [(100.0, 100.0), (200.0, 100.0), (200.0, 200.0), (100.0, 200.0)] {
        h.click(x, y);
    }
    assert!(h.image.is_empty());

    h.right_click(150.0, 150.0);
    let points = h.shape(0).as_polygon().unwrap();
    assert_eq!(points.len(), 4);
    assert!(h.shape(0).selection_area() > 0.0);
    // Closing must not have started a pan
    assert!(!h.controller.state().pan.is_panning);
}

#[test]
fn test_polygon_finished_with_enter() {
    let mut h = Harness::new(ShapeKind::Polygon);
    for (x, y) in [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (5.0, 5.0)] {
        h.click(x, y);
    }
    let outcome = h.key(Key::Enter);

    assert!(matches!(outcome, KeyOutcome::Handled(_)));
    assert_eq!(h.image.len(), 1);
    assert!(h.shape(0).selection_area() > 0.0);
}

#[test]
fn test_oriented_box_three_clicks() {
    let mut h = Harness::new(ShapeKind::Obb);
    h.press(100.0, 100.0);
    h.move_to(200.0, 100.0);
    h.release(200.0, 100.0);
    assert!(h.image.is_empty());

    h.move_to(150.0, 120.0);
    h.press(150.0, 120.0);

    let obb = *h.shape(0).as_obb().unwrap();
    let expected = OrientedRect::new(150.0, 110.0, 100.0, 20.0, 0.0);
    assert!(approx_eq(obb.x, expected.x));
    assert!(approx_eq(obb.y, expected.y));
    assert!(approx_eq(obb.w, expected.w));
    assert!(approx_eq(obb.h, expected.h));
    assert!(approx_eq(obb.rotation, expected.rotation));
}

#[test]
fn test_escape_cancels_drawing() {
    let mut h = Harness::new(ShapeKind::Polygon);
    h.click(100.0, 100.0);
    h.click(200.0, 100.0);

    h.key(Key::Escape);
    assert!(!h.controller.editors().get(ShapeKind::Polygon).is_drawing());
    assert!(h.image.is_empty());
}

#[test]
fn test_mode_switch_drops_drawing() {
    let mut h = Harness::new(ShapeKind::Polygon);
    h.click(100.0, 100.0);
    h.clear_events();

    assert_eq!(h.key(Key::Char('q')), KeyOutcome::Handled(Command::SetMode(ToolMode::Edit)));
    assert_eq!(h.controller.mode(), ToolMode::Edit);
    assert!(!h.controller.editors().get(ShapeKind::Polygon).is_drawing());
    assert_eq!(h.events(), vec![EditorEvent::ModeChanged(ToolMode::Edit)]);
}

#[test]
fn test_wheel_zoom_keeps_cursor_point() {
    let mut h = Harness::rect();
    let cursor = Point::new(200.0, 150.0);
    let before = h.controller.viewport().screen_to_image(cursor);

    h.wheel(cursor.x, cursor.y, -1.0);
    h.wheel(cursor.x, cursor.y, -1.0);

    let after = h.controller.viewport().screen_to_image(cursor);
    assert!(approx_eq(h.controller.zoom(), 1.21));
    assert!(approx_eq(before.x, after.x));
    assert!(approx_eq(before.y, after.y));
}

#[test]
fn test_drawing_uses_image_coordinates_when_zoomed() {
    let mut h = Harness::rect();
    h.controller
        .set_viewport(Viewport::new(2.0, Point::new(10.0, 20.0)));
    h.drag((30.0, 40.0), (130.0, 100.0));

    assert_eq!(*h.shape(0), Shape::Rect(Rect::new(10.0, 10.0, 50.0, 30.0)));
}

#[test]
fn test_fit_to_canvas_centres_image() {
    let mut h = Harness::rect();
    h.controller
        .fit_to_canvas(ImageSize::new(1000.0, 500.0), 800.0, 600.0);

    let view = h.controller.viewport();
    assert!(approx_eq(view.zoom, 0.76));
    assert!(approx_eq(view.pan.x, 20.0));
    assert!(approx_eq(view.pan.y, 110.0));
}

#[test]
fn test_crosshair_follows_pointer() {
    let mut h = Harness::rect();
    h.move_to(120.0, 80.0);

    assert_eq!(h.controller.cursor(), Cursor::Crosshair);
    let scene = h.controller.render_scene(&h.image);
    let lines: Vec<_> = scene
        .iter()
        .filter_map(|p| match p {
            Primitive::Path { points, closed: false, .. } => Some(points.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(
        lines,
        vec![
            vec![Point::new(0.0, 80.0), Point::new(500.0, 80.0)],
            vec![Point::new(120.0, 0.0), Point::new(120.0, 500.0)],
        ]
    );

    h.with(|c, ctx| c.pointer_leave(ctx.notifier));
    assert!(h.controller.render_scene(&h.image).is_empty());
}

#[test]
fn test_preview_rendered_while_drawing() {
    let mut h = Harness::rect();
    h.press(10.0, 10.0);
    h.move_to(60.0, 40.0);

    let scene = h.controller.render_scene(&h.image);
    assert!(scene.iter().any(|p| matches!(
        p,
        Primitive::Rect { rect, fill: None, .. } if *rect == Rect::new(10.0, 10.0, 50.0, 30.0)
    )));
}
