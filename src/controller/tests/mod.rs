//! Scenario tests for the interaction controller.
//!
//! Each test drives a controller through screen-space input against a
//! 500x500 image with an identity viewport, so screen and image
//! coordinates coincide unless a test zooms or pans.

mod draw_tests;

use std::cell::RefCell;
use std::rc::Rc;

use super::{EditorContext, InteractionController, Key, KeyOutcome, Modifiers, MouseButton};
use crate::config::EditorConfig;
use crate::events::{EditorEvent, Notifier};
use crate::geometry::{ImageSize, Point};
use crate::model::{Annotation, Label, Shape, ShapeKind};
use crate::store::ImageAnnotations;
use crate::undo::SnapshotHistory;

const IMAGE_NAME: &str = "frame_0001.png";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Controller plus every host collaborator it talks to.
struct Harness {
    controller: InteractionController,
    image: ImageAnnotations,
    history: SnapshotHistory,
    notifier: Notifier,
    label: Option<Label>,
    events: Rc<RefCell<Vec<EditorEvent>>>,
}

impl Harness {
    fn new(kind: ShapeKind) -> Self {
        init_logging();
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut notifier = Notifier::new();
        let sink = Rc::clone(&events);
        notifier.subscribe(move |event| {
            if *event != EditorEvent::Redraw {
                sink.borrow_mut().push(event.clone());
            }
        });

        let config = EditorConfig::default();
        Self {
            history: SnapshotHistory::from_config(&config),
            controller: InteractionController::new(config, kind),
            image: ImageAnnotations::new(IMAGE_NAME, ImageSize::new(500.0, 500.0)),
            notifier,
            label: Some(Label::parse("car", "#ff8800").unwrap()),
            events,
        }
    }

    fn rect() -> Self {
        Self::new(ShapeKind::Rect)
    }

    fn with<R>(
        &mut self,
        f: impl FnOnce(&mut InteractionController, &mut EditorContext<'_>) -> R,
    ) -> R {
        let mut ctx = EditorContext::new(
            &mut self.image,
            self.label.as_ref(),
            &mut self.history,
            &mut self.notifier,
        );
        f(&mut self.controller, &mut ctx)
    }

    fn press_with(&mut self, x: f64, y: f64, button: MouseButton, modifiers: Modifiers) {
        self.with(|c, ctx| c.pointer_down(Point::new(x, y), button, modifiers, ctx));
    }

    fn release_with(&mut self, x: f64, y: f64, button: MouseButton, modifiers: Modifiers) {
        self.with(|c, ctx| c.pointer_up(Point::new(x, y), button, modifiers, ctx));
    }

    fn press(&mut self, x: f64, y: f64) {
        self.press_with(x, y, MouseButton::Left, Modifiers::NONE);
    }

    fn release(&mut self, x: f64, y: f64) {
        self.release_with(x, y, MouseButton::Left, Modifiers::NONE);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.move_with(x, y, Modifiers::NONE);
    }

    fn move_with(&mut self, x: f64, y: f64, modifiers: Modifiers) {
        self.with(|c, ctx| c.pointer_move(Point::new(x, y), modifiers, ctx));
    }

    fn click(&mut self, x: f64, y: f64) {
        self.press(x, y);
        self.release(x, y);
    }

    fn right_click(&mut self, x: f64, y: f64) {
        self.press_with(x, y, MouseButton::Right, Modifiers::NONE);
        self.release_with(x, y, MouseButton::Right, Modifiers::NONE);
    }

    fn drag(&mut self, from: (f64, f64), to: (f64, f64)) {
        self.press(from.0, from.1);
        self.move_to(to.0, to.1);
        self.release(to.0, to.1);
    }

    fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
        self.with(|c, ctx| c.wheel(Point::new(x, y), delta_y, ctx));
    }

    fn key(&mut self, key: Key) -> KeyOutcome {
        self.key_with(key, Modifiers::NONE)
    }

    fn key_with(&mut self, key: Key, modifiers: Modifiers) -> KeyOutcome {
        self.with(|c, ctx| c.key_down(key, modifiers, ctx))
    }

    /// Add an annotation directly, bypassing the editors.
    fn seed(&mut self, shape: Shape) -> usize {
        let label = Label::parse("tree", "#00aa00").unwrap();
        self.image.push(Annotation::new(shape, &label)).unwrap()
    }

    fn shape(&self, index: usize) -> &Shape {
        &self.image.get(index).unwrap().shape
    }

    fn undo_depth(&self) -> usize {
        self.history.depth(IMAGE_NAME)
    }

    fn events(&self) -> Vec<EditorEvent> {
        self.events.borrow().clone()
    }

    fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }
}

const EPSILON: f64 = 1e-6;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}
