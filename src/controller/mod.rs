//! Pointer and keyboard routing.
//!
//! The [`InteractionController`] owns the tool mode, the viewport and the
//! gesture state. It maps screen positions into image space, sends them to
//! the active shape editor or the assist editor, and decides which
//! annotation a click lands on.
//!
//! Collaborators that belong to the host are passed in per call through an
//! [`EditorContext`]: the current image's annotation list, the current
//! label, an undo sink and a notifier.

mod commands;
pub mod input;
pub mod keymap;
pub mod state;
pub mod viewport;

#[cfg(test)]
mod tests;

use std::fmt;

use crate::assist::{
    AssistEditor, AssistState, SegmentationOutcome, SegmentationRequest, SegmentationResponse,
};
use crate::config::EditorConfig;
use crate::constants::{render as style, zoom as zoom_limits};
use crate::editors::{
    Cursor, DragContext, DrawOutcome, EditorRegistry, HitType, Paint, Primitive, RenderState,
    Stroke,
};
use crate::events::{Advisory, EditorEvent, Notifier};
use crate::geometry::{ImageSize, Point};
use crate::model::{Annotation, Label, Shape, ShapeKind};
use crate::store::ImageAnnotations;
use crate::undo::UndoSink;

pub use input::{InputEvent, Key, Modifiers, MouseButton};
pub use keymap::{Command, KeyBindings, KeyOutcome};
pub use state::{Hover, InteractionState, PanState};
pub use viewport::Viewport;

/// What the primary button does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ToolMode {
    /// Draw new shapes of the active kind
    #[default]
    Draw,
    /// Select, move, resize and rotate committed shapes
    Edit,
    /// Place prompts for the segmentation model
    Assist,
}

impl ToolMode {
    pub fn name(&self) -> &'static str {
        match self {
            ToolMode::Draw => "draw",
            ToolMode::Edit => "edit",
            ToolMode::Assist => "assist",
        }
    }

    /// Cursor shown over empty canvas in this mode.
    pub fn idle_cursor(&self) -> Cursor {
        match self {
            ToolMode::Draw | ToolMode::Assist => Cursor::Crosshair,
            ToolMode::Edit => Cursor::Default,
        }
    }
}

impl fmt::Display for ToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Host collaborators for one call.
pub struct EditorContext<'a> {
    /// Annotations of the image being edited
    pub image: &'a mut ImageAnnotations,
    /// Label new shapes and prompts get
    pub label: Option<&'a Label>,
    pub undo: &'a mut dyn UndoSink,
    pub notifier: &'a mut Notifier,
}

impl<'a> EditorContext<'a> {
    pub fn new(
        image: &'a mut ImageAnnotations,
        label: Option<&'a Label>,
        undo: &'a mut dyn UndoSink,
        notifier: &'a mut Notifier,
    ) -> Self {
        Self {
            image,
            label,
            undo,
            notifier,
        }
    }

    /// Snapshot the annotation list before a mutation.
    fn snapshot(&mut self) {
        self.undo.push_snapshot(&*self.image);
    }
}

/// Routes input to editors and keeps gesture state.
#[derive(Debug, Clone)]
pub struct InteractionController {
    config: EditorConfig,
    mode: ToolMode,
    /// Kind drawn in [`ToolMode::Draw`] and produced by segmentation
    shape_kind: ShapeKind,
    editors: EditorRegistry,
    assist: AssistEditor,
    viewport: Viewport,
    state: InteractionState,
    bindings: KeyBindings,
    clipboard: Option<Annotation>,
}

impl InteractionController {
    pub fn new(config: EditorConfig, shape_kind: ShapeKind) -> Self {
        Self {
            editors: EditorRegistry::new(&config),
            assist: AssistEditor::new(&config),
            config,
            mode: ToolMode::Draw,
            shape_kind,
            viewport: Viewport::identity(),
            state: InteractionState::new(),
            bindings: KeyBindings::new(),
            clipboard: None,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    pub fn shape_kind(&self) -> ShapeKind {
        self.shape_kind
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn zoom(&self) -> f64 {
        self.viewport.zoom
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Replace the gesture state, e.g. to restore a saved one.
    pub fn restore_state(&mut self, state: InteractionState) {
        self.state = state;
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.selected
    }

    pub fn cursor(&self) -> Cursor {
        self.state.cursor
    }

    pub fn editors(&self) -> &EditorRegistry {
        &self.editors
    }

    pub fn assist(&self) -> &AssistEditor {
        &self.assist
    }

    pub fn assist_mut(&mut self) -> &mut AssistEditor {
        &mut self.assist
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut KeyBindings {
        &mut self.bindings
    }

    // ========================================================================
    // Mode and image
    // ========================================================================

    /// Switch tool mode. Drops the selection, any drag and any shape under
    /// construction.
    pub fn set_mode(&mut self, mode: ToolMode, notifier: &mut Notifier) {
        if mode == self.mode {
            return;
        }
        log::info!("Mode: {} -> {}", self.mode, mode);
        self.mode = mode;
        self.editors.cancel_all();
        self.assist.cancel();
        self.assist.end_drag();
        self.state.clear_selection();
        self.state.cursor = mode.idle_cursor();
        notifier.emit(EditorEvent::ModeChanged(mode));
        notifier.redraw();
    }

    /// Change the kind of shape drawn.
    pub fn set_shape_kind(&mut self, kind: ShapeKind) {
        if kind != self.shape_kind {
            self.editors.cancel_all();
            self.shape_kind = kind;
        }
    }

    /// Reset per-image state when another image is shown.
    pub fn image_changed(&mut self, notifier: &mut Notifier) {
        self.editors.cancel_all();
        self.assist.clear_prompts();
        self.state = InteractionState {
            cursor: self.mode.idle_cursor(),
            ..InteractionState::default()
        };
        notifier.redraw();
    }

    /// Fit `image` into the canvas at the default margin, centred.
    pub fn fit_to_canvas(&mut self, image: ImageSize, canvas_w: f64, canvas_h: f64) {
        self.viewport = self.viewport.fit(
            image,
            canvas_w,
            canvas_h,
            zoom_limits::FIT_MARGIN,
            self.config.min_zoom,
            self.config.max_zoom,
        );
        log::debug!(
            "View: fit {}x{} at zoom {:.3}",
            image.width,
            image.height,
            self.viewport.zoom
        );
    }

    // ========================================================================
    // Pointer input
    // ========================================================================

    /// Dispatch one input event. Key presses return their outcome.
    pub fn handle_event(&mut self, event: &InputEvent, ctx: &mut EditorContext<'_>) -> KeyOutcome {
        match *event {
            InputEvent::MousePressed {
                button,
                position,
                modifiers,
            } => self.pointer_down(position, button, modifiers, ctx),
            InputEvent::MouseReleased {
                button,
                position,
                modifiers,
            } => self.pointer_up(position, button, modifiers, ctx),
            InputEvent::MouseMoved {
                position,
                modifiers,
            } => self.pointer_move(position, modifiers, ctx),
            InputEvent::MouseWheel { delta_y, position } => self.wheel(position, delta_y, ctx),
            InputEvent::MouseLeft => self.pointer_leave(ctx.notifier),
            InputEvent::KeyPressed { key, modifiers } => return self.key_down(key, modifiers, ctx),
        }
        KeyOutcome::Unbound
    }

    pub fn pointer_down(
        &mut self,
        screen: Point,
        button: MouseButton,
        modifiers: Modifiers,
        ctx: &mut EditorContext<'_>,
    ) {
        self.state.pointer = Some(screen);
        self.state.hovered = None;
        let at = self.viewport.screen_to_image(screen);

        match button {
            MouseButton::Right => self.secondary_down(screen, at, ctx),
            MouseButton::Left => match self.mode {
                ToolMode::Draw => self.draw_down(at, ctx),
                ToolMode::Assist => self.assist_down(at, ctx),
                ToolMode::Edit => self.edit_down(at, ctx),
            },
            _ => return,
        }
        log::trace!("Pointer: {:?} down at {} ({:?})", button, at, modifiers);
        ctx.notifier.redraw();
    }

    fn secondary_down(&mut self, screen: Point, at: Point, ctx: &mut EditorContext<'_>) {
        let image = ctx.image.size();
        match self.mode {
            ToolMode::Draw => {
                let editor = self.editors.get_mut(self.shape_kind);
                if editor.is_continuous() && editor.is_drawing() {
                    let outcome = editor.secondary_action(image);
                    self.apply_outcome(outcome, ctx);
                    return;
                }
            }
            ToolMode::Assist => {
                if let Some((index, _)) = self.assist.hit_test(at, self.viewport.zoom) {
                    if let Err(e) = self.assist.delete_prompt(index) {
                        log::warn!("Assist: {}", e);
                    }
                    ctx.notifier.emit(EditorEvent::PromptsChanged);
                    return;
                }
            }
            ToolMode::Edit => {
                if let Some((index, _)) = self.annotation_at(at, ctx.image) {
                    self.state.last_created = Some(index);
                    self.set_selection(Some(index), ctx.notifier);
                    return;
                }
            }
        }
        self.state.pan.start_drag(screen);
        self.state.cursor = Cursor::Grabbing;
    }

    fn draw_down(&mut self, at: Point, ctx: &mut EditorContext<'_>) {
        let Some(label) = ctx.label else {
            ctx.notifier.advise(Advisory::NoLabel);
            return;
        };
        let image = ctx.image.size();
        self.state.drag = None;
        self.set_selection(None, ctx.notifier);
        let outcome = self
            .editors
            .get_mut(self.shape_kind)
            .start_drawing(at, label, image);
        self.apply_outcome(outcome, ctx);
    }

    fn assist_down(&mut self, at: Point, ctx: &mut EditorContext<'_>) {
        let waiting = matches!(self.assist.state(), AssistState::WaitingDirection { .. });
        if !waiting && let Some((index, hit)) = self.assist.hit_test(at, self.viewport.zoom) {
            if let Err(e) = self.assist.start_drag(index, hit, at) {
                log::warn!("Assist: {}", e);
            }
            return;
        }
        if ctx.label.is_none() {
            ctx.notifier.advise(Advisory::NoLabel);
            return;
        }
        if self.assist.start(at, ctx.image.size()).is_some() {
            ctx.notifier.emit(EditorEvent::PromptsChanged);
        }
    }

    fn edit_down(&mut self, at: Point, ctx: &mut EditorContext<'_>) {
        self.state.drag = None;
        let Some((index, hit)) = self.annotation_at(at, ctx.image) else {
            self.state.last_created = None;
            self.set_selection(None, ctx.notifier);
            return;
        };
        let Some(annotation) = ctx.image.get(index) else {
            return;
        };
        let original = annotation.shape.clone();

        self.state.last_created = Some(index);
        self.set_selection(Some(index), ctx.notifier);
        ctx.snapshot();
        self.state.drag = Some(DragContext::new(index, hit, at, original));
        log::debug!("Edit: dragging annotation {} ({})", index, hit);
    }

    pub fn pointer_move(&mut self, screen: Point, modifiers: Modifiers, ctx: &mut EditorContext<'_>) {
        self.state.pointer = Some(screen);
        let at = self.viewport.screen_to_image(screen);
        self.state.crosshair = Some(at);

        if let Some(delta) = self.state.pan.update_drag(screen) {
            self.viewport = self.viewport.pan_by(delta);
            self.state.cursor = Cursor::Grabbing;
            ctx.notifier.redraw();
            return;
        }

        let image = ctx.image.size();
        self.state.cursor = match self.mode {
            ToolMode::Draw => {
                let editor = self.editors.get_mut(self.shape_kind);
                if editor.is_drawing() {
                    editor.update_drawing(at);
                }
                Cursor::Crosshair
            }
            ToolMode::Assist => {
                if self.assist.is_dragging() {
                    self.assist.update_drag(at, image);
                    Cursor::Grabbing
                } else if self.assist.is_drawing() {
                    self.assist.update(at, modifiers.shift);
                    Cursor::Crosshair
                } else {
                    self.assist
                        .hit_test(at, self.viewport.zoom)
                        .map_or(Cursor::Crosshair, |(_, hit)| hit.cursor())
                }
            }
            ToolMode::Edit => {
                if self.state.drag.is_some() {
                    self.apply_drag(at, ctx.image);
                    Cursor::Grabbing
                } else {
                    self.state.hovered = self
                        .annotation_at(at, ctx.image)
                        .map(|(index, hit)| Hover { index, hit });
                    self.state.hovered.map_or(Cursor::Default, |h| h.hit.cursor())
                }
            }
        };
        ctx.notifier.redraw();
    }

    fn apply_drag(&mut self, at: Point, image: &mut ImageAnnotations) {
        let Some(drag) = self.state.drag.as_ref() else {
            return;
        };
        let size = image.size();
        let editor = self.editors.get(drag.original.kind());
        let Some(annotation) = image.get_mut(drag.index) else {
            log::warn!("Edit: dragged annotation {} is gone", drag.index);
            self.state.drag = None;
            return;
        };
        if let Err(e) = editor.update_drag(drag, at, size, &mut annotation.shape) {
            log::warn!("Edit: {}", e);
        }
    }

    /// Re-validate a dragged polygon ring. A ring that cannot be fixed
    /// snaps back to its geometry from before the drag.
    fn finish_drag(&self, drag: &DragContext, ctx: &mut EditorContext<'_>) {
        let Some(Shape::Polygon { points }) = ctx.image.get(drag.index).map(|a| &a.shape) else {
            return;
        };
        let before = points.len();
        let (shape, advisory) = match self.editors.polygon().fix(points, ctx.image.size()) {
            Ok(fix) => {
                let advisory = fix.repaired.then_some(Advisory::PolygonRepaired {
                    before,
                    after: fix.points.len(),
                });
                (Shape::Polygon { points: fix.points }, advisory)
            }
            Err(rejection) => {
                log::debug!("Edit: polygon drag reverted: {}", rejection);
                (drag.original.clone(), Some(Advisory::Rejected(rejection)))
            }
        };
        if let Err(e) = ctx.image.set_shape(drag.index, shape) {
            log::warn!("Edit: {}", e);
            return;
        }
        if let Some(advisory) = advisory {
            ctx.notifier.advise(advisory);
        }
    }

    pub fn pointer_up(
        &mut self,
        screen: Point,
        button: MouseButton,
        modifiers: Modifiers,
        ctx: &mut EditorContext<'_>,
    ) {
        if self.state.pan.is_panning {
            self.state.pan.end_drag();
            self.state.cursor = self.mode.idle_cursor();
            return;
        }
        if button != MouseButton::Left {
            return;
        }

        let at = self.viewport.screen_to_image(screen);
        let image = ctx.image.size();
        match self.mode {
            ToolMode::Draw => {
                let editor = self.editors.get_mut(self.shape_kind);
                if editor.is_drawing() {
                    let outcome = editor.release(at, image);
                    self.apply_outcome(outcome, ctx);
                }
            }
            ToolMode::Assist => {
                if self.assist.end_drag() {
                    ctx.notifier.emit(EditorEvent::PromptsChanged);
                } else if self.assist.is_drawing() {
                    match ctx.label {
                        Some(label) => {
                            if self
                                .assist
                                .release(at, label, modifiers.shift, image)
                                .is_some()
                            {
                                ctx.notifier.emit(EditorEvent::PromptsChanged);
                            }
                        }
                        None => self.assist.cancel(),
                    }
                }
            }
            ToolMode::Edit => {
                if let Some(drag) = self.state.drag.take() {
                    self.finish_drag(&drag, ctx);
                    log::debug!("Edit: drag of annotation {} finished", drag.index);
                    ctx.notifier.emit(EditorEvent::AnnotationsChanged);
                }
            }
        }
        ctx.notifier.redraw();
    }

    /// Zoom about the cursor, or rotate the oriented box whose centre
    /// handle is hovered in edit mode.
    pub fn wheel(&mut self, screen: Point, delta_y: f64, ctx: &mut EditorContext<'_>) {
        if self.mode == ToolMode::Edit
            && let Some(Hover {
                index,
                hit: HitType::Rotate,
            }) = self.state.hovered
            && ctx.image.get(index).is_some_and(|a| a.kind() == ShapeKind::Obb)
        {
            ctx.snapshot();
            if let Some(annotation) = ctx.image.get_mut(index)
                && let Err(e) = self.editors.obb().rotate_by_wheel(&mut annotation.shape, delta_y)
            {
                log::warn!("Edit: {}", e);
            }
            ctx.notifier.emit(EditorEvent::AnnotationsChanged);
            ctx.notifier.redraw();
            return;
        }

        self.viewport = self.viewport.zoom_by_wheel(
            screen,
            delta_y,
            self.config.zoom_sensitivity,
            self.config.min_zoom,
            self.config.max_zoom,
        );
        log::trace!("View: zoom {:.3}", self.viewport.zoom);
        ctx.notifier.redraw();
    }

    pub fn pointer_leave(&mut self, notifier: &mut Notifier) {
        self.state.crosshair = None;
        self.state.hovered = None;
        self.state.cursor = self.mode.idle_cursor();
        notifier.redraw();
    }

    // ========================================================================
    // Hit resolution
    // ========================================================================

    /// Annotation under `at` and the part that was hit.
    ///
    /// The selected annotation's handles win first. Otherwise annotations
    /// are tried from the smallest area up, so small shapes stay reachable
    /// inside large ones.
    pub fn annotation_at(&self, at: Point, image: &ImageAnnotations) -> Option<(usize, HitType)> {
        let zoom = self.viewport.zoom;

        if let Some(index) = self.state.selected
            && let Some(annotation) = image.get(index)
        {
            match self
                .editors
                .get(annotation.kind())
                .hit_test(&annotation.shape, at, zoom, true)
            {
                Ok(Some(hit)) => return Some((index, hit)),
                Ok(None) => {}
                Err(e) => log::warn!("Hit test: {}", e),
            }
        }

        let mut order: Vec<(usize, f64)> = image
            .iter()
            .enumerate()
            .map(|(i, a)| (i, a.shape.selection_area()))
            .collect();
        order.sort_by(|a, b| a.1.total_cmp(&b.1));

        order.into_iter().find_map(|(index, _)| {
            let annotation = image.get(index)?;
            match self
                .editors
                .get(annotation.kind())
                .hit_test(&annotation.shape, at, zoom, false)
            {
                Ok(hit) => hit.map(|h| (index, h)),
                Err(e) => {
                    log::warn!("Hit test: {}", e);
                    None
                }
            }
        })
    }

    // ========================================================================
    // Commit plumbing
    // ========================================================================

    fn set_selection(&mut self, index: Option<usize>, notifier: &mut Notifier) {
        if self.state.selected != index {
            self.state.selected = index;
            notifier.emit(EditorEvent::SelectionChanged(index));
        }
    }

    /// Snapshot, append and select a finished shape; report rejections.
    fn apply_outcome(&mut self, outcome: DrawOutcome, ctx: &mut EditorContext<'_>) {
        match outcome {
            DrawOutcome::Pending => {}
            DrawOutcome::Committed {
                annotation,
                advisory,
            } => {
                self.commit(annotation, ctx);
                if let Some(advisory) = advisory {
                    ctx.notifier.advise(advisory);
                }
            }
            DrawOutcome::Rejected(rejection) => {
                ctx.notifier.advise(Advisory::Rejected(rejection));
            }
        }
    }

    fn commit(&mut self, annotation: Annotation, ctx: &mut EditorContext<'_>) -> Option<usize> {
        let kind = annotation.kind();
        ctx.snapshot();
        match ctx.image.push(annotation) {
            Ok(index) => {
                self.state.last_created = Some(index);
                self.set_selection(Some(index), ctx.notifier);
                ctx.notifier
                    .emit(EditorEvent::AnnotationCommitted { index, kind });
                Some(index)
            }
            Err(e) => {
                log::warn!("Commit: {}", e);
                None
            }
        }
    }

    // ========================================================================
    // Segmentation
    // ========================================================================

    /// Snapshot the current prompts into a request for the segmenter.
    pub fn begin_segmentation(&mut self, confidence: f64) -> Option<SegmentationRequest> {
        self.assist.begin_request(confidence)
    }

    /// Apply a segmenter response to the current image. Returns the number
    /// of annotations added.
    pub fn apply_segmentation(
        &mut self,
        response: SegmentationResponse,
        ctx: &mut EditorContext<'_>,
    ) -> usize {
        let outcome = self.assist.apply_response(
            response,
            self.shape_kind,
            ctx.image.size(),
            &self.editors,
        );
        match outcome {
            SegmentationOutcome::Stale { .. } => {
                if let Some(advisory) = outcome.advisory() {
                    ctx.notifier.advise(advisory);
                }
                0
            }
            SegmentationOutcome::Applied { annotations, .. } => {
                ctx.notifier.emit(EditorEvent::PromptsChanged);
                if annotations.is_empty() {
                    ctx.notifier.redraw();
                    return 0;
                }
                ctx.snapshot();
                let mut added = 0;
                for annotation in annotations {
                    match ctx.image.push(annotation) {
                        Ok(_) => added += 1,
                        Err(e) => log::warn!("Segmentation: {}", e),
                    }
                }
                ctx.notifier.emit(EditorEvent::AnnotationsChanged);
                ctx.notifier.redraw();
                added
            }
        }
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Everything to draw over the image, in image coordinates.
    pub fn render_scene(&self, image: &ImageAnnotations) -> Vec<Primitive> {
        let zoom = self.viewport.zoom;
        let edit_mode = self.mode == ToolMode::Edit;
        let mut out = Vec::new();

        for (i, annotation) in image.iter().enumerate() {
            let hover = self.state.hover_of(i);
            let state = RenderState {
                selected: self.state.selected == Some(i),
                hovered: hover.is_some(),
                dragging: self.state.is_dragging(i),
                edit_mode,
                hovered_hit: hover.map(|h| h.hit),
            };
            out.extend(self.editors.get(annotation.kind()).render(annotation, &state, zoom));
        }

        match self.mode {
            ToolMode::Draw => out.extend(self.editors.get(self.shape_kind).preview(zoom)),
            ToolMode::Assist => out.extend(self.assist.render(zoom)),
            ToolMode::Edit => {}
        }

        if let Some(p) = self.state.crosshair {
            let size = image.size();
            let stroke = Stroke::new(
                Paint::new(style::BLACK.into(), style::CROSSHAIR_ALPHA),
                1.0 / zoom,
            );
            for points in [
                vec![Point::new(0.0, p.y), Point::new(size.width, p.y)],
                vec![Point::new(p.x, 0.0), Point::new(p.x, size.height)],
            ] {
                out.push(Primitive::Path {
                    points,
                    closed: false,
                    fill: None,
                    stroke: Some(stroke.clone()),
                });
            }
        }
        out
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(EditorConfig::default(), ShapeKind::Rect)
    }
}
