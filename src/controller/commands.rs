//! Keyboard commands carried out by the controller.

use super::{Command, EditorContext, InteractionController, Key, KeyOutcome, Modifiers, ToolMode};
use crate::editors::{DragContext, HitType};
use crate::events::EditorEvent;
use crate::geometry::{Point, Rect, clamp_rect_to_image};
use crate::model::{Label, Shape, ShapeKind};

impl InteractionController {
    /// Resolve and run a key press.
    pub fn key_down(
        &mut self,
        key: Key,
        modifiers: Modifiers,
        ctx: &mut EditorContext<'_>,
    ) -> KeyOutcome {
        match self.bindings.command_for(key, modifiers) {
            Some(command) => self.execute(command, ctx),
            None => KeyOutcome::Unbound,
        }
    }

    /// Run `command`. Commands that need host data come back delegated.
    pub fn execute(&mut self, command: Command, ctx: &mut EditorContext<'_>) -> KeyOutcome {
        let handled = match command {
            Command::SetMode(mode) => {
                self.set_mode(mode, ctx.notifier);
                true
            }
            Command::ToggleAssist => {
                let mode = if self.mode == ToolMode::Assist {
                    ToolMode::Draw
                } else {
                    ToolMode::Assist
                };
                self.set_mode(mode, ctx.notifier);
                true
            }
            Command::ToggleSegmentationMode => {
                if self.mode != ToolMode::Assist {
                    return KeyOutcome::Unbound;
                }
                self.assist.toggle_mode();
                ctx.notifier.redraw();
                true
            }
            Command::Nudge { dx, dy, coarse } => self.nudge_selected(dx, dy, coarse, ctx),
            Command::DeleteSelected => self.delete_selected(ctx),
            Command::Escape => {
                self.escape(ctx);
                true
            }
            Command::FinishDrawing => {
                if self.mode != ToolMode::Draw {
                    return KeyOutcome::Unbound;
                }
                let image = ctx.image.size();
                let outcome = self.editors.get_mut(self.shape_kind).finish(image);
                self.apply_outcome(outcome, ctx);
                ctx.notifier.redraw();
                true
            }
            Command::Copy => self.copy_selected(ctx),
            Command::Paste => self.paste(ctx),
            Command::ClearAll => self.clear_all(ctx),
            Command::SubmitSegmentation => {
                if self.mode != ToolMode::Assist {
                    return KeyOutcome::Unbound;
                }
                return KeyOutcome::Delegated(command);
            }
            Command::Undo
            | Command::CycleLabel { .. }
            | Command::QuickLabel(_)
            | Command::NavigateImage(_) => return KeyOutcome::Delegated(command),
        };

        if handled {
            log::debug!("Key: {:?}", command);
            KeyOutcome::Handled(command)
        } else {
            KeyOutcome::Unbound
        }
    }

    /// Move the selected annotation by one nudge step in screen pixels,
    /// through the same logic as a body drag.
    fn nudge_selected(&mut self, dx: f64, dy: f64, coarse: bool, ctx: &mut EditorContext<'_>) -> bool {
        if self.mode != ToolMode::Edit {
            return false;
        }
        let Some(index) = self.state.selected else {
            return false;
        };
        let Some(original) = ctx.image.get(index).map(|a| a.shape.clone()) else {
            return false;
        };
        let Some(bounds) = original.bounding_rect() else {
            return false;
        };

        let screen_step = if coarse {
            self.config.nudge_step_coarse
        } else {
            self.config.nudge_step
        };
        let step = screen_step / self.viewport.zoom;
        let origin = bounds.center();
        let drag = DragContext::new(index, HitType::Move, origin, original);
        let target = origin + Point::new(dx * step, dy * step);

        ctx.snapshot();
        let size = ctx.image.size();
        let editor = self.editors.get(drag.original.kind());
        if let Some(annotation) = ctx.image.get_mut(index)
            && let Err(e) = editor.update_drag(&drag, target, size, &mut annotation.shape)
        {
            log::warn!("Nudge: {}", e);
            return false;
        }
        ctx.notifier.emit(EditorEvent::AnnotationsChanged);
        ctx.notifier.redraw();
        true
    }

    /// Delete the selected prompt in assist mode, else the selected
    /// annotation.
    fn delete_selected(&mut self, ctx: &mut EditorContext<'_>) -> bool {
        if self.mode == ToolMode::Assist {
            if self.assist.delete_selected().is_none() {
                return false;
            }
            ctx.notifier.emit(EditorEvent::PromptsChanged);
            ctx.notifier.redraw();
            return true;
        }

        let Some(index) = self.state.selected else {
            return false;
        };
        if ctx.image.get(index).is_none() {
            log::debug!("Delete: selection {} no longer exists", index);
            return false;
        }
        ctx.snapshot();
        match ctx.image.remove(index) {
            Ok(removed) => {
                log::info!("Deleted {} annotation '{}'", removed.kind(), removed.label);
                self.state.forget_index(index);
                ctx.notifier.emit(EditorEvent::SelectionChanged(None));
                ctx.notifier.emit(EditorEvent::AnnotationsChanged);
                ctx.notifier.redraw();
                true
            }
            Err(e) => {
                log::warn!("Delete: {}", e);
                false
            }
        }
    }

    /// Back out of whatever is in progress, one layer per press.
    fn escape(&mut self, ctx: &mut EditorContext<'_>) {
        if self.mode == ToolMode::Assist {
            if self.assist.is_drawing() {
                self.assist.cancel();
            } else if self.assist.abort_drag() {
                log::debug!("Assist: drag aborted");
            } else if self.assist.selected().is_some() {
                self.assist.select(None);
            } else {
                self.assist.clear_prompts();
            }
            ctx.notifier.emit(EditorEvent::PromptsChanged);
            ctx.notifier.redraw();
            return;
        }

        let editor = self.editors.get_mut(self.shape_kind);
        if editor.is_drawing() {
            editor.cancel();
            log::debug!("Drawing cancelled");
        } else if let Some(drag) = self.state.drag.take() {
            if let Err(e) = ctx.image.set_shape(drag.index, drag.original) {
                log::warn!("Escape: {}", e);
            }
            log::debug!("Edit: drag of annotation {} aborted", drag.index);
            ctx.notifier.emit(EditorEvent::AnnotationsChanged);
        } else {
            self.state.clear_selection();
            ctx.notifier.emit(EditorEvent::SelectionChanged(None));
        }
        ctx.notifier.redraw();
    }

    fn copy_selected(&mut self, ctx: &mut EditorContext<'_>) -> bool {
        let Some(annotation) = self.state.selected.and_then(|i| ctx.image.get(i)) else {
            return false;
        };
        if annotation.kind() != ShapeKind::Rect {
            log::debug!("Copy: only rectangles can be copied");
            return false;
        }
        self.clipboard = Some(annotation.clone());
        true
    }

    /// Paste the copied rectangle centred at the pointer, kept inside the
    /// image.
    fn paste(&mut self, ctx: &mut EditorContext<'_>) -> bool {
        let Some(mut annotation) = self.clipboard.clone() else {
            return false;
        };
        let Some(&rect) = annotation.shape.as_rect() else {
            return false;
        };
        let image = ctx.image.size();
        let center = self
            .state
            .pointer
            .map_or(rect.center(), |p| self.viewport.screen_to_image(p));

        let x = (center.x - rect.w / 2.0).min(image.width - rect.w).max(0.0);
        let y = (center.y - rect.h / 2.0).min(image.height - rect.h).max(0.0);
        let placed = clamp_rect_to_image(Rect::new(x, y, rect.w, rect.h), image);
        if !placed.is_valid() {
            return false;
        }
        annotation.shape = Shape::Rect(placed);

        let committed = self.commit(annotation, ctx).is_some();
        ctx.notifier.redraw();
        committed
    }

    fn clear_all(&mut self, ctx: &mut EditorContext<'_>) -> bool {
        if ctx.image.is_empty() {
            return false;
        }
        ctx.snapshot();
        let removed = ctx.image.clear();
        log::info!("Cleared {} annotations from '{}'", removed.len(), ctx.image.name());
        self.state.clear_selection();
        ctx.notifier.emit(EditorEvent::SelectionChanged(None));
        ctx.notifier.emit(EditorEvent::AnnotationsChanged);
        ctx.notifier.redraw();
        true
    }

    /// Give the selected prompt (assist mode) or the selected annotation,
    /// falling back to the last created one, a new label.
    pub fn relabel_selected(&mut self, label: &Label, ctx: &mut EditorContext<'_>) -> bool {
        if self.mode == ToolMode::Assist {
            let changed = self.assist.change_label_of_selected(label);
            if changed {
                ctx.notifier.emit(EditorEvent::PromptsChanged);
                ctx.notifier.redraw();
            }
            return changed;
        }

        let Some(index) = self.state.selected.or(self.state.last_created) else {
            return false;
        };
        if ctx.image.get(index).is_none() {
            return false;
        }
        ctx.snapshot();
        match ctx.image.relabel(index, label) {
            Ok(()) => {
                ctx.notifier.emit(EditorEvent::AnnotationsChanged);
                ctx.notifier.redraw();
                true
            }
            Err(e) => {
                log::warn!("Relabel: {}", e);
                false
            }
        }
    }
}
