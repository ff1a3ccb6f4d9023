//! Assist prompts for an external segmentation model.
//!
//! The editor keeps its own ordered prompt list, separate from committed
//! annotations, with a small press-drag-release drawing flow:
//! - a drag shorter than the minimum on both axes places a point prompt
//! - anything longer places a box prompt, clamped to the image
//! - holding the negative modifier at release marks an exclusion region
//!
//! When an orientation is required, a positive prompt is held until a
//! follow-up click gives its direction.

pub mod segmentation;

use crate::config::EditorConfig;
use crate::constants::assist::{
    ARROW_LENGTH, NEGATIVE_COLOR, PENDING_ARROW_COLOR, POINT_RADIUS, POSITIVE_COLOR,
};
use crate::constants::render as style;
use crate::editors::rect::{drag_rect, handle_at};
use crate::editors::render::{self, Paint, Primitive, Stroke, TextAlign};
use crate::editors::HitType;
use crate::error::EditorError;
use crate::geometry::{
    ImageSize, Point, Rect, clamp_point_to_image, clamp_rect_to_image, handle_rects,
    point_in_rect,
};
use crate::model::{AssistPrompt, HexColor, Label, PromptShape};

pub use segmentation::{
    SegmentationMode, SegmentationOutcome, SegmentationRequest, SegmentationResponse,
    SegmentedPolygon, decode_orientation, encode_orientation,
};

/// Prompt drawing progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AssistState {
    #[default]
    Idle,
    /// Button held since `start`
    DrawingPrompt {
        start: Point,
        current: Point,
        negative: bool,
    },
    /// A positive prompt waits for its direction click
    WaitingDirection { pending: AssistPrompt, cursor: Point },
}

/// Drag of an existing prompt.
#[derive(Debug, Clone, PartialEq)]
struct PromptDrag {
    index: usize,
    hit: HitType,
    origin: Point,
    original: PromptShape,
}

/// Point and box prompt editor.
#[derive(Debug, Clone)]
pub struct AssistEditor {
    min_drag_distance: f64,
    handle_size: f64,
    border_tolerance: f64,
    prompts: Vec<AssistPrompt>,
    selected: Option<usize>,
    state: AssistState,
    drag: Option<PromptDrag>,
    mode: SegmentationMode,
    require_orientation: bool,
    /// Sequence number of the newest request handed out
    last_issued: u64,
    /// Request whose response is still welcome
    in_flight: Option<u64>,
}

impl AssistEditor {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            min_drag_distance: config.min_drag_distance,
            handle_size: config.assist_handle_size,
            border_tolerance: config.assist_border_tolerance,
            prompts: Vec::new(),
            selected: None,
            state: AssistState::Idle,
            drag: None,
            mode: SegmentationMode::default(),
            require_orientation: false,
            last_issued: 0,
            in_flight: None,
        }
    }

    pub fn prompts(&self) -> &[AssistPrompt] {
        &self.prompts
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|&i| i < self.prompts.len());
    }

    pub fn state(&self) -> &AssistState {
        &self.state
    }

    /// A prompt is being drawn or waits for its direction.
    pub fn is_drawing(&self) -> bool {
        self.state != AssistState::Idle
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn mode(&self) -> SegmentationMode {
        self.mode
    }

    /// Switch between semantic and standard segmentation.
    pub fn toggle_mode(&mut self) -> SegmentationMode {
        self.mode = self.mode.toggled();
        log::info!("Assist: segmentation mode {}", self.mode);
        self.mode
    }

    pub fn require_orientation(&self) -> bool {
        self.require_orientation
    }

    pub fn set_require_orientation(&mut self, required: bool) {
        self.require_orientation = required;
    }

    // ========================================================================
    // Drawing
    // ========================================================================

    /// Primary button pressed. Returns the index of a prompt committed by
    /// a direction click.
    pub fn start(&mut self, at: Point, image: ImageSize) -> Option<usize> {
        if let AssistState::WaitingDirection { .. } = self.state {
            return self.finalize_direction(at);
        }
        let start = clamp_point_to_image(at, image);
        self.selected = None;
        self.state = AssistState::DrawingPrompt {
            start,
            current: start,
            negative: false,
        };
        log::debug!("Assist: prompt started at {}", start);
        None
    }

    /// Pointer moved.
    pub fn update(&mut self, at: Point, negative: bool) {
        match &mut self.state {
            AssistState::Idle => {}
            AssistState::DrawingPrompt {
                current,
                negative: neg,
                ..
            } => {
                *current = at;
                *neg = negative;
            }
            AssistState::WaitingDirection { cursor, .. } => *cursor = at,
        }
    }

    /// Primary button released. Returns the index of the committed prompt;
    /// `None` if the prompt was discarded or now waits for a direction.
    pub fn release(
        &mut self,
        at: Point,
        label: &Label,
        negative: bool,
        image: ImageSize,
    ) -> Option<usize> {
        let AssistState::DrawingPrompt { start, .. } = self.state else {
            return None;
        };
        self.state = AssistState::Idle;

        let raw_w = (at.x - start.x).abs();
        let raw_h = (at.y - start.y).abs();
        let shape = if raw_w < self.min_drag_distance && raw_h < self.min_drag_distance {
            PromptShape::Point(start)
        } else {
            let rect = clamp_rect_to_image(Rect::from_corners(start, at), image);
            if !rect.is_valid() {
                log::debug!("Assist: box prompt outside the image, discarded");
                return None;
            }
            PromptShape::Box(rect)
        };

        let prompt = AssistPrompt {
            shape,
            is_negative: negative,
            label: label.name.clone(),
            color: if negative {
                NEGATIVE_COLOR.into()
            } else {
                label.color.clone()
            },
            rotation: None,
        };

        if self.require_orientation && !negative {
            log::debug!("Assist: waiting for direction");
            let cursor = prompt.centroid();
            self.state = AssistState::WaitingDirection {
                pending: prompt,
                cursor,
            };
            return None;
        }
        Some(self.push(prompt))
    }

    fn finalize_direction(&mut self, at: Point) -> Option<usize> {
        let AssistState::WaitingDirection { mut pending, .. } = std::mem::take(&mut self.state)
        else {
            return None;
        };
        let center = pending.centroid();
        let angle = (at.y - center.y).atan2(at.x - center.x);
        pending.rotation = Some(angle);
        log::debug!("Assist: direction {:.1}°", angle.to_degrees());
        Some(self.push(pending))
    }

    fn push(&mut self, prompt: AssistPrompt) -> usize {
        log::info!(
            "Assist: {} {} prompt for '{}'",
            if prompt.is_negative { "negative" } else { "positive" },
            if prompt.is_box() { "box" } else { "point" },
            prompt.label
        );
        self.prompts.push(prompt);
        let index = self.prompts.len() - 1;
        self.selected = Some(index);
        index
    }

    /// Drop the prompt being drawn or waiting for a direction.
    pub fn cancel(&mut self) {
        self.state = AssistState::Idle;
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Topmost prompt under `at`, newest first.
    pub fn hit_test(&self, at: Point, zoom: f64) -> Option<(usize, HitType)> {
        let handle_size = self.handle_size / zoom;
        let tolerance = self.border_tolerance / zoom;

        self.prompts
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, prompt)| match prompt.shape {
                PromptShape::Box(rect) => {
                    if let Some(handle) = handle_at(&rect, at, handle_size) {
                        Some((i, HitType::Resize(handle)))
                    } else {
                        is_near_border(at, &rect, tolerance).then_some((i, HitType::Move))
                    }
                }
                PromptShape::Point(p) => {
                    let half = handle_size / 1.5;
                    point_in_rect(at, &Rect::centered(p, half * 2.0)).then_some((i, HitType::Move))
                }
            })
    }

    /// Start dragging prompt `index`.
    pub fn start_drag(&mut self, index: usize, hit: HitType, at: Point) -> Result<(), EditorError> {
        let prompt = self
            .prompts
            .get(index)
            .ok_or_else(|| EditorError::index_out_of_range(index, self.prompts.len()))?;
        self.drag = Some(PromptDrag {
            index,
            hit,
            origin: at,
            original: prompt.shape,
        });
        self.selected = Some(index);
        log::debug!("Assist: dragging prompt {} ({})", index, hit);
        Ok(())
    }

    /// Apply the active drag. Points are clamped into the image; boxes
    /// follow rectangle move/resize rules.
    pub fn update_drag(&mut self, at: Point, image: ImageSize) {
        let Some(drag) = &self.drag else {
            return;
        };
        let Some(prompt) = self.prompts.get_mut(drag.index) else {
            return;
        };
        let delta = at - drag.origin;
        match drag.original {
            PromptShape::Point(p) => {
                prompt.shape = PromptShape::Point(clamp_point_to_image(p + delta, image));
            }
            PromptShape::Box(rect) => {
                if let Some(moved) = drag_rect(rect, drag.hit, delta, image) {
                    prompt.shape = PromptShape::Box(moved);
                }
            }
        }
    }

    /// Finish the active drag; returns whether one was active.
    pub fn end_drag(&mut self) -> bool {
        self.drag.take().is_some()
    }

    /// Abort the active drag, restoring the prompt's original geometry.
    pub fn abort_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        if let Some(prompt) = self.prompts.get_mut(drag.index) {
            prompt.shape = drag.original;
        }
        true
    }

    /// Give the selected prompt another label. Negative prompts keep their
    /// exclusion color.
    pub fn change_label_of_selected(&mut self, label: &Label) -> bool {
        let Some(prompt) = self.selected.and_then(|i| self.prompts.get_mut(i)) else {
            return false;
        };
        prompt.label = label.name.clone();
        if !prompt.is_negative {
            prompt.color = label.color.clone();
        }
        log::info!("Assist: prompt relabelled to '{}'", label.name);
        true
    }

    pub fn delete_prompt(&mut self, index: usize) -> Result<AssistPrompt, EditorError> {
        if index >= self.prompts.len() {
            return Err(EditorError::index_out_of_range(index, self.prompts.len()));
        }
        let removed = self.prompts.remove(index);
        self.selected = None;
        self.drag = None;
        log::info!("Assist: prompt {} deleted", index);
        Ok(removed)
    }

    pub fn delete_selected(&mut self) -> Option<AssistPrompt> {
        let index = self.selected?;
        self.delete_prompt(index).ok()
    }

    /// Discard every prompt and any outstanding request.
    pub fn clear_prompts(&mut self) {
        if !self.prompts.is_empty() {
            log::info!("Assist: {} prompts cleared", self.prompts.len());
        }
        self.prompts.clear();
        self.selected = None;
        self.drag = None;
        self.state = AssistState::Idle;
        self.in_flight = None;
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Prompts, their handles and the pending drawing preview.
    pub fn render(&self, zoom: f64) -> Vec<Primitive> {
        let mut out = Vec::new();
        for (i, prompt) in self.prompts.iter().enumerate() {
            self.render_prompt(prompt, self.selected == Some(i), zoom, &mut out);
        }

        match &self.state {
            AssistState::Idle => {}
            AssistState::DrawingPrompt {
                start,
                current,
                negative,
            } => {
                let color = prompt_color(*negative);
                let extent = *current - *start;
                if extent.x.abs() < self.min_drag_distance && extent.y.abs() < self.min_drag_distance {
                    out.push(dot(*start, color, zoom));
                } else {
                    out.push(Primitive::Rect {
                        rect: Rect::from_corners(*start, *current),
                        fill: None,
                        stroke: Some(
                            Stroke::new(Paint::solid(color), style::PREVIEW_STROKE_WIDTH / zoom)
                                .dashed(2.0, 2.0),
                        ),
                    });
                }
            }
            AssistState::WaitingDirection { pending, cursor } => {
                let color = prompt_color(false);
                out.push(match pending.shape {
                    PromptShape::Box(rect) => Primitive::Rect {
                        rect,
                        fill: None,
                        stroke: Some(Stroke::new(
                            Paint::solid(color),
                            style::PREVIEW_STROKE_WIDTH / zoom,
                        )),
                    },
                    PromptShape::Point(p) => dot(p, color, zoom),
                });
                out.push(arrow(
                    pending.centroid(),
                    *cursor,
                    Paint::solid(PENDING_ARROW_COLOR.into()),
                    zoom,
                ));
            }
        }
        out
    }

    fn render_prompt(&self, prompt: &AssistPrompt, selected: bool, zoom: f64, out: &mut Vec<Primitive>) {
        let color = prompt_color(prompt.is_negative);
        let outline = if selected {
            Paint::white()
        } else {
            Paint::solid(color.clone())
        };

        let (fill_alpha, width) = if selected { (0.1, 3.0) } else { (0.05, 2.0) };

        match prompt.shape {
            PromptShape::Box(rect) => {
                out.push(Primitive::Rect {
                    rect,
                    fill: Some(Paint::new(color.clone(), fill_alpha)),
                    stroke: Some(Stroke::new(outline, width / zoom).dashed(5.0, 3.0)),
                });
                let text = if prompt.is_negative {
                    "Neg Box (-)".to_string()
                } else {
                    format!("Rect: {}", prompt.label)
                };
                out.push(caption(text, Point::new(rect.x, rect.y - 8.0 / zoom), zoom));

                if selected {
                    for (_, r) in handle_rects(&rect, self.handle_size / zoom) {
                        out.push(render::handle_square(r, Paint::solid(color.clone()), zoom));
                    }
                }
            }
            PromptShape::Point(p) => {
                let scale = if selected { 1.2 } else { 1.0 };
                let radius = POINT_RADIUS * scale / zoom;
                out.push(Primitive::Circle {
                    center: p,
                    radius,
                    fill: Some(if selected {
                        Paint::white()
                    } else {
                        Paint::solid(color.clone())
                    }),
                    stroke: Some(Stroke::new(Paint::black(), 1.0 / zoom)),
                });
                let text = if prompt.is_negative {
                    "Neg (-)".to_string()
                } else {
                    format!("Point: {}", prompt.label)
                };
                let offset = radius + 4.0 / zoom;
                out.push(caption(text, Point::new(p.x + offset, p.y + radius), zoom));
            }
        }

        if self.require_orientation
            && !prompt.is_negative
            && let Some(rotation) = prompt.rotation
        {
            let center = prompt.centroid();
            let len = ARROW_LENGTH / zoom;
            let tip = center + Point::new(rotation.cos(), rotation.sin()) * len;
            out.push(arrow(
                center,
                tip,
                Paint::new(style::RED.into(), 0.8),
                zoom,
            ));
        }
    }
}

impl Default for AssistEditor {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

/// Within `tolerance` of any edge of `rect`, and not far outside it.
fn is_near_border(p: Point, rect: &Rect, tolerance: f64) -> bool {
    let (l, t, r, b) = (rect.x, rect.y, rect.x + rect.w, rect.y + rect.h);
    if p.x < l - tolerance || p.x > r + tolerance || p.y < t - tolerance || p.y > b + tolerance {
        return false;
    }
    (p.x - l).abs() <= tolerance
        || (p.x - r).abs() <= tolerance
        || (p.y - t).abs() <= tolerance
        || (p.y - b).abs() <= tolerance
}

fn prompt_color(negative: bool) -> HexColor {
    if negative {
        NEGATIVE_COLOR.into()
    } else {
        POSITIVE_COLOR.into()
    }
}

fn caption(text: String, at: Point, zoom: f64) -> Primitive {
    Primitive::Text {
        text,
        at,
        size: 14f64.max(16.0 / zoom),
        align: TextAlign::Left,
        fill: Paint::black(),
        halo: Some(Stroke::new(Paint::white(), style::TEXT_HALO_WIDTH / zoom)),
    }
}

fn dot(center: Point, color: HexColor, zoom: f64) -> Primitive {
    Primitive::Circle {
        center,
        radius: 5.0 / zoom,
        fill: Some(Paint::solid(color)),
        stroke: None,
    }
}

fn arrow(from: Point, to: Point, paint: Paint, zoom: f64) -> Primitive {
    Primitive::Arrow {
        from,
        to,
        head: 10.0 / zoom,
        stroke: Stroke::new(paint, 2.0 / zoom),
    }
}
