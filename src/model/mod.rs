//! Data models for annotations, labels and assist prompts.

mod annotation;
mod label;
mod prompt;

pub use annotation::{Annotation, Shape, ShapeKind};
pub use label::{HexColor, Label, distinct_color, hsv_to_hex, hsv_to_rgb, label_color};
pub use prompt::{AssistPrompt, PromptShape};
