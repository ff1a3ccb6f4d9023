//! Assist prompts fed to an external segmentation service.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::model::label::HexColor;

/// Where a prompt points at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PromptShape {
    Point(Point),
    Box(Rect),
}

/// A point or box hint for the segmenter.
///
/// Negative prompts mark regions to exclude; their label carries no
/// meaning beyond that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistPrompt {
    pub shape: PromptShape,
    pub is_negative: bool,
    pub label: String,
    pub color: HexColor,
    /// Orientation hint in radians, present only when the session asks
    /// for one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
}

impl AssistPrompt {
    /// Point prompts are their own centroid; box prompts use their centre.
    pub fn centroid(&self) -> Point {
        match self.shape {
            PromptShape::Point(p) => p,
            PromptShape::Box(r) => r.center(),
        }
    }

    pub fn is_box(&self) -> bool {
        matches!(self.shape, PromptShape::Box(_))
    }
}
