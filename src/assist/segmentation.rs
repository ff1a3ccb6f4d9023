//! Request/response bookkeeping for the segmentation service.
//!
//! The service itself is external. A request snapshots the prompt list
//! under a fresh sequence number; only the response to the newest request
//! is applied, and only while the prompts it was made from are still
//! around.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::assist::{ORIENTATION_SEPARATOR, POSITIVE_COLOR};
use crate::editors::EditorRegistry;
use crate::events::Advisory;
use crate::geometry::{
    ImageSize, Point, bounding_rect, clamp_rect_to_image, fit_obb_with_orientation,
};
use crate::model::{Annotation, AssistPrompt, HexColor, Shape, ShapeKind};

use super::AssistEditor;

/// How the segmenter relates prompts to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentationMode {
    /// Prompts sharing a label describe one concept
    #[default]
    Semantic,
    /// Every prompt is segmented on its own
    Standard,
}

impl SegmentationMode {
    pub fn name(&self) -> &'static str {
        match self {
            SegmentationMode::Semantic => "semantic",
            SegmentationMode::Standard => "standard",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SegmentationMode::Semantic => SegmentationMode::Standard,
            SegmentationMode::Standard => SegmentationMode::Semantic,
        }
    }
}

impl fmt::Display for SegmentationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Prompts sent to the segmenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationRequest {
    pub sequence: u64,
    pub prompts: Vec<AssistPrompt>,
    pub confidence: f64,
    pub mode: SegmentationMode,
}

/// One outline returned by the segmenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentedPolygon {
    /// Label of the originating prompt, orientation-encoded if the request
    /// carried orientations
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<HexColor>,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationResponse {
    /// Sequence number of the request this answers
    pub sequence: u64,
    pub polygons: Vec<SegmentedPolygon>,
}

/// What became of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentationOutcome {
    /// Converted outlines, ready to append to the image
    Applied {
        annotations: Vec<Annotation>,
        /// Outlines that produced no valid shape
        skipped: usize,
    },
    /// The response was superseded or its prompts are gone
    Stale { sequence: u64, latest: u64 },
}

impl SegmentationOutcome {
    pub fn advisory(&self) -> Option<Advisory> {
        match self {
            SegmentationOutcome::Stale { sequence, latest } => Some(Advisory::StaleSegmentation {
                sequence: *sequence,
                latest: *latest,
            }),
            SegmentationOutcome::Applied { .. } => None,
        }
    }
}

/// Append an orientation to a label: `"car"` and `0.5` give `"car:::0.5"`.
pub fn encode_orientation(label: &str, rotation: Option<f64>) -> String {
    format!("{}{}{}", label, ORIENTATION_SEPARATOR, rotation.unwrap_or(0.0))
}

/// Split an orientation-encoded label into name and angle.
///
/// An unparseable angle yields `None`, as does a plain label.
pub fn decode_orientation(label: &str) -> (&str, Option<f64>) {
    match label.split_once(ORIENTATION_SEPARATOR) {
        Some((name, angle)) => (name, angle.trim().parse().ok()),
        None => (label, None),
    }
}

impl AssistEditor {
    /// Snapshot the prompts for a new request. Any earlier request is
    /// superseded. Returns `None` when there are no prompts.
    pub fn begin_request(&mut self, confidence: f64) -> Option<SegmentationRequest> {
        if self.prompts.is_empty() {
            return None;
        }
        self.last_issued += 1;
        self.in_flight = Some(self.last_issued);

        let prompts = self
            .prompts
            .iter()
            .map(|p| {
                let mut p = p.clone();
                if self.require_orientation {
                    p.label = encode_orientation(&p.label, p.rotation);
                }
                p
            })
            .collect();

        log::info!(
            "Assist: request #{} with {} prompts ({}, confidence {:.2})",
            self.last_issued,
            self.prompts.len(),
            self.mode,
            confidence
        );
        Some(SegmentationRequest {
            sequence: self.last_issued,
            prompts,
            confidence,
            mode: self.mode,
        })
    }

    /// Whether a response to `sequence` would still be applied.
    pub fn is_current(&self, sequence: u64) -> bool {
        self.in_flight == Some(sequence)
    }

    /// Convert a response into annotations of `target` kind.
    ///
    /// Polygons go through the polygon editor's repair pipeline, oriented
    /// boxes are fitted at the decoded prompt angle and size-checked like
    /// drawn ones, rectangles take the outline's bounds. Prompts are cleared once a response is applied.
    pub fn apply_response(
        &mut self,
        response: SegmentationResponse,
        target: ShapeKind,
        image: ImageSize,
        editors: &EditorRegistry,
    ) -> SegmentationOutcome {
        if !self.is_current(response.sequence) {
            log::warn!(
                "Assist: dropping stale response #{} (latest #{})",
                response.sequence,
                self.last_issued
            );
            return SegmentationOutcome::Stale {
                sequence: response.sequence,
                latest: self.last_issued,
            };
        }

        let total = response.polygons.len();
        let annotations: Vec<Annotation> = response
            .polygons
            .into_iter()
            .filter_map(|segment| self.convert(segment, target, image, editors))
            .collect();
        let skipped = total - annotations.len();

        log::info!(
            "Assist: response #{} gave {} {} annotations ({} skipped)",
            response.sequence,
            annotations.len(),
            target,
            skipped
        );
        self.clear_prompts();
        SegmentationOutcome::Applied {
            annotations,
            skipped,
        }
    }

    fn convert(
        &self,
        segment: SegmentedPolygon,
        target: ShapeKind,
        image: ImageSize,
        editors: &EditorRegistry,
    ) -> Option<Annotation> {
        let (name, rotation) = decode_orientation(&segment.label);
        let shape = match target {
            ShapeKind::Polygon => match editors.polygon().fix(&segment.points, image) {
                Ok(fix) => Shape::Polygon { points: fix.points },
                Err(rejection) => {
                    log::debug!("Assist: outline for '{}' rejected: {}", name, rejection);
                    return None;
                }
            },
            ShapeKind::Obb => {
                let obb = fit_obb_with_orientation(&segment.points, rotation.unwrap_or(0.0))?;
                if let Err(rejection) = editors.obb().check_size(&obb) {
                    log::debug!("Assist: box for '{}' rejected: {}", name, rejection);
                    return None;
                }
                Shape::Obb(obb)
            }
            ShapeKind::Rect => {
                let rect = clamp_rect_to_image(bounding_rect(&segment.points)?, image);
                if !rect.is_valid() {
                    return None;
                }
                Shape::Rect(rect)
            }
        };

        let color = segment
            .color
            .clone()
            .or_else(|| self.prompt_color(name))
            .unwrap_or_else(|| POSITIVE_COLOR.into());
        Some(Annotation {
            label: name.to_string(),
            color,
            shape,
        })
    }

    /// Color of the first positive prompt labelled `name`.
    fn prompt_color(&self, name: &str) -> Option<HexColor> {
        self.prompts
            .iter()
            .find(|p| !p.is_negative && p.label == name)
            .map(|p| p.color.clone())
    }
}
