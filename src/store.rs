//! In-memory annotation storage.
//!
//! Annotations are kept per image as an ordered list; list order is the
//! drawing order. The store enforces structural invariants only and knows
//! nothing about persistence formats.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::EditorError;
use crate::geometry::ImageSize;
use crate::model::{Annotation, HexColor, Label, Shape};

/// Annotations of a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAnnotations {
    name: String,
    size: ImageSize,
    annotations: Vec<Annotation>,
    /// Set on every mutation, cleared by the owner after saving or redrawing.
    #[serde(skip)]
    dirty: bool,
}

impl ImageAnnotations {
    pub fn new(name: impl Into<String>, size: ImageSize) -> Self {
        Self {
            name: name.into(),
            size,
            annotations: Vec::new(),
            dirty: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pixel dimensions used for all clamping.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[inline]
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Annotation> {
        self.annotations.get(index)
    }

    /// Mutable access; marks the list dirty.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Annotation> {
        let ann = self.annotations.get_mut(index);
        if ann.is_some() {
            self.dirty = true;
        }
        ann
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Append a validated annotation and return its index.
    pub fn push(&mut self, annotation: Annotation) -> Result<usize, EditorError> {
        annotation.shape.validate()?;
        self.annotations.push(annotation);
        self.dirty = true;
        Ok(self.annotations.len() - 1)
    }

    pub fn remove(&mut self, index: usize) -> Result<Annotation, EditorError> {
        if index >= self.annotations.len() {
            return Err(EditorError::index_out_of_range(index, self.annotations.len()));
        }
        self.dirty = true;
        Ok(self.annotations.remove(index))
    }

    /// Replace the geometry of one annotation.
    pub fn set_shape(&mut self, index: usize, shape: Shape) -> Result<(), EditorError> {
        let len = self.annotations.len();
        let ann = self
            .get_mut(index)
            .ok_or(EditorError::index_out_of_range(index, len))?;
        if ann.kind() != shape.kind() {
            return Err(EditorError::shape_mismatch(ann.kind(), shape.kind()));
        }
        ann.shape = shape;
        Ok(())
    }

    /// Give one annotation another label's name and color.
    pub fn relabel(&mut self, index: usize, label: &Label) -> Result<(), EditorError> {
        let len = self.annotations.len();
        let ann = self
            .get_mut(index)
            .ok_or(EditorError::index_out_of_range(index, len))?;
        ann.relabel(label);
        Ok(())
    }

    /// Remove every annotation, returning them.
    pub fn clear(&mut self) -> Vec<Annotation> {
        if !self.annotations.is_empty() {
            self.dirty = true;
        }
        std::mem::take(&mut self.annotations)
    }

    /// Swap in a whole list, e.g. when restoring a snapshot.
    pub fn replace_all(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
        self.dirty = true;
    }

    /// Remove all annotations carrying `label`; returns how many went.
    pub fn remove_label(&mut self, label: &str) -> usize {
        let before = self.annotations.len();
        self.annotations.retain(|a| a.label != label);
        let removed = before - self.annotations.len();
        if removed > 0 {
            self.dirty = true;
        }
        removed
    }

    /// Recolor all annotations carrying `label`; returns how many changed.
    pub fn recolor_label(&mut self, label: &str, color: &HexColor) -> usize {
        let mut changed = 0;
        for ann in self.annotations.iter_mut().filter(|a| a.label == label) {
            ann.color = color.clone();
            changed += 1;
        }
        if changed > 0 {
            self.dirty = true;
        }
        changed
    }
}

/// Annotations of every loaded image, keyed by image name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationStore {
    images: HashMap<String, ImageAnnotations>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the record for an image, updating its dimensions.
    pub fn open_image(&mut self, name: &str, size: ImageSize) -> &mut ImageAnnotations {
        let record = self
            .images
            .entry(name.to_string())
            .or_insert_with(|| ImageAnnotations::new(name, size));
        record.size = size;
        record
    }

    pub fn image(&self, name: &str) -> Option<&ImageAnnotations> {
        self.images.get(name)
    }

    pub fn image_mut(&mut self, name: &str) -> Option<&mut ImageAnnotations> {
        self.images.get_mut(name)
    }

    pub fn remove_image(&mut self, name: &str) -> Option<ImageAnnotations> {
        self.images.remove(name)
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageAnnotations> {
        self.images.values()
    }

    /// Total annotations across all images.
    pub fn total(&self) -> usize {
        self.images.values().map(ImageAnnotations::len).sum()
    }

    /// Delete every annotation with `label` on every image.
    pub fn delete_annotations_by_label(&mut self, label: &str) -> usize {
        let removed: usize = self
            .images
            .values_mut()
            .map(|img| img.remove_label(label))
            .sum();
        log::info!("Deleted {} annotations labelled '{}'", removed, label);
        removed
    }

    /// Apply a label's new color to every existing annotation with that label.
    pub fn update_annotation_colors(&mut self, label: &str, color: &HexColor) -> usize {
        let changed: usize = self
            .images
            .values_mut()
            .map(|img| img.recolor_label(label, color))
            .sum();
        log::info!("Recolored {} annotations labelled '{}' to {}", changed, label, color);
        changed
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
