//! Snapshot-based undo for annotation lists.
//!
//! The editors never mutate history themselves. Before the first mutating
//! step of a gesture they hand the current annotation list to an
//! [`UndoSink`]; restoring is the owner's business. [`SnapshotHistory`] is
//! the bundled sink: a bounded stack of whole-list snapshots per image.

use std::collections::HashMap;

use crate::config::EditorConfig;
use crate::constants::UNDO_HISTORY_LIMIT;
use crate::model::Annotation;
use crate::store::ImageAnnotations;

/// Receives a snapshot of an image's annotations before they change.
pub trait UndoSink {
    fn push_snapshot(&mut self, image: &ImageAnnotations);
}

/// Sink that discards snapshots, for hosts without undo.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUndo;

impl UndoSink for NoUndo {
    fn push_snapshot(&mut self, _image: &ImageAnnotations) {}
}

/// Bounded per-image stacks of annotation list snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotHistory {
    /// Snapshots keyed by image name, most recent at the end
    stacks: HashMap<String, Vec<Vec<Annotation>>>,
    /// Maximum snapshots kept per image
    limit: usize,
}

impl Default for SnapshotHistory {
    fn default() -> Self {
        Self::with_limit(UNDO_HISTORY_LIMIT)
    }
}

impl SnapshotHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// History sized by [`EditorConfig::undo_limit`].
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::with_limit(config.undo_limit)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            stacks: HashMap::new(),
            limit: limit.max(1),
        }
    }

    /// Check if the image has anything to undo.
    pub fn can_undo(&self, image: &str) -> bool {
        self.stacks.get(image).is_some_and(|s| !s.is_empty())
    }

    /// Number of snapshots held for an image.
    pub fn depth(&self, image: &str) -> usize {
        self.stacks.get(image).map_or(0, Vec::len)
    }

    /// Restore the most recent snapshot into `image`.
    ///
    /// Returns false when there is nothing to restore.
    pub fn undo(&mut self, image: &mut ImageAnnotations) -> bool {
        let Some(snapshot) = self.stacks.get_mut(image.name()).and_then(Vec::pop) else {
            log::debug!("Undo: nothing to undo for '{}'", image.name());
            return false;
        };
        log::debug!(
            "Undo: restored {} annotations on '{}'",
            snapshot.len(),
            image.name()
        );
        image.replace_all(snapshot);
        true
    }

    /// Drop the history of one image.
    pub fn forget(&mut self, image: &str) {
        self.stacks.remove(image);
    }

    pub fn clear(&mut self) {
        self.stacks.clear();
    }
}

impl UndoSink for SnapshotHistory {
    fn push_snapshot(&mut self, image: &ImageAnnotations) {
        let stack = self.stacks.entry(image.name().to_string()).or_default();
        stack.push(image.as_slice().to_vec());

        // Limit history size
        if stack.len() > self.limit {
            let excess = stack.len() - self.limit;
            stack.drain(..excess);
        }
        log::debug!(
            "Undo: snapshot of {} annotations on '{}' ({} held)",
            image.len(),
            image.name(),
            stack.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ImageSize, Rect};
    use crate::model::{Label, Shape};

    fn image_with(n: usize) -> ImageAnnotations {
        let label = Label::parse("car", "#ff0000").unwrap();
        let mut img = ImageAnnotations::new("a.png", ImageSize::new(100.0, 100.0));
        for i in 0..n {
            let x = i as f64 * 10.0;
            img.push(Annotation::new(Shape::Rect(Rect::new(x, 0.0, 5.0, 5.0)), &label))
                .unwrap();
        }
        img
    }

    #[test]
    fn test_undo_restores_snapshot() {
        let mut history = SnapshotHistory::new();
        let mut img = image_with(1);
        history.push_snapshot(&img);
        img.clear();
        assert!(history.can_undo("a.png"));
        assert!(history.undo(&mut img));
        assert_eq!(img.len(), 1);
        assert!(!history.can_undo("a.png"));
        assert!(!history.undo(&mut img));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut history = SnapshotHistory::with_limit(3);
        for n in 0..5 {
            history.push_snapshot(&image_with(n));
        }
        assert_eq!(history.depth("a.png"), 3);
        // Oldest surviving snapshot holds 2 annotations.
        let mut img = image_with(0);
        for _ in 0..3 {
            history.undo(&mut img);
        }
        assert_eq!(img.len(), 2);
    }

    #[test]
    fn test_limit_from_config() {
        let config = EditorConfig {
            undo_limit: 2,
            ..EditorConfig::default()
        };
        let mut history = SnapshotHistory::from_config(&config);
        for n in 0..4 {
            history.push_snapshot(&image_with(n));
        }
        assert_eq!(history.depth("a.png"), 2);
    }

    #[test]
    fn test_histories_are_per_image() {
        let mut history = SnapshotHistory::new();
        history.push_snapshot(&image_with(2));
        assert!(!history.can_undo("b.png"));
        history.forget("a.png");
        assert!(!history.can_undo("a.png"));
    }
}
