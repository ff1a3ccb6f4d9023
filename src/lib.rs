//! annokit - geometry and interaction core for image annotation editors.
//!
//! The crate turns pointer and keyboard input into validated annotation
//! geometry: axis-aligned rectangles, polygons and oriented boxes, plus
//! point and box prompts for an external segmentation model. It does no
//! drawing itself; editors describe what to draw as [`editors::Primitive`]s.
//!
//! - [`geometry`]: pure image-space math (clamping, containment, polygon
//!   repair, oriented box fitting)
//! - [`editors`]: per-shape drawing and editing state machines
//! - [`assist`]: segmentation prompts and response handling
//! - [`controller`]: mode, viewport and hit resolution on top of the editors
//! - [`store`] and [`undo`]: per-image annotation lists and snapshot history

pub mod assist;
pub mod config;
pub mod constants;
pub mod controller;
pub mod editors;
pub mod error;
pub mod events;
pub mod geometry;
pub mod model;
pub mod store;
pub mod undo;

pub use config::{ConfigError, EditorConfig};
pub use controller::{EditorContext, InteractionController, ToolMode};
pub use error::{EditorError, Rejection};
pub use events::{Advisory, EditorEvent, Notifier};
pub use model::{Annotation, AssistPrompt, Label, Shape, ShapeKind};
pub use store::{AnnotationStore, ImageAnnotations};
pub use undo::{NoUndo, SnapshotHistory, UndoSink};
