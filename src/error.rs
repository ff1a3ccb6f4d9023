//! Error and rejection types.

use thiserror::Error;

use crate::model::ShapeKind;

/// Contract violations: the caller handed an editor something it cannot
/// work with. These never come from user gestures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    /// An editor received a shape of another kind
    #[error("Shape mismatch: expected {expected}, found {found}")]
    ShapeMismatch {
        /// Kind the editor handles
        expected: ShapeKind,
        /// Kind that was passed in
        found: ShapeKind,
    },

    /// Annotation or prompt index outside the current list
    #[error("Index {index} out of range for {len} items")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Current list length
        len: usize,
    },

    /// Drawing requires a current label
    #[error("No label selected")]
    NoLabel,

    /// Geometry violates the shape's structural invariants
    #[error("Invalid shape: {message}")]
    InvalidShape {
        /// What is wrong with it
        message: String,
    },

    /// Color string is not `#rrggbb`
    #[error("Invalid color '{value}', expected #rrggbb")]
    InvalidColor {
        /// The rejected input
        value: String,
    },
}

impl EditorError {
    /// Create a shape mismatch error.
    pub fn shape_mismatch(expected: ShapeKind, found: ShapeKind) -> Self {
        Self::ShapeMismatch { expected, found }
    }

    /// Create an out-of-range error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Create an invalid shape error with a message.
    pub fn invalid_shape(message: impl Into<String>) -> Self {
        Self::InvalidShape {
            message: message.into(),
        }
    }

    /// Create an invalid color error.
    pub fn invalid_color(value: impl Into<String>) -> Self {
        Self::InvalidColor {
            value: value.into(),
        }
    }
}

/// Why a finished gesture produced no shape.
///
/// Rejections are advisories, not failures: the gesture is discarded and
/// the user can simply try again.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    /// Both drag extents fell below the minimum
    #[error("Drag of {width:.1}x{height:.1} px is below the {min} px minimum")]
    DragTooShort {
        /// Horizontal drag extent
        width: f64,
        /// Vertical drag extent
        height: f64,
        /// Configured minimum
        min: f64,
    },

    /// The shape collapsed after clamping to the image
    #[error("Shape lies outside the image")]
    OutsideImage,

    /// Closing a polygon with too few vertices
    #[error("Polygon needs at least {min} vertices, got {count}")]
    TooFewVertices {
        /// Vertices placed
        count: usize,
        /// Required minimum
        min: usize,
    },

    /// Polygon area after repair is below the minimum
    #[error("Polygon area {area:.1} px² is below the {min} px² minimum")]
    AreaTooSmall {
        /// Resulting area
        area: f64,
        /// Configured minimum
        min: f64,
    },

    /// Oriented box narrower than the minimum on some side
    #[error("Oriented box {width:.1}x{height:.1} px is below the {min} px minimum")]
    BoxTooSmall {
        /// Box width
        width: f64,
        /// Box height
        height: f64,
        /// Configured minimum
        min: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EditorError::shape_mismatch(ShapeKind::Rect, ShapeKind::Polygon);
        assert_eq!(
            err.to_string(),
            "Shape mismatch: expected rect, found polygon"
        );
        assert_eq!(
            EditorError::index_out_of_range(4, 2).to_string(),
            "Index 4 out of range for 2 items"
        );
    }

    #[test]
    fn test_rejection_messages() {
        let r = Rejection::TooFewVertices { count: 2, min: 3 };
        assert_eq!(r.to_string(), "Polygon needs at least 3 vertices, got 2");
    }
}
