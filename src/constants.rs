//! Default thresholds for the annotation editors.
//!
//! Every value here can be overridden through [`crate::config::EditorConfig`];
//! these are the defaults a fresh configuration starts from.

/// Interaction thresholds shared by all editors.
pub mod interaction {
    /// Minimum drag extent (image px) for a drag to count as a shape.
    pub const MIN_DRAG_DISTANCE: f64 = 5.0;

    /// Side length of a resize handle in screen pixels.
    pub const HANDLE_SIZE_SCREEN: f64 = 20.0;

    /// Arrow-key nudge step in screen pixels.
    pub const NUDGE_STEP_SCREEN: f64 = 5.0;

    /// Arrow-key nudge step in screen pixels with the coarse modifier held.
    pub const NUDGE_STEP_COARSE_SCREEN: f64 = 20.0;
}

/// Zoom and pan limits.
pub mod zoom {
    pub const MIN: f64 = 0.1;
    pub const MAX: f64 = 10.0;

    /// Relative zoom change per wheel notch.
    pub const SENSITIVITY: f64 = 0.1;

    /// Share of the canvas the image occupies after fit-to-view.
    pub const FIT_MARGIN: f64 = 0.95;
}

/// Polygon editor thresholds.
pub mod polygon {
    pub const MIN_VERTICES: usize = 3;

    /// Squared distance below which a click repeats the previous vertex.
    pub const MIN_POINT_DIST_SQ: f64 = 25.0;

    /// Smallest committed polygon area in px².
    pub const MIN_AREA: f64 = 5.0;
}

/// Oriented bounding box editor thresholds.
pub mod obb {
    /// Shortest first edge that advances the three-click protocol.
    pub const MIN_EDGE_LENGTH: f64 = 5.0;

    /// Boxes narrower than this on either side are discarded.
    pub const MIN_SIZE: f64 = 2.0;

    /// Radius of the center rotate handle in screen pixels.
    pub const CENTER_HANDLE_RADIUS: f64 = 6.0;

    /// Wheel rotation step in degrees.
    pub const ROTATE_STEP_DEGREES: f64 = 5.0;

    /// Length of the direction indicator drawn from the center, in screen pixels.
    pub const DIRECTION_ARROW_LENGTH: f64 = 30.0;
}

/// Assist prompt editor thresholds.
pub mod assist {
    pub const HANDLE_SIZE_SCREEN: f64 = 14.0;

    /// Distance from a box prompt's border that still counts as a hit.
    pub const BORDER_HIT_TOLERANCE: f64 = 5.0;

    /// Radius of a point prompt disc in screen pixels.
    pub const POINT_RADIUS: f64 = 8.0;

    pub const POSITIVE_COLOR: [u8; 3] = [0, 255, 255];
    pub const NEGATIVE_COLOR: [u8; 3] = [255, 0, 0];

    /// Arrow color while an orientation is being picked.
    pub const PENDING_ARROW_COLOR: [u8; 3] = [255, 0, 255];

    /// Orientation arrow length in screen pixels.
    pub const ARROW_LENGTH: f64 = 40.0;

    /// Separator between label and orientation in encoded prompt labels.
    pub const ORIENTATION_SEPARATOR: &str = ":::";

    pub const DEFAULT_CONFIDENCE: f64 = 0.5;
}

/// Mask projection repair parameters.
pub mod repair {
    /// Longest raster side; larger images are downscaled.
    pub const MAX_DIMENSION: f64 = 4000.0;

    /// Empty border around the rasterized shape, in raster pixels.
    pub const PADDING: u32 = 20;

    /// Outline width added to the filled path.
    pub const STROKE_WIDTH: f32 = 2.0;

    /// Alpha above which a raster pixel counts as solid.
    pub const ALPHA_THRESHOLD: u8 = 128;
}

/// Rendering contract defaults.
pub mod render {
    pub const STROKE_WIDTH: f64 = 1.5;
    pub const SELECTED_STROKE_WIDTH: f64 = 3.0;
    pub const FILL_ALPHA: f64 = 0.3;
    pub const MIN_FONT_SIZE: f64 = 12.0;
    pub const FONT_SIZE_SCREEN: f64 = 14.0;
    pub const LABEL_OFFSET_SCREEN: f64 = 5.0;
    pub const HANDLE_ALPHA: f64 = 0.7;
    pub const HANDLE_HOVER_ALPHA: f64 = 0.9;
    pub const HANDLE_DRAG_ALPHA: f64 = 0.95;
    pub const PREVIEW_FILL_ALPHA: f64 = 0.4;
    pub const PREVIEW_STROKE_WIDTH: f64 = 2.0;
    pub const TEXT_HALO_WIDTH: f64 = 3.0;

    pub const WHITE: [u8; 3] = [255, 255, 255];
    pub const BLACK: [u8; 3] = [0, 0, 0];
    pub const YELLOW: [u8; 3] = [255, 255, 0];
    pub const RED: [u8; 3] = [255, 0, 0];

    pub const CROSSHAIR_ALPHA: f64 = 0.5;
}

/// Snapshot history depth.
pub const UNDO_HISTORY_LIMIT: usize = 20;
