//! Editor configuration.
//!
//! All tunable thresholds live in one serializable struct so a host
//! application can load them from a JSON file. Missing fields fall back
//! to the defaults in [`crate::constants`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants;
use crate::geometry::RepairLimits;

/// Log level setting for the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Thresholds and limits for every editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Version of the configuration file format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Minimum drag extent (image px) for a rectangle or box prompt
    #[serde(default = "default_min_drag_distance")]
    pub min_drag_distance: f64,

    /// Resize handle side length in screen pixels
    #[serde(default = "default_handle_size")]
    pub handle_size: f64,

    /// Squared distance under which a polygon click repeats the last vertex
    #[serde(default = "default_polygon_min_point_dist_sq")]
    pub polygon_min_point_dist_sq: f64,

    /// Smallest committed polygon area in px²
    #[serde(default = "default_polygon_min_area")]
    pub polygon_min_area: f64,

    /// Shortest first edge of an oriented box
    #[serde(default = "default_obb_min_edge")]
    pub obb_min_edge: f64,

    /// Smallest committed oriented box side
    #[serde(default = "default_obb_min_size")]
    pub obb_min_size: f64,

    /// Radius of the oriented box rotate handle in screen pixels
    #[serde(default = "default_obb_center_handle_radius")]
    pub obb_center_handle_radius: f64,

    /// Wheel rotation step in degrees
    #[serde(default = "default_rotate_step_degrees")]
    pub rotate_step_degrees: f64,

    /// Assist prompt handle size in screen pixels
    #[serde(default = "default_assist_handle_size")]
    pub assist_handle_size: f64,

    /// How close to a box prompt's border a click must land, in screen pixels
    #[serde(default = "default_assist_border_tolerance")]
    pub assist_border_tolerance: f64,

    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,

    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,

    /// Relative zoom change per wheel notch
    #[serde(default = "default_zoom_sensitivity")]
    pub zoom_sensitivity: f64,

    /// Arrow-key nudge step in screen pixels
    #[serde(default = "default_nudge_step")]
    pub nudge_step: f64,

    /// Arrow-key nudge step with the coarse modifier
    #[serde(default = "default_nudge_step_coarse")]
    pub nudge_step_coarse: f64,

    /// Snapshots kept per image by the undo history
    #[serde(default = "default_undo_limit")]
    pub undo_limit: usize,

    /// Longest raster side used by polygon repair
    #[serde(default = "default_repair_max_dimension")]
    pub repair_max_dimension: f64,

    /// Border around the repair raster, in raster pixels
    #[serde(default = "default_repair_padding")]
    pub repair_padding: u32,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_min_drag_distance() -> f64 {
    constants::interaction::MIN_DRAG_DISTANCE
}

fn default_handle_size() -> f64 {
    constants::interaction::HANDLE_SIZE_SCREEN
}

fn default_polygon_min_point_dist_sq() -> f64 {
    constants::polygon::MIN_POINT_DIST_SQ
}

fn default_polygon_min_area() -> f64 {
    constants::polygon::MIN_AREA
}

fn default_obb_min_edge() -> f64 {
    constants::obb::MIN_EDGE_LENGTH
}

fn default_obb_min_size() -> f64 {
    constants::obb::MIN_SIZE
}

fn default_obb_center_handle_radius() -> f64 {
    constants::obb::CENTER_HANDLE_RADIUS
}

fn default_rotate_step_degrees() -> f64 {
    constants::obb::ROTATE_STEP_DEGREES
}

fn default_assist_handle_size() -> f64 {
    constants::assist::HANDLE_SIZE_SCREEN
}

fn default_assist_border_tolerance() -> f64 {
    constants::assist::BORDER_HIT_TOLERANCE
}

fn default_min_zoom() -> f64 {
    constants::zoom::MIN
}

fn default_max_zoom() -> f64 {
    constants::zoom::MAX
}

fn default_zoom_sensitivity() -> f64 {
    constants::zoom::SENSITIVITY
}

fn default_nudge_step() -> f64 {
    constants::interaction::NUDGE_STEP_SCREEN
}

fn default_nudge_step_coarse() -> f64 {
    constants::interaction::NUDGE_STEP_COARSE_SCREEN
}

fn default_undo_limit() -> usize {
    constants::UNDO_HISTORY_LIMIT
}

fn default_repair_max_dimension() -> f64 {
    constants::repair::MAX_DIMENSION
}

fn default_repair_padding() -> u32 {
    constants::repair::PADDING
}

impl EditorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            min_drag_distance: default_min_drag_distance(),
            handle_size: default_handle_size(),
            polygon_min_point_dist_sq: default_polygon_min_point_dist_sq(),
            polygon_min_area: default_polygon_min_area(),
            obb_min_edge: default_obb_min_edge(),
            obb_min_size: default_obb_min_size(),
            obb_center_handle_radius: default_obb_center_handle_radius(),
            rotate_step_degrees: default_rotate_step_degrees(),
            assist_handle_size: default_assist_handle_size(),
            assist_border_tolerance: default_assist_border_tolerance(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            zoom_sensitivity: default_zoom_sensitivity(),
            nudge_step: default_nudge_step(),
            nudge_step_coarse: default_nudge_step_coarse(),
            undo_limit: default_undo_limit(),
            repair_max_dimension: default_repair_max_dimension(),
            repair_padding: default_repair_padding(),
            log_level: LogLevel::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        if config.min_zoom <= 0.0 || config.min_zoom > config.max_zoom {
            return Err(ConfigError::InvalidValue(format!(
                "zoom range [{}, {}] is empty or non-positive",
                config.min_zoom, config.max_zoom
            )));
        }

        if config.repair_max_dimension <= 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "repair_max_dimension must be positive, got {}",
                config.repair_max_dimension
            )));
        }

        Ok(config)
    }

    /// Raster limits for polygon repair.
    pub fn repair_limits(&self) -> RepairLimits {
        RepairLimits {
            max_dimension: self.repair_max_dimension,
            padding: self.repair_padding,
        }
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "annokit.json"
    }

    /// Get the default config file path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("annokit").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("annokit")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded editor configuration from {:?}", path);
        Ok(config)
    }

    /// Try the default path, falling back to defaults on any problem.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!("Failed to load config file {:?}: {}", path, e);
            Self::default()
        })
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved editor configuration to {:?}", path);
        Ok(())
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// A value is outside its usable range
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
