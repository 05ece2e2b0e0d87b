//! Tunables for the crop editor, library fetches and the picker flow.
//!
//! All structs implement `Default` with the values the picker ships with,
//! and deserialize with every field optional so a host can override just
//! the keys it cares about:
//!
//! ```toml
//! edit_library_selection = true
//!
//! [editor]
//! min_box_size = 80.0
//! correction_delay_ms = 250
//!
//! [library]
//! selection_limit = 10
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{Aspect, FilterType};
use crate::geometry::EdgeInsets;

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Crop editor geometry and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Diameter of the on-screen corner handles. Hit zones reach twice this
    /// far from each corner.
    pub handle_diameter: f64,
    /// Smallest width and height the crop box may shrink to.
    pub min_box_size: f64,
    /// Crop box insets when a session starts and after reset.
    pub initial_insets: EdgeInsets,
    /// Band at the top and bottom of the editor the box may not enter.
    pub min_vertical_padding: f64,
    /// Quiet period after the last gesture before the correction pass runs.
    pub correction_delay_ms: u64,
    /// Duration of correction, fit and reset animations.
    pub animation_ms: u64,
    /// Duration of the animation that follows a handle drag.
    pub drag_animation_ms: u64,
    /// Resampling filter used when scaling the original at export.
    pub export_filter: FilterType,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            handle_diameter: 35.0,
            min_box_size: 100.0,
            initial_insets: EdgeInsets::new(90.0, 40.0, 40.0, 40.0),
            min_vertical_padding: 0.0,
            correction_delay_ms: 300,
            animation_ms: 300,
            drag_animation_ms: 100,
            export_filter: FilterType::Bilinear,
        }
    }
}

impl EditorConfig {
    pub fn correction_delay(&self) -> Duration {
        Duration::from_millis(self.correction_delay_ms)
    }

    pub fn animation(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    pub fn drag_animation(&self) -> Duration {
        Duration::from_millis(self.drag_animation_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_box_size.is_finite() && self.min_box_size > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "editor.min_box_size",
                reason: format!("must be positive, got {}", self.min_box_size),
            });
        }
        if !(self.min_vertical_padding.is_finite() && self.min_vertical_padding >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "editor.min_vertical_padding",
                reason: format!("must be non-negative, got {}", self.min_vertical_padding),
            });
        }
        if !(self.handle_diameter.is_finite() && self.handle_diameter >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "editor.handle_diameter",
                reason: format!("must be non-negative, got {}", self.handle_diameter),
            });
        }
        Ok(())
    }
}

/// Photo-library fetch behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Most assets a single batch pick returns.
    pub selection_limit: usize,
    /// Box every fetched image is downscaled to fit inside.
    pub target_width: u32,
    pub target_height: u32,
    /// Upper bound on how long one asset request may keep delivering.
    /// `None` waits indefinitely.
    pub request_timeout_ms: Option<u64>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            selection_limit: 5,
            target_width: 1170,
            target_height: 2532,
            request_timeout_ms: Some(30_000),
        }
    }
}

impl LibraryConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.target_width == 0 || self.target_height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "library.target_width/target_height",
                reason: "target size must be non-empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Everything the picker flow needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    pub editor: EditorConfig,
    pub library: LibraryConfig,
    /// Open the crop editor for library picks too, not only camera captures.
    pub edit_library_selection: bool,
    /// Shape captures are turned to before editing; `None` keeps them as shot.
    pub desired_aspect: Option<Aspect>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            editor: EditorConfig::default(),
            library: LibraryConfig::default(),
            edit_library_selection: false,
            desired_aspect: Some(Aspect::Portrait),
        }
    }
}

impl PickerConfig {
    /// Parse a (possibly partial) TOML document; missing keys keep defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: PickerConfig = toml::from_str(source)?;
        config.editor.validate()?;
        config.library.validate()?;
        Ok(config)
    }
}
