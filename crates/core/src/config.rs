//! Placement engine configuration
//!
//! Configuration can be created programmatically, loaded from a TOML file, or
//! overridden from environment variables.

use crate::coordinates::DEFAULT_TRANSFORM_EPSILON;
use crate::snapping::SnapConfig;
use crate::zone::ZoneSelector;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

/// Storage key used when none is configured
pub const DEFAULT_STORAGE_KEY: &str = "svg-items";

/// Environment variable overriding [`PlacementConfig::storage_key`]
pub const ENV_STORAGE_KEY: &str = "SENSOR_LAYOUT_STORAGE_KEY";

/// Environment variable setting the snap grid spacing (`0` disables it)
pub const ENV_SNAP_GRID: &str = "SENSOR_LAYOUT_SNAP_GRID";

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {0}")]
    InvalidValue(String),
}

/// Settings for a [`PlacementEngine`](crate::PlacementEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Key the layout is persisted under
    pub storage_key: String,

    /// Drop-point snapping
    pub snap: SnapConfig,

    /// Which document elements count as zones
    pub zone_selector: ZoneSelector,

    /// Drop the in-memory markers whenever a new document is loaded
    pub reset_markers_on_document_change: bool,

    /// Determinant magnitude below which a viewport counts as degenerate
    pub transform_epsilon: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_owned(),
            snap: SnapConfig::default(),
            zone_selector: ZoneSelector::default(),
            reset_markers_on_document_change: true,
            transform_epsilon: DEFAULT_TRANSFORM_EPSILON,
        }
    }
}

impl PlacementConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_snap(mut self, snap: SnapConfig) -> Self {
        self.snap = snap;
        self
    }

    pub fn with_zone_selector(mut self, selector: ZoneSelector) -> Self {
        self.zone_selector = selector;
        self
    }

    pub fn with_reset_on_document_change(mut self, reset: bool) -> Self {
        self.reset_markers_on_document_change = reset;
        self
    }

    pub fn with_transform_epsilon(mut self, epsilon: f64) -> Self {
        self.transform_epsilon = epsilon;
        self
    }

    /// Load configuration from a TOML file
    ///
    /// Missing keys keep their defaults:
    /// ```toml
    /// storage_key = "floor-2"
    /// reset_markers_on_document_change = false
    ///
    /// [snap]
    /// grid_spacing = 10.0
    /// center_in_zone = true
    ///
    /// [zone_selector]
    /// id_prefixes = ["room"]
    /// classes = ["zone"]
    /// tags = []
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Apply `SENSOR_LAYOUT_*` overrides on top of this configuration
    ///
    /// Environment variables:
    /// - `SENSOR_LAYOUT_STORAGE_KEY`: storage key
    /// - `SENSOR_LAYOUT_SNAP_GRID`: grid spacing in document units, `0` to disable
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(key) = std::env::var(ENV_STORAGE_KEY) {
            self.storage_key = key;
        }

        if let Ok(val) = std::env::var(ENV_SNAP_GRID) {
            let spacing = val
                .trim()
                .parse::<f64>()
                .map_err(|_| ConfigError::InvalidValue(ENV_SNAP_GRID.to_owned()))?;
            self.snap.grid_spacing = (spacing > 0.0).then_some(spacing);
        }

        self.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue("storage_key".to_owned()));
        }

        if let Some(spacing) = self.snap.grid_spacing {
            if !spacing.is_finite() || spacing <= 0.0 {
                return Err(ConfigError::InvalidValue("snap.grid_spacing".to_owned()));
            }
        }

        if !self.transform_epsilon.is_finite() || self.transform_epsilon < 0.0 {
            return Err(ConfigError::InvalidValue("transform_epsilon".to_owned()));
        }

        Ok(self)
    }
}
