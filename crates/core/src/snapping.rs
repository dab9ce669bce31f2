//! Drop-point snapping
//!
//! Two optional adjustments run on a dropped document point:
//! 1. Grid snapping rounds the point to the nearest grid intersection before
//!    the zone is resolved
//! 2. Zone centering moves the point to the center of the zone it landed in

use crate::geometry::DocumentPoint;
use crate::zone::Zone;
use serde::{Deserialize, Serialize};

/// Configuration for snapping behavior
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    /// Grid spacing in document units; `None` disables grid snapping
    pub grid_spacing: Option<f64>,

    /// Move dropped markers to the center of their containing zone
    pub center_in_zone: bool,
}

impl SnapConfig {
    /// Snapping turned off
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_grid(mut self, spacing: f64) -> Self {
        self.grid_spacing = Some(spacing);
        self
    }

    pub fn with_zone_centering(mut self, enabled: bool) -> Self {
        self.center_in_zone = enabled;
        self
    }
}

/// Applies a [`SnapConfig`] to drop points
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GridSnapper {
    config: SnapConfig,
}

impl GridSnapper {
    pub fn new(config: SnapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// Round `point` to the nearest grid intersection
    ///
    /// Non-positive or non-finite spacing leaves the point unchanged.
    pub fn snap_to_grid(&self, point: DocumentPoint) -> DocumentPoint {
        match self.config.grid_spacing {
            Some(spacing) if spacing.is_finite() && spacing > 0.0 => DocumentPoint::new(
                (point.x / spacing).round() * spacing,
                (point.y / spacing).round() * spacing,
            ),
            _ => point,
        }
    }

    /// Final resting point once the containing zone is known
    pub fn settle_in_zone(&self, point: DocumentPoint, zone: Option<&Zone>) -> DocumentPoint {
        match zone {
            Some(zone) if self.config.center_in_zone => zone.bounds().center(),
            _ => point,
        }
    }
}
