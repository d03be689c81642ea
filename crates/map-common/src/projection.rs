//! Projection descriptors.
//!
//! One descriptor exists per supported projection. Descriptors are loaded at
//! startup and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

use crate::{BoundingBox, CrsCode};

/// Identifier of a configured projection (e.g. "geographic", "arctic").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectionId(pub String);

impl ProjectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ProjectionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProjectionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Static description of one map projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionDescriptor {
    pub id: ProjectionId,

    /// Numeric EPSG code
    pub epsg: u32,

    /// Coordinate reference system
    pub crs: CrsCode,

    /// Maximum extent in map units. Defaults to the valid bounds of the CRS.
    #[serde(default)]
    pub max_extent: Option<BoundingBox>,

    /// Resolutions (map units per pixel) for each zoom level, coarsest first
    #[serde(default)]
    pub resolutions: Vec<f64>,

    /// Initial viewport center
    #[serde(default)]
    pub start_center: Option<(f64, f64)>,

    /// Initial zoom level
    #[serde(default)]
    pub start_zoom: u32,

    /// Highest zoom level. Defaults to the number of resolutions.
    #[serde(default)]
    pub num_zoom_levels: Option<u32>,
}

impl ProjectionDescriptor {
    /// Maximum extent of the projection.
    pub fn extent(&self) -> BoundingBox {
        self.max_extent.unwrap_or_else(|| self.crs.valid_bounds())
    }

    /// Origin of every tile grid in this projection (top-left of the extent).
    pub fn origin(&self) -> (f64, f64) {
        self.extent().top_left()
    }

    /// Highest zoom level the view may reach.
    pub fn max_zoom(&self) -> u32 {
        self.num_zoom_levels
            .unwrap_or_else(|| self.resolutions.len() as u32)
    }

    /// Resolution at a zoom level. Falls back to fitting the extent width in
    /// 512 pixels halved per level when no resolutions are configured.
    pub fn resolution_at(&self, zoom: u32) -> f64 {
        match self.resolutions.get(zoom as usize) {
            Some(res) => *res,
            None => {
                let base = self
                    .resolutions
                    .first()
                    .copied()
                    .unwrap_or_else(|| self.extent().width() / 512.0);
                base / 2f64.powi(zoom as i32)
            }
        }
    }

    /// Initial viewport center. Defaults to the center of the extent.
    pub fn initial_center(&self) -> (f64, f64) {
        self.start_center.unwrap_or_else(|| self.extent().center())
    }

    pub fn is_geographic(&self) -> bool {
        self.crs.is_geographic()
    }
}
