//! Tile grids anchored at a projection origin.
//!
//! A grid maps a zoom level to a resolution and a tile addressing scheme:
//! columns grow to the east and rows grow to the south of the origin.

use crate::{BoundingBox, MatrixSet};
use serde::{Deserialize, Serialize};

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level (index into the grid resolutions)
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }
}

/// Mapping from zoom level to tile addressing for one projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGrid {
    /// Top-left corner of the grid in map units
    pub origin: (f64, f64),

    /// Map units per pixel for each zoom level
    pub resolutions: Vec<f64>,

    /// Tile matrix identifiers, parallel to `resolutions`. Empty for grids
    /// that address tiles by bounding box only.
    pub matrix_ids: Vec<String>,

    /// Square tile edge in pixels
    pub tile_size: u32,
}

impl TileGrid {
    /// Grid for a WMTS matrix set. Matrix ids are the zoom indices.
    pub fn for_matrix_set(origin: (f64, f64), matrix_set: &MatrixSet) -> Self {
        Self {
            origin,
            resolutions: matrix_set.resolutions.clone(),
            matrix_ids: (0..matrix_set.resolutions.len())
                .map(|i| i.to_string())
                .collect(),
            tile_size: matrix_set.tile_size[0],
        }
    }

    /// Grid for bounding-box addressed requests.
    pub fn new(origin: (f64, f64), resolutions: Vec<f64>, tile_size: u32) -> Self {
        Self {
            origin,
            resolutions,
            matrix_ids: Vec::new(),
            tile_size,
        }
    }

    pub fn num_levels(&self) -> usize {
        self.resolutions.len()
    }

    /// Tile matrix identifier for a zoom level.
    pub fn matrix_id(&self, z: u32) -> Option<&str> {
        self.matrix_ids.get(z as usize).map(String::as_str)
    }

    fn tile_span(&self, z: u32) -> Option<f64> {
        self.resolutions
            .get(z as usize)
            .map(|res| res * self.tile_size as f64)
    }

    /// Get the bounding box covered by a tile.
    pub fn tile_bbox(&self, coord: &TileCoord) -> Option<BoundingBox> {
        let span = self.tile_span(coord.z)?;
        let min_x = self.origin.0 + coord.x as f64 * span;
        let max_y = self.origin.1 - coord.y as f64 * span;
        Some(BoundingBox::new(min_x, max_y - span, min_x + span, max_y))
    }

    /// Find which tile contains a given coordinate at a zoom level.
    pub fn coord_to_tile(&self, z: u32, x: f64, y: f64) -> Option<TileCoord> {
        let span = self.tile_span(z)?;
        let col = ((x - self.origin.0) / span).floor();
        let row = ((self.origin.1 - y) / span).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        Some(TileCoord::new(z, col as u32, row as u32))
    }
}
