//! Imagery source descriptors.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A remote imagery endpoint and the tile matrix sets it publishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    /// Base endpoint URL
    pub url: String,

    /// Tile matrix sets by identifier (WMTS sources only)
    #[serde(default)]
    pub matrix_sets: HashMap<String, MatrixSet>,
}

impl SourceDescriptor {
    pub fn matrix_set(&self, id: &str) -> Option<&MatrixSet> {
        self.matrix_sets.get(id)
    }
}

/// A tile matrix set: the native resolutions of a WMTS source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixSet {
    pub id: String,

    /// Map units per pixel, one per tile matrix, coarsest first
    pub resolutions: Vec<f64>,

    /// Tile width and height in pixels
    #[serde(default = "default_tile_size")]
    pub tile_size: [u32; 2],
}

fn default_tile_size() -> [u32; 2] {
    [512, 512]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        let source: SourceDescriptor = serde_json::from_str(
            r#"{"url": "https://gibs.example/wmts/epsg4326/best/wmts.cgi",
                "matrixSets": {"EPSG4326_250m": {"id": "EPSG4326_250m",
                    "resolutions": [0.5625, 0.28125], "tileSize": [512, 512]}}}"#,
        )
        .unwrap();
        let set = source.matrix_set("EPSG4326_250m").unwrap();
        assert_eq!(set.resolutions.len(), 2);
        assert!(source.matrix_set("EPSG4326_1km").is_none());
    }
}
