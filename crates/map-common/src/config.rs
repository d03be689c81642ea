//! Application configuration.
//!
//! The configuration is loaded once at startup from a JSON or YAML file and
//! describes every projection, imagery source, layer and palette the client
//! knows about.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::info;

use crate::palette::PaletteConfig;
use crate::{
    LayerDefinition, LayerId, MapError, MapResult, ProjectionDescriptor, ProjectionId,
    SourceDescriptor,
};

/// Root configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub defaults: Defaults,

    pub projections: BTreeMap<ProjectionId, ProjectionDescriptor>,

    #[serde(default)]
    pub sources: HashMap<String, SourceDescriptor>,

    #[serde(default)]
    pub layers: BTreeMap<LayerId, LayerDefinition>,

    #[serde(default)]
    pub palettes: PaletteConfig,

    #[serde(default)]
    pub map: MapSettings,

    #[serde(default)]
    pub parameters: Parameters,
}

/// Startup selections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    pub projection: ProjectionId,
}

/// Tunables of the map layer engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSettings {
    /// Maximum number of constructed layers kept for reuse
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Minimum interval between extent publications, in milliseconds
    #[serde(default = "default_extent_interval_ms")]
    pub extent_interval_ms: u64,
}

fn default_cache_capacity() -> usize {
    100
}

fn default_extent_interval_ms() -> u64 {
    500
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            extent_interval_ms: default_extent_interval_ms(),
        }
    }
}

/// Runtime switches.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    /// Skip map construction entirely
    #[serde(default)]
    pub mock_map: bool,
}

impl AppConfig {
    /// Load configuration from a file, choosing the format by extension
    /// (`.yaml`/`.yml` for YAML, anything else for JSON).
    pub fn from_file(path: impl AsRef<Path>) -> MapResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content)?,
            _ => Self::from_json(&content)?,
        };
        info!(
            path = %path.display(),
            projections = config.projections.len(),
            layers = config.layers.len(),
            sources = config.sources.len(),
            "Loaded map configuration"
        );
        Ok(config)
    }

    pub fn from_json(json: &str) -> MapResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_yaml(yaml: &str) -> MapResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn projection(&self, id: &ProjectionId) -> MapResult<&ProjectionDescriptor> {
        self.projections
            .get(id)
            .ok_or_else(|| MapError::UnknownProjection(id.to_string()))
    }

    pub fn layer(&self, id: &str) -> Option<&LayerDefinition> {
        self.layers.get(id)
    }

    pub fn source(&self, id: &str) -> Option<&SourceDescriptor> {
        self.sources.get(id)
    }

    /// Check cross references between sections.
    ///
    /// Sources and matrix sets are deliberately not checked here: a bad
    /// reference only breaks the one layer that uses it, and is reported when
    /// that layer is constructed.
    pub fn validate(&self) -> MapResult<()> {
        if !self.projections.contains_key(&self.defaults.projection) {
            return Err(MapError::Configuration(format!(
                "default projection '{}' is not defined",
                self.defaults.projection
            )));
        }
        if self.map.cache_capacity == 0 {
            return Err(MapError::Configuration(
                "map.cacheCapacity must be greater than zero".to_string(),
            ));
        }
        for (key, proj) in &self.projections {
            if key != &proj.id {
                return Err(MapError::Configuration(format!(
                    "projection '{}' is declared under key '{}'",
                    proj.id, key
                )));
            }
        }
        for (key, layer) in &self.layers {
            if key != &layer.id {
                return Err(MapError::Configuration(format!(
                    "layer '{}' is declared under key '{}'",
                    layer.id, key
                )));
            }
            for proj in layer.projections.keys() {
                if !self.projections.contains_key(proj) {
                    return Err(MapError::Configuration(format!(
                        "layer '{}' references unknown projection '{}'",
                        layer.id, proj
                    )));
                }
            }
            if let Some(palette) = &layer.palette {
                if !self.palettes.rendered.contains_key(&palette.id) {
                    return Err(MapError::Configuration(format!(
                        "layer '{}' references unknown palette '{}'",
                        layer.id, palette.id
                    )));
                }
            }
        }
        Ok(())
    }
}
