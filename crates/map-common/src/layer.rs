//! Layer definitions.
//!
//! A [`LayerDefinition`] is an immutable template loaded with the
//! configuration. Projection-specific fields are merged in when a layer is
//! constructed for a projection, producing an [`EffectiveLayerDefinition`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use crate::{MapError, MapResult, ProjectionId};

/// Unique identifier for a layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for LayerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LayerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Temporal period of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// One image per calendar day
    Daily,
}

/// Reference to the rendered palette of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteRef {
    pub id: String,
}

/// Source protocol of a constructed layer, selected by the type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// Pre-rendered tile matrix
    Wmts,
    /// Dynamically parameterized tile requests
    Wms,
    /// Coordinate grid overlay drawn by the map surface
    Graticule,
}

impl LayerKind {
    /// Parse a type tag. An unrecognized tag is a configuration error.
    pub fn parse(layer: &LayerId, tag: Option<&str>) -> MapResult<Self> {
        match tag {
            Some("wmts") => Ok(LayerKind::Wmts),
            Some("wms") => Ok(LayerKind::Wms),
            Some("graticule") => Ok(LayerKind::Graticule),
            other => Err(MapError::UnknownLayerType {
                layer: layer.to_string(),
                layer_type: other.unwrap_or("<none>").to_string(),
            }),
        }
    }
}

/// Fields a projection may override on the base definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectionOverride {
    #[serde(default, rename = "type")]
    pub layer_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub matrix_set: Option<String>,
    #[serde(default)]
    pub layer: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub opacity: Option<f64>,
}

/// Declarative description of one imagery layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDefinition {
    pub id: LayerId,

    /// Layer group (e.g. "baselayers", "overlays")
    #[serde(default)]
    pub group: String,

    #[serde(default)]
    pub period: Option<Period>,

    /// First day with imagery
    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    /// Last day with imagery, open ended when absent
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    /// Type tag: "wmts", "wms" or "graticule"
    #[serde(default, rename = "type")]
    pub layer_type: Option<String>,

    /// Name of the source in the configuration
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub matrix_set: Option<String>,

    /// Remote layer name, defaults to the layer id
    #[serde(default)]
    pub layer: Option<String>,

    /// Image MIME type
    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub opacity: Option<f64>,

    #[serde(default)]
    pub palette: Option<PaletteRef>,

    /// Per-projection overrides; a layer is available in a projection only
    /// when it has an entry here.
    #[serde(default)]
    pub projections: BTreeMap<ProjectionId, ProjectionOverride>,
}

impl LayerDefinition {
    pub fn is_daily(&self) -> bool {
        self.period == Some(Period::Daily)
    }

    pub fn supports_projection(&self, projection: &ProjectionId) -> bool {
        self.projections.contains_key(projection)
    }

    /// True when the layer is a coordinate grid overlay in this projection.
    pub fn is_graticule(&self, projection: &ProjectionId) -> bool {
        let tagged = |t: &Option<String>| t.as_deref() == Some("graticule");
        tagged(&self.layer_type)
            || self
                .projections
                .get(projection)
                .map(|o| tagged(&o.layer_type))
                .unwrap_or(false)
    }

    /// True when imagery exists for the given day.
    pub fn covers(&self, date: NaiveDate) -> bool {
        if !self.is_daily() {
            return true;
        }
        let after_start = self.start_date.map(|s| date >= s).unwrap_or(true);
        let before_end = self.end_date.map(|e| date <= e).unwrap_or(true);
        after_start && before_end
    }

    /// Merge the overrides for `projection` into a copy of this definition.
    pub fn effective(&self, projection: &ProjectionId) -> EffectiveLayerDefinition {
        let ov = self.projections.get(projection).cloned().unwrap_or_default();
        EffectiveLayerDefinition {
            id: self.id.clone(),
            projection: projection.clone(),
            period: self.period,
            start_date: self.start_date,
            layer_type: ov.layer_type.or_else(|| self.layer_type.clone()),
            source: ov.source.or_else(|| self.source.clone()),
            matrix_set: ov.matrix_set.or_else(|| self.matrix_set.clone()),
            layer: ov.layer.or_else(|| self.layer.clone()),
            format: ov.format.or_else(|| self.format.clone()),
            opacity: ov.opacity.or(self.opacity),
            palette: self.palette.clone(),
        }
    }
}

/// A layer definition with projection overrides applied.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveLayerDefinition {
    pub id: LayerId,
    pub projection: ProjectionId,
    pub period: Option<Period>,
    pub start_date: Option<NaiveDate>,
    pub layer_type: Option<String>,
    pub source: Option<String>,
    pub matrix_set: Option<String>,
    pub layer: Option<String>,
    pub format: Option<String>,
    pub opacity: Option<f64>,
    pub palette: Option<PaletteRef>,
}

impl EffectiveLayerDefinition {
    pub fn kind(&self) -> MapResult<LayerKind> {
        LayerKind::parse(&self.id, self.layer_type.as_deref())
    }

    pub fn is_daily(&self) -> bool {
        self.period == Some(Period::Daily)
    }

    /// Name of the layer on the remote service.
    pub fn remote_name(&self) -> &str {
        self.layer.as_deref().unwrap_or(self.id.as_str())
    }

    pub fn format(&self) -> &str {
        self.format.as_deref().unwrap_or("image/jpeg")
    }
}
