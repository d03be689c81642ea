//! Constructed tile layers.
//!
//! A [`TileLayer`] is shared between the layer cache and the map surface
//! that displays it, so it is handed out as an [`Rc`]. Visibility and
//! opacity are the only fields that change after construction.

use chrono::NaiveDate;
use image::RgbaImage;
use std::cell::Cell;
use std::rc::Rc;

use map_common::{
    date_id, BoundingBox, ColorLookup, CrsCode, EffectiveLayerDefinition, LayerId, MapResult,
    ProjectionId, TileCoord, TileGrid,
};

use crate::key::LayerKey;
use crate::lookup::{decode_tile, LookupTileLoader};

/// Shared handle to a constructed layer.
pub type LayerHandle = Rc<TileLayer>;

/// Pre-rendered tile matrix source (WMTS GetTile).
#[derive(Debug, Clone, PartialEq)]
pub struct WmtsSource {
    pub url: String,
    pub layer: String,
    pub style: String,
    pub format: String,
    pub matrix_set: String,
    pub grid: TileGrid,
    pub time: Option<String>,
}

/// Dynamically parameterized source (WMS GetMap on a tile grid).
#[derive(Debug, Clone, PartialEq)]
pub struct WmsSource {
    pub url: String,
    pub layers: String,
    pub format: String,
    pub transparent: bool,
    pub version: String,
    pub srs: CrsCode,
    pub grid: TileGrid,
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TileSource {
    Wmts(WmtsSource),
    Wms(WmsSource),
}

impl TileSource {
    pub fn grid(&self) -> &TileGrid {
        match self {
            TileSource::Wmts(s) => &s.grid,
            TileSource::Wms(s) => &s.grid,
        }
    }

    /// Request time dimension, if the layer is temporal.
    pub fn time(&self) -> Option<&str> {
        match self {
            TileSource::Wmts(s) => s.time.as_deref(),
            TileSource::Wms(s) => s.time.as_deref(),
        }
    }

    /// Build the request URL for one tile. Returns `None` for coordinates
    /// outside the grid's zoom range.
    pub fn tile_url(&self, coord: &TileCoord) -> Option<String> {
        match self {
            TileSource::Wmts(s) => {
                let matrix = s.grid.matrix_id(coord.z)?;
                let mut url = format!(
                    "{}?SERVICE=WMTS&REQUEST=GetTile&VERSION=1.0.0&LAYER={}&STYLE={}&TILEMATRIXSET={}&TILEMATRIX={}&TILEROW={}&TILECOL={}&FORMAT={}",
                    s.url, s.layer, s.style, s.matrix_set, matrix, coord.y, coord.x, s.format
                );
                if let Some(time) = &s.time {
                    url.push_str("&TIME=");
                    url.push_str(time);
                }
                Some(url)
            }
            TileSource::Wms(s) => {
                let bbox: BoundingBox = s.grid.tile_bbox(coord)?;
                let mut url = format!(
                    "{}?SERVICE=WMS&REQUEST=GetMap&VERSION={}&LAYERS={}&STYLES=&FORMAT={}&SRS={}&BBOX={}&WIDTH={}&HEIGHT={}",
                    s.url,
                    s.version,
                    s.layers,
                    s.format,
                    s.srs,
                    bbox.to_wms_string(),
                    s.grid.tile_size,
                    s.grid.tile_size
                );
                if s.transparent {
                    url.push_str("&TRANSPARENT=TRUE");
                }
                if let Some(time) = &s.time {
                    url.push_str("&TIME=");
                    url.push_str(time);
                }
                Some(url)
            }
        }
    }
}

/// A constructed, displayable tile layer.
#[derive(Debug)]
pub struct TileLayer {
    key: LayerKey,
    date: NaiveDate,
    definition: EffectiveLayerDefinition,
    source: TileSource,
    lookup: Option<Rc<ColorLookup>>,
    visible: Cell<bool>,
    opacity: Cell<f64>,
}

impl TileLayer {
    /// New layers start hidden; the reconciler decides visibility.
    pub fn new(
        key: LayerKey,
        date: NaiveDate,
        definition: EffectiveLayerDefinition,
        source: TileSource,
        lookup: Option<Rc<ColorLookup>>,
    ) -> Self {
        let opacity = definition.opacity.unwrap_or(1.0);
        Self {
            key,
            date,
            definition,
            source,
            lookup,
            visible: Cell::new(false),
            opacity: Cell::new(opacity),
        }
    }

    pub fn id(&self) -> &LayerId {
        &self.definition.id
    }

    pub fn key(&self) -> &LayerKey {
        &self.key
    }

    /// Date the layer was built for.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn date_id(&self) -> String {
        date_id(self.date)
    }

    pub fn projection(&self) -> &ProjectionId {
        &self.definition.projection
    }

    pub fn definition(&self) -> &EffectiveLayerDefinition {
        &self.definition
    }

    pub fn source(&self) -> &TileSource {
        &self.source
    }

    pub fn lookup(&self) -> Option<&Rc<ColorLookup>> {
        self.lookup.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    pub fn opacity(&self) -> f64 {
        self.opacity.get()
    }

    pub fn set_opacity(&self, opacity: f64) {
        self.opacity.set(opacity.clamp(0.0, 1.0));
    }

    pub fn tile_url(&self, coord: &TileCoord) -> Option<String> {
        self.source.tile_url(coord)
    }

    /// Loader that rewrites tile pixels, present while a lookup is attached.
    pub fn tile_loader(&self) -> Option<LookupTileLoader> {
        self.lookup.clone().map(LookupTileLoader::new)
    }

    /// Decode fetched tile bytes into display pixels.
    pub fn decode_tile(&self, bytes: &[u8]) -> MapResult<RgbaImage> {
        match self.tile_loader() {
            Some(loader) => loader.load(bytes),
            None => decode_tile(bytes),
        }
    }
}
