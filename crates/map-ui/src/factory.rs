//! Layer construction with reuse through the layer cache.

use chrono::NaiveDate;
use std::rc::Rc;
use tracing::{debug, instrument};

use layer_cache::{CacheStats, LayerCache};
use map_common::{
    date_id, AppConfig, EffectiveLayerDefinition, LayerDefinition, LayerKind, MapError,
    MapResult, ProjectionDescriptor, SourceDescriptor, TileGrid,
};

use crate::handle::{LayerHandle, TileLayer, TileSource, WmsSource, WmtsSource};
use crate::key::{derive_key, LayerKey};
use crate::model::MapModel;

/// Tile edge used for dynamically parameterized sources.
pub const WMS_TILE_SIZE: u32 = 512;

const WMS_VERSION: &str = "1.1.1";

#[derive(Debug, Clone, Copy, Default)]
pub struct CreateOptions {
    /// Build for this date instead of the selected one.
    pub date: Option<NaiveDate>,
}

impl CreateOptions {
    pub fn for_date(date: NaiveDate) -> Self {
        Self { date: Some(date) }
    }
}

/// Builds tile layers from definitions and keeps recently built ones for
/// reuse.
pub struct LayerFactory {
    config: Rc<AppConfig>,
    cache: LayerCache<LayerKey, LayerHandle>,
}

impl LayerFactory {
    /// Factory with the cache capacity from the configuration.
    pub fn new(config: Rc<AppConfig>) -> MapResult<Self> {
        let capacity = config.map.cache_capacity;
        Self::with_capacity(config, capacity)
    }

    pub fn with_capacity(config: Rc<AppConfig>, capacity: usize) -> MapResult<Self> {
        let cache =
            LayerCache::new(capacity).map_err(|e| MapError::Configuration(e.to_string()))?;
        Ok(Self { config, cache })
    }

    /// Key `definition` would be cached under for the model's current
    /// selection.
    pub fn key_for<M: MapModel + ?Sized>(
        &self,
        definition: &LayerDefinition,
        model: &M,
        options: CreateOptions,
    ) -> LayerKey {
        derive_key(
            definition,
            model.selected_projection(),
            model.selected_date(),
            options.date,
            |id| model.palette_key(id),
        )
    }

    /// Return the cached layer for the derived key, or build and cache a new
    /// one. Opacity is reapplied on every call: the model's value for the
    /// layer, else the definition's, else fully opaque.
    #[instrument(skip_all, fields(layer = %definition.id))]
    pub fn create_layer<M: MapModel + ?Sized>(
        &mut self,
        definition: &LayerDefinition,
        model: &M,
        options: CreateOptions,
    ) -> MapResult<LayerHandle> {
        let key = self.key_for(definition, model, options);
        let projection = model.selected_projection();
        let effective = definition.effective(projection);
        let opacity = model
            .opacity(&definition.id)
            .or(effective.opacity)
            .unwrap_or(1.0);

        if let Some(layer) = self.cache.get(&key) {
            debug!(key = %key, "Reusing cached layer");
            layer.set_opacity(opacity);
            return Ok(Rc::clone(layer));
        }

        let config = Rc::clone(&self.config);
        let projection = config.projection(projection)?;
        let date = options.date.unwrap_or_else(|| model.selected_date());
        let time = effective.is_daily().then(|| date_id(date));

        let source = match effective.kind()? {
            LayerKind::Wmts => build_wmts(&config, &effective, projection, time)?,
            LayerKind::Wms => build_wms(&config, &effective, projection, time)?,
            LayerKind::Graticule => {
                return Err(MapError::Configuration(format!(
                    "layer '{}' is a graticule overlay and has no tile source",
                    effective.id
                )))
            }
        };

        let lookup = if model.palette_active(&definition.id) {
            model.palette_lookup(&definition.id)
        } else {
            None
        };

        let layer = Rc::new(TileLayer::new(key.clone(), date, effective, source, lookup));
        debug!(key = %key, "Constructed layer");
        if let Some((evicted, _)) = self.cache.put(key, Rc::clone(&layer)) {
            debug!(evicted = %evicted, "Evicted layer from cache");
        }
        Ok(layer)
    }

    pub fn is_cached(&self, key: &LayerKey) -> bool {
        self.cache.contains(key)
    }

    /// Drop cached layers matching `predicate`. Returns how many were dropped.
    pub fn invalidate<F>(&mut self, predicate: F) -> usize
    where
        F: FnMut(&LayerKey, &LayerHandle) -> bool,
    {
        self.cache.remove_matching(predicate).len()
    }

    pub fn cached_keys(&self) -> Vec<LayerKey> {
        self.cache.keys()
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

fn lookup_source<'a>(
    config: &'a AppConfig,
    def: &EffectiveLayerDefinition,
) -> MapResult<&'a SourceDescriptor> {
    def.source
        .as_deref()
        .and_then(|id| config.source(id))
        .ok_or_else(|| MapError::UnknownSource {
            layer: def.id.to_string(),
            source_id: def.source.clone().unwrap_or_else(|| "<none>".to_string()),
        })
}

fn build_wmts(
    config: &AppConfig,
    def: &EffectiveLayerDefinition,
    projection: &ProjectionDescriptor,
    time: Option<String>,
) -> MapResult<TileSource> {
    let source = lookup_source(config, def)?;
    let matrix_set = def
        .matrix_set
        .as_deref()
        .and_then(|id| source.matrix_set(id))
        .ok_or_else(|| MapError::UnknownMatrixSet {
            layer: def.id.to_string(),
            matrix_set: def.matrix_set.clone().unwrap_or_else(|| "<none>".to_string()),
        })?;

    Ok(TileSource::Wmts(WmtsSource {
        url: source.url.clone(),
        layer: def.remote_name().to_string(),
        style: String::new(),
        format: def.format().to_string(),
        matrix_set: matrix_set.id.clone(),
        grid: TileGrid::for_matrix_set(projection.origin(), matrix_set),
        time,
    }))
}

fn build_wms(
    config: &AppConfig,
    def: &EffectiveLayerDefinition,
    projection: &ProjectionDescriptor,
    time: Option<String>,
) -> MapResult<TileSource> {
    let source = lookup_source(config, def)?;
    let format = def.format();

    Ok(TileSource::Wms(WmsSource {
        url: source.url.clone(),
        layers: def.remote_name().to_string(),
        format: format.to_string(),
        transparent: format == "image/png",
        version: WMS_VERSION.to_string(),
        srs: projection.crs,
        grid: TileGrid::new(
            projection.origin(),
            projection.resolutions.clone(),
            WMS_TILE_SIZE,
        ),
        time,
    }))
}
