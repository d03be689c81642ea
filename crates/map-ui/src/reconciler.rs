//! Keeps one map surface per projection in step with the selection model.
//!
//! Exactly one surface is shown at a time: the one for the selected
//! projection. Model events are applied to that surface only; the others
//! are rebuilt from the model when they are next selected.
//!
//! Layer construction failures never abort a pass. Each failing layer is
//! logged, left off the surface and reported in the returned
//! [`Reconciled`].

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, error, info};

use layer_cache::CacheStats;
use map_common::{
    AppConfig, BoundingBox, CrsCode, LayerDefinition, LayerId, MapError, MapResult,
    ProjectionDescriptor, ProjectionId,
};

use crate::controls::{coordinate_readout, ZoomButtons};
use crate::factory::{CreateOptions, LayerFactory};
use crate::model::{LayerQuery, MapModel, ModelEvent};
use crate::observer::Observable;
use crate::surface::{Control, MapSurface};
use crate::throttle::{Clock, ExtentThrottle, SystemClock};

/// A layer that could not be constructed.
#[derive(Debug)]
pub struct LayerFailure {
    pub layer: LayerId,
    pub error: MapError,
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Default)]
pub struct Reconciled {
    pub failures: Vec<LayerFailure>,
}

impl Reconciled {
    fn record(&mut self, layer: &LayerId, error: MapError) {
        error!(layer = %layer, error = %error, "Failed to construct layer");
        self.failures.push(LayerFailure {
            layer: layer.clone(),
            error,
        });
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_layers(&self) -> Vec<&LayerId> {
        self.failures.iter().map(|f| &f.layer).collect()
    }
}

/// The map user interface: surfaces, layer cache and extent publication.
pub struct MapUi<S> {
    config: Rc<AppConfig>,
    surfaces: BTreeMap<ProjectionId, S>,
    selected: Option<ProjectionId>,
    previous_centers: HashMap<ProjectionId, (f64, f64)>,
    /// Device size class last applied to each surface's controls.
    applied_small: HashMap<ProjectionId, bool>,
    small: bool,
    factory: LayerFactory,
    throttle: ExtentThrottle,
    clock: Box<dyn Clock>,
    extent_events: Observable<BoundingBox>,
}

impl<S: MapSurface> MapUi<S> {
    /// Build one surface per configured projection with `build`.
    pub fn new<F>(config: Rc<AppConfig>, build: F) -> MapResult<Self>
    where
        F: FnMut(&ProjectionDescriptor) -> S,
    {
        Self::with_clock(config, build, Box::new(SystemClock))
    }

    pub fn with_clock<F>(
        config: Rc<AppConfig>,
        mut build: F,
        clock: Box<dyn Clock>,
    ) -> MapResult<Self>
    where
        F: FnMut(&ProjectionDescriptor) -> S,
    {
        let factory = LayerFactory::new(Rc::clone(&config))?;
        let surfaces: BTreeMap<ProjectionId, S> = if config.parameters.mock_map {
            BTreeMap::new()
        } else {
            config
                .projections
                .values()
                .map(|proj| (proj.id.clone(), build(proj)))
                .collect()
        };
        info!(
            surfaces = surfaces.len(),
            cache_capacity = config.map.cache_capacity,
            extent_interval_ms = config.map.extent_interval_ms,
            mock = config.parameters.mock_map,
            "Created map surfaces"
        );
        Ok(Self {
            throttle: ExtentThrottle::new(Duration::from_millis(config.map.extent_interval_ms)),
            config,
            surfaces,
            selected: None,
            previous_centers: HashMap::new(),
            applied_small: HashMap::new(),
            small: false,
            factory,
            clock,
            extent_events: Observable::new(),
        })
    }

    pub fn is_mock(&self) -> bool {
        self.config.parameters.mock_map
    }

    /// Show the surface for the model's projection and populate it.
    pub fn start<M: MapModel>(&mut self, model: &mut M) -> MapResult<Reconciled> {
        if self.is_mock() {
            return Ok(Reconciled::default());
        }
        self.select_projection(model, true)
    }

    /// Apply one model change. Ignored before [`start`](Self::start).
    pub fn handle<M: MapModel>(
        &mut self,
        model: &mut M,
        event: &ModelEvent,
    ) -> MapResult<Reconciled> {
        if self.selected.is_none() {
            return Ok(Reconciled::default());
        }
        debug!(event = event.name(), "Reconciling map");
        let report = match event {
            ModelEvent::ProjectionSelected(_) => return self.select_projection(model, false),
            ModelEvent::LayerAdded(def) => self.add_layer(def, model),
            ModelEvent::LayerRemoved(def) => {
                self.remove_layer(def);
                Reconciled::default()
            }
            ModelEvent::VisibilityChanged(_) => {
                self.update_layer_visibilities(model);
                Reconciled::default()
            }
            ModelEvent::OpacityChanged { layer, opacity } => {
                self.update_opacity(layer, *opacity);
                Reconciled::default()
            }
            ModelEvent::LayersReordered => self.reload_layers(model),
            ModelEvent::DateSelected(_) => self.update_date(model),
            ModelEvent::PaletteChanged { layer, .. } => self.update_lookup(layer, model),
        };
        Ok(report)
    }

    fn select_projection<M: MapModel>(
        &mut self,
        model: &mut M,
        start: bool,
    ) -> MapResult<Reconciled> {
        let target = model.selected_projection().clone();
        if !self.surfaces.contains_key(&target) {
            return Err(MapError::UnknownProjection(target.to_string()));
        }

        if let Some(current) = self.selected.take() {
            if let Some(surface) = self.surfaces.get_mut(&current) {
                self.previous_centers.insert(current, surface.center());
                surface.set_shown(false);
            }
        }
        info!(projection = %target, start = start, "Selecting projection");
        self.selected = Some(target.clone());
        let report = self.reload_layers(model);

        let remembered = self.previous_centers.get(&target).copied();
        if let Some(surface) = self.surfaces.get_mut(&target) {
            // Hidden surfaces miss resizes, so always re-measure.
            surface.set_shown(true);
            surface.update_size();
            if let Some(center) = remembered {
                surface.set_center(center);
            } else if start {
                let extent = model.extent().or_else(|| {
                    if surface.projection().is_geographic() {
                        model.leading_extent()
                    } else {
                        None
                    }
                });
                if let Some(extent) = extent {
                    surface.fit_extent(&extent);
                }
            }
        }

        self.update_extent(model);
        self.apply_size_class();
        Ok(report)
    }

    fn reload_layers<M: MapModel>(&mut self, model: &M) -> Reconciled {
        let mut report = Reconciled::default();
        let Some(selected) = self.selected.clone() else {
            return report;
        };
        let Some(surface) = self.surfaces.get_mut(&selected) else {
            return report;
        };

        surface.clear_layers();
        surface.set_graticule(false);
        for def in model.layers(LayerQuery::back_to_front()) {
            if def.is_graticule(&selected) {
                surface.set_graticule(true);
                continue;
            }
            if !def.supports_projection(&selected) {
                continue;
            }
            match self.factory.create_layer(def, model, CreateOptions::default()) {
                Ok(layer) => {
                    let top = surface.layers().len();
                    surface.insert_layer(top, layer);
                }
                Err(e) => report.record(&def.id, e),
            }
        }
        debug!(
            projection = %selected,
            layers = surface.layers().len(),
            graticule = surface.has_graticule(),
            "Reloaded layers"
        );

        self.update_layer_visibilities(model);
        report
    }

    fn update_layer_visibilities<M: MapModel>(&self, model: &M) {
        if let Some(surface) = self.active() {
            for layer in surface.layers() {
                layer.set_visible(model.is_renderable(layer.id()));
            }
        }
    }

    fn update_opacity(&self, layer: &LayerId, opacity: f64) {
        if let Some(surface) = self.active() {
            if let Some(index) = surface.find_layer(layer) {
                surface.layers()[index].set_opacity(opacity);
            }
        }
    }

    fn add_layer<M: MapModel>(&mut self, def: &LayerDefinition, model: &M) -> Reconciled {
        let mut report = Reconciled::default();
        let Some(selected) = self.selected.clone() else {
            return report;
        };
        let Some(surface) = self.surfaces.get_mut(&selected) else {
            return report;
        };

        if def.is_graticule(&selected) {
            surface.set_graticule(true);
        } else if def.supports_projection(&selected) && surface.find_layer(&def.id).is_none() {
            // Stack position: number of displayed layers drawn below it.
            let index = model
                .layers(LayerQuery::back_to_front())
                .iter()
                .take_while(|d| d.id != def.id)
                .filter(|d| surface.find_layer(&d.id).is_some())
                .count();
            match self.factory.create_layer(def, model, CreateOptions::default()) {
                Ok(layer) => surface.insert_layer(index, layer),
                Err(e) => report.record(&def.id, e),
            }
        }

        self.update_layer_visibilities(model);
        report
    }

    fn remove_layer(&mut self, def: &LayerDefinition) {
        let Some(selected) = self.selected.clone() else {
            return;
        };
        let Some(surface) = self.surfaces.get_mut(&selected) else {
            return;
        };
        if def.is_graticule(&selected) {
            surface.set_graticule(false);
        } else if let Some(index) = surface.find_layer(&def.id) {
            surface.remove_layer_at(index);
        }
    }

    fn update_date<M: MapModel>(&mut self, model: &M) -> Reconciled {
        let mut report = Reconciled::default();
        let Some(selected) = self.selected.clone() else {
            return report;
        };
        let Some(surface) = self.surfaces.get_mut(&selected) else {
            return report;
        };

        for def in model.layers(LayerQuery::daily()) {
            let Some(index) = surface.find_layer(&def.id) else {
                continue;
            };
            match self.factory.create_layer(def, model, CreateOptions::default()) {
                Ok(layer) => {
                    surface.replace_layer(index, layer);
                }
                Err(e) => report.record(&def.id, e),
            }
        }

        self.update_layer_visibilities(model);
        report
    }

    fn update_lookup<M: MapModel>(&mut self, layer: &LayerId, model: &M) -> Reconciled {
        let Some(selected) = self.selected.clone() else {
            return Reconciled::default();
        };
        let date = model.selected_date();
        let dropped = self.factory.invalidate(|_, handle| {
            handle.id() == layer && handle.projection() == &selected && handle.date() != date
        });
        debug!(layer = %layer, dropped = dropped, "Invalidated layers with a stale palette");
        self.reload_layers(model)
    }

    /// Build (without displaying) the renderable daily layers for `date` so
    /// that a later switch to it is served from the cache.
    pub fn preload<M: MapModel>(&mut self, model: &M, date: NaiveDate) -> Reconciled {
        let mut report = Reconciled::default();
        if self.selected.is_none() {
            return report;
        }
        for def in model.layers(LayerQuery::daily().renderable()) {
            if let Err(e) = self
                .factory
                .create_layer(def, model, CreateOptions::for_date(date))
            {
                report.record(&def.id, e);
            }
        }
        report
    }

    fn publish_extent<M: MapModel>(&self, model: &mut M, extent: BoundingBox) {
        model.update_extent(extent);
        debug!(extent = %extent.to_wms_string(), "Published map extent");
        self.extent_events.emit(&extent);
    }

    fn update_extent<M: MapModel>(&mut self, model: &mut M) {
        let Some(extent) = self.active().map(|s| s.calculate_extent()) else {
            return;
        };
        let now = self.clock.now();
        if let Some(extent) = self.throttle.offer(extent, now) {
            self.publish_extent(model, extent);
        }
    }

    /// The active surface's center or zoom changed.
    pub fn on_viewport_changed<M: MapModel>(&mut self, model: &mut M) {
        self.update_extent(model);
    }

    /// Deliver a coalesced extent once the throttle interval has passed.
    pub fn tick<M: MapModel>(&mut self, model: &mut M) {
        if let Some(extent) = self.throttle.poll(self.clock.now()) {
            self.publish_extent(model, extent);
        }
    }

    /// Instant at which [`tick`](Self::tick) has something to deliver.
    pub fn next_tick(&self) -> Option<std::time::Instant> {
        self.throttle.deadline()
    }

    /// The hosting window changed size. `small` is the device size class.
    pub fn on_resize(&mut self, small: bool) {
        self.small = small;
        self.apply_size_class();
        if let Some(surface) = self.active_mut() {
            surface.update_size();
        }
    }

    fn apply_size_class(&mut self) {
        let small = self.small;
        let Some(selected) = self.selected.clone() else {
            return;
        };
        let Some(surface) = self.surfaces.get_mut(&selected) else {
            return;
        };
        let applied = self.applied_small.entry(selected).or_insert(false);
        if *applied == small {
            return;
        }
        for control in Control::SIZE_DEPENDENT {
            if small {
                surface.remove_control(control);
            } else {
                surface.add_control(control);
            }
        }
        *applied = small;
    }

    /// Step the active surface's zoom, clamped to its range.
    pub fn zoom_by<M: MapModel>(&mut self, model: &mut M, delta: i32) {
        let Some(surface) = self.active_mut() else {
            return;
        };
        let max = surface.projection().max_zoom() as i64;
        let zoom = (surface.zoom() as i64 + delta as i64).clamp(0, max) as u32;
        if zoom == surface.zoom() {
            return;
        }
        surface.set_zoom(zoom);
        self.update_extent(model);
    }

    pub fn zoom_buttons(&self) -> Option<ZoomButtons> {
        self.active()
            .map(|s| ZoomButtons::at(s.zoom(), s.projection().max_zoom()))
    }

    /// Pointer readout for a position in map units of the active surface.
    /// Non-geographic positions are converted with `to_geographic`. `None`
    /// while the readout control is hidden.
    pub fn coordinate_readout<T>(&self, point: (f64, f64), to_geographic: T) -> Option<String>
    where
        T: Fn(CrsCode, (f64, f64)) -> Option<(f64, f64)>,
    {
        let surface = self.active()?;
        if !surface.has_control(Control::MousePosition) {
            return None;
        }
        let crs = surface.projection().crs;
        let lon_lat = if crs.is_geographic() {
            point
        } else {
            to_geographic(crs, point)?
        };
        Some(coordinate_readout(lon_lat, &crs))
    }

    pub fn selected_projection(&self) -> Option<&ProjectionId> {
        self.selected.as_ref()
    }

    pub fn active(&self) -> Option<&S> {
        self.selected.as_ref().and_then(|id| self.surfaces.get(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut S> {
        let id = self.selected.as_ref()?;
        self.surfaces.get_mut(id)
    }

    pub fn surface(&self, projection: &ProjectionId) -> Option<&S> {
        self.surfaces.get(projection)
    }

    pub fn surfaces(&self) -> impl Iterator<Item = (&ProjectionId, &S)> {
        self.surfaces.iter()
    }

    pub fn surfaces_mut(&mut self) -> impl Iterator<Item = (&ProjectionId, &mut S)> {
        self.surfaces.iter_mut()
    }

    pub fn factory(&self) -> &LayerFactory {
        &self.factory
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.factory.cache_stats()
    }

    /// Stream of published extents.
    pub fn extent_events(&self) -> &Observable<BoundingBox> {
        &self.extent_events
    }

    pub fn is_small(&self) -> bool {
        self.small
    }
}
