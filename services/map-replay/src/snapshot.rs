//! Serializable view of the map after a replay.

use std::collections::BTreeMap;

use map_common::{BoundingBox, TileCoord};
use map_ui::{LayerHandle, MapModel, MapSurface};
use serde::Serialize;
use widgets::Widget;

use crate::replay::Replay;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub projection: Option<String>,
    pub date: String,
    pub view: Option<ViewState>,
    /// Extent last stored in the model.
    pub extent: Option<BoundingBox>,
    pub published_extents: usize,
    /// Bottom-most first.
    pub stack: Vec<LayerView>,
    pub cache: CacheView,
    pub failures: Vec<FailureView>,
    pub step_errors: Vec<StepErrorView>,
    pub pickers: BTreeMap<String, PickerView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub center: [f64; 2],
    pub zoom: u32,
    pub size: [u32; 2],
    pub zoom_in: bool,
    pub zoom_out: bool,
    pub graticule: bool,
    pub controls: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerView {
    pub id: String,
    pub key: String,
    pub date: String,
    pub visible: bool,
    pub opacity: f64,
    pub lookup: bool,
    /// Request for the tile under the view center, when the layer's grid
    /// reaches the current zoom.
    pub center_tile: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheView {
    pub len: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureView {
    pub layer: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StepErrorView {
    pub step: usize,
    pub action: &'static str,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PickerView {
    pub value: Option<String>,
    pub status: String,
    pub items: usize,
}

impl Snapshot {
    pub fn capture(replay: &Replay) -> Self {
        let ui = replay.ui();
        let state = replay.state();
        let active = ui.active();

        let view = active.map(|surface| {
            let (x, y) = surface.center();
            let (w, h) = surface.size();
            let buttons = ui.zoom_buttons();
            ViewState {
                center: [x, y],
                zoom: surface.zoom(),
                size: [w, h],
                zoom_in: buttons.map_or(false, |b| b.zoom_in),
                zoom_out: buttons.map_or(false, |b| b.zoom_out),
                graticule: surface.has_graticule(),
                controls: surface.controls().map(|c| format!("{:?}", c)).collect(),
            }
        });

        let stack = active
            .map(|surface| {
                let (x, y) = surface.center();
                surface
                    .layers()
                    .iter()
                    .map(|layer| layer_view(layer, surface.zoom(), (x, y)))
                    .collect()
            })
            .unwrap_or_default();

        let stats = ui.cache_stats();
        let factory = ui.factory();

        Self {
            projection: ui.selected_projection().map(|p| p.to_string()),
            date: state.selected_date().format("%Y-%m-%d").to_string(),
            view,
            extent: state.extent(),
            published_extents: replay.published_extents(),
            stack,
            cache: CacheView {
                len: factory.cache_len(),
                capacity: state.config().map.cache_capacity,
                hits: stats.hits,
                misses: stats.misses,
                evictions: stats.evictions,
                invalidations: stats.invalidations,
            },
            failures: replay.failures().to_vec(),
            step_errors: replay.step_errors().to_vec(),
            pickers: replay
                .pickers()
                .iter()
                .map(|(id, picker)| {
                    (
                        id.clone(),
                        PickerView {
                            value: picker.value().map(str::to_string),
                            status: picker.status().to_string(),
                            items: picker.len(),
                        },
                    )
                })
                .collect(),
        }
    }
}

fn layer_view(layer: &LayerHandle, zoom: u32, center: (f64, f64)) -> LayerView {
    let center_tile = layer
        .source()
        .grid()
        .coord_to_tile(zoom, center.0, center.1)
        .and_then(|coord: TileCoord| layer.tile_url(&coord));

    LayerView {
        id: layer.id().to_string(),
        key: layer.key().to_string(),
        date: layer.date_id(),
        visible: layer.is_visible(),
        opacity: layer.opacity(),
        lookup: layer.lookup().is_some(),
        center_tile,
    }
}
