//! In-memory selection model.
//!
//! Holds the active layer list, selected date and projection, palette
//! settings and the published extent. Every mutation that changes something
//! queues a [`ModelEvent`]; the owner drains the queue and feeds the events
//! to the reconciler.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};

use map_common::{
    AppConfig, BoundingBox, ColorLookup, LayerDefinition, LayerId, MapError, MapResult,
    PaletteKey, ProjectionId, Rgba,
};

use crate::model::{LayerQuery, MapModel, ModelEvent, PaletteChange};

const BASELAYERS: &str = "baselayers";

#[derive(Debug, Clone)]
struct ActiveLayer {
    definition: LayerDefinition,
    visible: bool,
    opacity: f64,
}

#[derive(Debug, Clone)]
struct PaletteSettings {
    key: PaletteKey,
    lookup: Rc<ColorLookup>,
}

pub struct SelectionState {
    config: Rc<AppConfig>,
    /// Top-most first. Overlays always sit above base layers.
    active: Vec<ActiveLayer>,
    projection: ProjectionId,
    date: NaiveDate,
    palettes: HashMap<LayerId, PaletteSettings>,
    extent: Option<BoundingBox>,
    leading_extent: Option<BoundingBox>,
    extent_updates: u64,
    events: Vec<ModelEvent>,
}

impl SelectionState {
    pub fn new(config: Rc<AppConfig>, date: NaiveDate) -> Self {
        Self {
            projection: config.defaults.projection.clone(),
            config,
            active: Vec::new(),
            date,
            palettes: HashMap::new(),
            extent: None,
            leading_extent: None,
            extent_updates: 0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Take the queued change notifications.
    pub fn drain_events(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: ModelEvent) {
        debug!(event = event.name(), "Selection changed");
        self.events.push(event);
    }

    fn position(&self, id: &LayerId) -> Option<usize> {
        self.active.iter().position(|l| &l.definition.id == id)
    }

    fn active_mut(&mut self, id: &LayerId) -> MapResult<&mut ActiveLayer> {
        self.active
            .iter_mut()
            .find(|l| &l.definition.id == id)
            .ok_or_else(|| MapError::InvalidField {
                field: "layer".to_string(),
                message: format!("layer '{}' is not active", id),
            })
    }

    fn is_base(def: &LayerDefinition) -> bool {
        def.group == BASELAYERS
    }

    pub fn is_active(&self, id: &LayerId) -> bool {
        self.position(id).is_some()
    }

    /// Activate a configured layer at the top of its group.
    pub fn add_layer(&mut self, id: &str) -> MapResult<()> {
        let definition = self
            .config
            .layer(id)
            .cloned()
            .ok_or_else(|| MapError::InvalidField {
                field: "layer".to_string(),
                message: format!("layer '{}' is not configured", id),
            })?;
        if self.is_active(&definition.id) {
            return Ok(());
        }
        let index = if Self::is_base(&definition) {
            self.active
                .iter()
                .position(|l| Self::is_base(&l.definition))
                .unwrap_or(self.active.len())
        } else {
            0
        };
        self.active.insert(
            index,
            ActiveLayer {
                definition: definition.clone(),
                visible: true,
                opacity: definition.opacity.unwrap_or(1.0),
            },
        );
        self.emit(ModelEvent::LayerAdded(definition));
        Ok(())
    }

    pub fn remove_layer(&mut self, id: &LayerId) -> MapResult<()> {
        let Some(index) = self.position(id) else {
            return Ok(());
        };
        let removed = self.active.remove(index);
        self.palettes.remove(id);
        self.emit(ModelEvent::LayerRemoved(removed.definition));
        Ok(())
    }

    pub fn set_visibility(&mut self, id: &LayerId, visible: bool) -> MapResult<()> {
        let layer = self.active_mut(id)?;
        if layer.visible == visible {
            return Ok(());
        }
        layer.visible = visible;
        self.emit(ModelEvent::VisibilityChanged(id.clone()));
        Ok(())
    }

    pub fn set_opacity(&mut self, id: &LayerId, opacity: f64) -> MapResult<()> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(MapError::InvalidField {
                field: "opacity".to_string(),
                message: format!("{} is outside 0..1", opacity),
            });
        }
        self.active_mut(id)?.opacity = opacity;
        self.emit(ModelEvent::OpacityChanged {
            layer: id.clone(),
            opacity,
        });
        Ok(())
    }

    pub fn opacity(&self, id: &LayerId) -> Option<f64> {
        self.position(id).map(|i| self.active[i].opacity)
    }

    /// Move a layer one slot up within its group.
    pub fn move_up(&mut self, id: &LayerId) -> MapResult<()> {
        self.move_by(id, -1)
    }

    /// Move a layer one slot down within its group.
    pub fn move_down(&mut self, id: &LayerId) -> MapResult<()> {
        self.move_by(id, 1)
    }

    fn move_by(&mut self, id: &LayerId, delta: isize) -> MapResult<()> {
        let index = self
            .position(id)
            .ok_or_else(|| MapError::InvalidField {
                field: "layer".to_string(),
                message: format!("layer '{}' is not active", id),
            })?;
        let Some(target) = index.checked_add_signed(delta) else {
            return Ok(());
        };
        let same_group = self
            .active
            .get(target)
            .map(|other| {
                Self::is_base(&other.definition) == Self::is_base(&self.active[index].definition)
            })
            .unwrap_or(false);
        if !same_group {
            return Ok(());
        }
        self.active.swap(index, target);
        self.emit(ModelEvent::LayersReordered);
        Ok(())
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        if self.date == date {
            return;
        }
        self.date = date;
        self.emit(ModelEvent::DateSelected(date));
    }

    pub fn select_projection(&mut self, id: &str) -> MapResult<()> {
        let id = self.config.projection(&ProjectionId::from(id))?.id.clone();
        if self.projection == id {
            return Ok(());
        }
        self.projection = id.clone();
        self.emit(ModelEvent::ProjectionSelected(id));
        Ok(())
    }

    fn rendered_colors(&self, id: &LayerId) -> MapResult<Vec<Rgba>> {
        let palette_id = self
            .config
            .layer(id.as_str())
            .and_then(|def| def.palette.as_ref())
            .map(|p| p.id.clone())
            .ok_or_else(|| MapError::InvalidField {
                field: "palette".to_string(),
                message: format!("layer '{}' has no palette", id),
            })?;
        let rendered = self.config.palettes.rendered.get(&palette_id).ok_or_else(|| {
            MapError::Configuration(format!("palette '{}' is not defined", palette_id))
        })?;
        rendered.colors()
    }

    fn update_palette(
        &mut self,
        id: &LayerId,
        change: PaletteChange,
        apply: impl FnOnce(&mut PaletteKey),
    ) -> MapResult<()> {
        if !self.is_active(id) {
            return Err(MapError::InvalidField {
                field: "layer".to_string(),
                message: format!("layer '{}' is not active", id),
            });
        }
        let scale = self.rendered_colors(id)?;
        let mut key = self
            .palettes
            .get(id)
            .map(|p| p.key.clone())
            .unwrap_or_default();
        apply(&mut key);

        if key == PaletteKey::default() {
            self.palettes.remove(id);
        } else {
            let custom = match &key.custom {
                Some(custom_id) => Some(
                    self.config
                        .palettes
                        .custom
                        .get(custom_id)
                        .ok_or_else(|| MapError::InvalidField {
                            field: "palette".to_string(),
                            message: format!("custom palette '{}' is not defined", custom_id),
                        })?
                        .colors()?,
                ),
                None => None,
            };
            let lookup = ColorLookup::build(&scale, custom.as_deref(), key.min, key.max);
            if lookup.is_empty() {
                warn!(layer = %id, "Palette lookup is empty");
            }
            self.palettes.insert(
                id.clone(),
                PaletteSettings {
                    key,
                    lookup: Rc::new(lookup),
                },
            );
        }
        self.emit(ModelEvent::PaletteChanged {
            layer: id.clone(),
            change,
        });
        Ok(())
    }

    pub fn set_custom_palette(&mut self, id: &LayerId, custom: &str) -> MapResult<()> {
        let custom = custom.to_string();
        self.update_palette(id, PaletteChange::SetCustom, |key| key.custom = Some(custom))
    }

    pub fn clear_custom_palette(&mut self, id: &LayerId) -> MapResult<()> {
        self.update_palette(id, PaletteChange::ClearCustom, |key| key.custom = None)
    }

    /// Hide classes outside `min..=max` (palette indices).
    pub fn set_range(
        &mut self,
        id: &LayerId,
        min: Option<usize>,
        max: Option<usize>,
    ) -> MapResult<()> {
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(MapError::InvalidField {
                    field: "range".to_string(),
                    message: format!("min {} is greater than max {}", lo, hi),
                });
            }
        }
        self.update_palette(id, PaletteChange::Range, |key| {
            key.min = min;
            key.max = max;
        })
    }

    pub fn set_leading_extent(&mut self, extent: Option<BoundingBox>) {
        self.leading_extent = extent;
    }

    /// Number of extent publications received.
    pub fn extent_updates(&self) -> u64 {
        self.extent_updates
    }
}

impl MapModel for SelectionState {
    fn layers(&self, query: LayerQuery) -> Vec<&LayerDefinition> {
        let mut layers: Vec<&LayerDefinition> = self
            .active
            .iter()
            .filter(|l| !query.daily_only || l.definition.is_daily())
            .filter(|l| !query.renderable_only || self.is_renderable(&l.definition.id))
            .map(|l| &l.definition)
            .collect();
        if query.back_to_front {
            layers.reverse();
        }
        layers
    }

    fn is_renderable(&self, id: &LayerId) -> bool {
        self.position(id)
            .map(|i| {
                let layer = &self.active[i];
                layer.visible
                    && layer.definition.supports_projection(&self.projection)
                    && layer.definition.covers(self.date)
            })
            .unwrap_or(false)
    }

    fn opacity(&self, layer: &LayerId) -> Option<f64> {
        SelectionState::opacity(self, layer)
    }

    fn selected_projection(&self) -> &ProjectionId {
        &self.projection
    }

    fn selected_date(&self) -> NaiveDate {
        self.date
    }

    fn palette_key(&self, id: &LayerId) -> Option<PaletteKey> {
        self.palettes.get(id).map(|p| p.key.clone())
    }

    fn palette_lookup(&self, id: &LayerId) -> Option<Rc<ColorLookup>> {
        self.palettes.get(id).map(|p| Rc::clone(&p.lookup))
    }

    fn extent(&self) -> Option<BoundingBox> {
        self.extent
    }

    fn leading_extent(&self) -> Option<BoundingBox> {
        self.leading_extent
    }

    fn update_extent(&mut self, extent: BoundingBox) {
        self.extent = Some(extent);
        self.extent_updates += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures;

    fn state() -> SelectionState {
        SelectionState::new(Rc::new(fixtures::config()), fixtures::date())
    }

    fn ids(layers: &[&LayerDefinition]) -> Vec<String> {
        layers.iter().map(|d| d.id.to_string()).collect()
    }

    #[test]
    fn test_overlays_stack_above_baselayers() {
        let mut state = state();
        state.add_layer("terra-cr").unwrap();
        state.add_layer("terra-aod").unwrap();
        state.add_layer("aqua-cr").unwrap();

        assert_eq!(
            ids(&state.layers(LayerQuery::all())),
            vec!["terra-aod", "aqua-cr", "terra-cr"]
        );
        assert_eq!(
            ids(&state.layers(LayerQuery::back_to_front())),
            vec!["terra-cr", "aqua-cr", "terra-aod"]
        );
        assert_eq!(state.drain_events().len(), 3);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut state = state();
        state.add_layer("terra-cr").unwrap();
        state.add_layer("terra-cr").unwrap();
        assert_eq!(state.layers(LayerQuery::all()).len(), 1);
        assert_eq!(state.drain_events().len(), 1);
        assert!(state.add_layer("no-such-layer").is_err());
    }

    #[test]
    fn test_renderable_requires_visibility_date_and_projection() {
        let mut state = state();
        state.add_layer("terra-cr").unwrap();
        state.add_layer("terra-aod").unwrap();
        let cr = LayerId::from("terra-cr");
        let aod = LayerId::from("terra-aod");
        assert!(state.is_renderable(&cr));

        state.set_visibility(&cr, false).unwrap();
        assert!(!state.is_renderable(&cr));

        state.select_projection("arctic").unwrap();
        assert!(!state.is_renderable(&aod));

        state.select_projection("geographic").unwrap();
        state.select_date(NaiveDate::from_ymd_opt(1999, 1, 1).unwrap());
        assert!(!state.is_renderable(&aod));
        assert_eq!(state.layers(LayerQuery::all().renderable()).len(), 0);
    }

    #[test]
    fn test_move_stays_within_group() {
        let mut state = state();
        state.add_layer("terra-cr").unwrap();
        state.add_layer("aqua-cr").unwrap();
        state.add_layer("terra-aod").unwrap();
        state.drain_events();

        // terra-aod is the only overlay; moving it down would cross groups
        state.move_down(&LayerId::from("terra-aod")).unwrap();
        assert!(state.drain_events().is_empty());

        state.move_down(&LayerId::from("aqua-cr")).unwrap();
        assert_eq!(
            ids(&state.layers(LayerQuery::all())),
            vec!["terra-aod", "terra-cr", "aqua-cr"]
        );
        assert_eq!(state.drain_events(), vec![ModelEvent::LayersReordered]);
    }

    #[test]
    fn test_palette_settings() {
        let mut state = state();
        state.add_layer("terra-aod").unwrap();
        let aod = LayerId::from("terra-aod");
        assert!(!state.palette_active(&aod));

        state.set_custom_palette(&aod, "red-1").unwrap();
        assert!(state.palette_active(&aod));
        assert_eq!(
            state.palette_key(&aod).unwrap().custom.as_deref(),
            Some("red-1")
        );
        assert!(state.palette_lookup(&aod).is_some());

        state.set_range(&aod, Some(1), None).unwrap();
        assert_eq!(state.palette_key(&aod).unwrap().min, Some(1));

        state.clear_custom_palette(&aod).unwrap();
        state.set_range(&aod, None, None).unwrap();
        assert!(!state.palette_active(&aod));
        assert_eq!(state.drain_events().len(), 5);
    }

    #[test]
    fn test_palette_errors() {
        let mut state = state();
        state.add_layer("terra-cr").unwrap();
        state.add_layer("terra-aod").unwrap();
        let aod = LayerId::from("terra-aod");

        assert!(state
            .set_custom_palette(&LayerId::from("terra-cr"), "red-1")
            .is_err());
        assert!(state.set_custom_palette(&aod, "missing").is_err());
        assert!(state.set_range(&aod, Some(3), Some(1)).is_err());
        assert!(!state.palette_active(&aod));
    }

    #[test]
    fn test_update_extent() {
        let mut state = state();
        assert!(state.extent().is_none());
        state.update_extent(BoundingBox::new(-10.0, -10.0, 10.0, 10.0));
        assert_eq!(state.extent_updates(), 1);
        assert!(state.extent().is_some());
    }
}
