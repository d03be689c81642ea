//! Interface to the application state the map reconciles against.

use chrono::NaiveDate;
use std::rc::Rc;

use map_common::{BoundingBox, ColorLookup, LayerDefinition, LayerId, PaletteKey, ProjectionId};

/// Filter and ordering for [`MapModel::layers`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerQuery {
    /// Bottom-most layer first instead of top-most first
    pub back_to_front: bool,
    /// Only layers that are currently renderable
    pub renderable_only: bool,
    /// Only layers that change with the selected date
    pub daily_only: bool,
}

impl LayerQuery {
    /// All active layers, top-most first.
    pub fn all() -> Self {
        Self::default()
    }

    /// All active layers in drawing order.
    pub fn back_to_front() -> Self {
        Self {
            back_to_front: true,
            ..Self::default()
        }
    }

    pub fn daily() -> Self {
        Self {
            daily_only: true,
            ..Self::default()
        }
    }

    pub fn renderable(mut self) -> Self {
        self.renderable_only = true;
        self
    }
}

/// Kind of palette change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteChange {
    SetCustom,
    ClearCustom,
    Range,
}

/// Change notification emitted by the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    ProjectionSelected(ProjectionId),
    LayerAdded(LayerDefinition),
    LayerRemoved(LayerDefinition),
    VisibilityChanged(LayerId),
    OpacityChanged { layer: LayerId, opacity: f64 },
    LayersReordered,
    DateSelected(NaiveDate),
    PaletteChanged { layer: LayerId, change: PaletteChange },
}

impl ModelEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ModelEvent::ProjectionSelected(_) => "projection-selected",
            ModelEvent::LayerAdded(_) => "layer-added",
            ModelEvent::LayerRemoved(_) => "layer-removed",
            ModelEvent::VisibilityChanged(_) => "visibility-changed",
            ModelEvent::OpacityChanged { .. } => "opacity-changed",
            ModelEvent::LayersReordered => "layers-reordered",
            ModelEvent::DateSelected(_) => "date-selected",
            ModelEvent::PaletteChanged { .. } => "palette-changed",
        }
    }
}

/// Read access to the active selection plus the one write the map performs:
/// publishing the visible extent.
pub trait MapModel {
    fn layers(&self, query: LayerQuery) -> Vec<&LayerDefinition>;

    /// True when the layer is toggled on, covers the selected date and
    /// supports the selected projection.
    ///
    /// Zoom-dependent availability is left to the map surface; layers are
    /// never hidden here because of the current zoom.
    fn is_renderable(&self, layer: &LayerId) -> bool;

    /// Opacity chosen for an active layer. `None` falls back to the
    /// layer definition.
    fn opacity(&self, _layer: &LayerId) -> Option<f64> {
        None
    }

    fn selected_projection(&self) -> &ProjectionId;

    fn selected_date(&self) -> NaiveDate;

    /// Identity of the palette configuration active for the layer, or
    /// `None` when the rendered palette is shown unmodified.
    fn palette_key(&self, layer: &LayerId) -> Option<PaletteKey>;

    fn palette_lookup(&self, layer: &LayerId) -> Option<Rc<ColorLookup>>;

    fn palette_active(&self, layer: &LayerId) -> bool {
        self.palette_key(layer).is_some()
    }

    /// Last published extent, in the units of the projection it was
    /// published from.
    fn extent(&self) -> Option<BoundingBox>;

    /// Extent covering the freshest imagery, when known.
    fn leading_extent(&self) -> Option<BoundingBox> {
        None
    }

    fn update_extent(&mut self, extent: BoundingBox);
}
