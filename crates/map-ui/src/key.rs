//! Cache key derivation for constructed layers.

use chrono::NaiveDate;
use std::fmt;

use map_common::{date_id, LayerDefinition, LayerId, PaletteKey, ProjectionId};

/// Reuse identity of a constructed layer.
///
/// The date is present only for daily layers, so every date of a static
/// layer collapses onto one slot. The palette is present only while a custom
/// palette or range is active for the layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayerKey {
    pub layer: LayerId,
    pub projection: ProjectionId,
    pub date: Option<NaiveDate>,
    pub palette: Option<PaletteKey>,
}

impl fmt::Display for LayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.layer,
            self.projection,
            self.date.map(date_id).unwrap_or_default(),
            self.palette
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default()
        )
    }
}

/// Derive the cache key for `definition` in `projection`.
///
/// `date_override` (e.g. a prefetch date) takes precedence over the
/// globally selected date. `palette_key` returns the key of the palette
/// configuration active for a layer, or `None` when none is active.
pub fn derive_key<F>(
    definition: &LayerDefinition,
    projection: &ProjectionId,
    selected_date: NaiveDate,
    date_override: Option<NaiveDate>,
    palette_key: F,
) -> LayerKey
where
    F: FnOnce(&LayerId) -> Option<PaletteKey>,
{
    let date = date_override.unwrap_or(selected_date);
    LayerKey {
        layer: definition.id.clone(),
        projection: projection.clone(),
        date: definition.is_daily().then_some(date),
        palette: palette_key(&definition.id),
    }
}
