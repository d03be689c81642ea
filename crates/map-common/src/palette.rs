//! Palettes and color lookup tables.
//!
//! Scientific data layers are published with a rendered palette: a scale of
//! colors, one per data class. Users may substitute a custom palette or hide
//! classes outside a range. Both are applied on the client by rewriting tile
//! pixels through a [`ColorLookup`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::{MapError, MapResult};

/// An exact RGBA pixel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse "rrggbbaa" or "rrggbb" (alpha defaults to opaque), with or
    /// without a leading '#'.
    pub fn from_hex(s: &str) -> MapResult<Self> {
        let hex = s.trim_start_matches('#');
        let invalid = || MapError::InvalidField {
            field: "color".to_string(),
            message: format!("expected rrggbb or rrggbbaa, got '{}'", s),
        };
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, a))
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Rgba {
    fn from(v: [u8; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

/// Color scale of a rendered palette.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaletteScale {
    pub colors: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub values: Vec<f64>,
}

/// Palette the imagery is published with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedPalette {
    pub scale: PaletteScale,
}

impl RenderedPalette {
    pub fn colors(&self) -> MapResult<Vec<Rgba>> {
        self.scale.colors.iter().map(|c| Rgba::from_hex(c)).collect()
    }
}

/// A user-selectable replacement palette.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomPalette {
    pub colors: Vec<String>,
}

impl CustomPalette {
    pub fn colors(&self) -> MapResult<Vec<Rgba>> {
        self.colors.iter().map(|c| Rgba::from_hex(c)).collect()
    }
}

/// Palette section of the configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaletteConfig {
    #[serde(default)]
    pub rendered: HashMap<String, RenderedPalette>,
    #[serde(default)]
    pub custom: HashMap<String, CustomPalette>,
}

/// Identity of an active palette configuration.
///
/// Two keys compare equal only when the custom palette and the range bounds
/// are identical, so distinct configurations never share a cache slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaletteKey {
    pub custom: Option<String>,
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl fmt::Display for PaletteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: Option<usize>| b.map(|v| v.to_string()).unwrap_or_default();
        write!(
            f,
            "{},{},{}",
            self.custom.as_deref().unwrap_or(""),
            bound(self.min),
            bound(self.max)
        )
    }
}

/// Table mapping raw pixel colors to display colors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorLookup {
    table: HashMap<Rgba, Rgba>,
}

impl ColorLookup {
    /// Build the lookup for a rendered palette.
    ///
    /// Each scale color maps to the custom color at the same relative
    /// position (the custom palette is resampled to the scale length), or to
    /// itself without a custom palette. Classes outside `min..=max` map to
    /// fully transparent.
    pub fn build(
        scale: &[Rgba],
        custom: Option<&[Rgba]>,
        min: Option<usize>,
        max: Option<usize>,
    ) -> Self {
        let n = scale.len();
        let mut table = HashMap::with_capacity(n);
        for (i, source) in scale.iter().enumerate() {
            let in_range =
                min.map(|m| i >= m).unwrap_or(true) && max.map(|m| i <= m).unwrap_or(true);
            let target = if !in_range {
                Rgba::TRANSPARENT
            } else {
                match custom {
                    Some(colors) if !colors.is_empty() => colors[i * colors.len() / n],
                    _ => *source,
                }
            };
            table.insert(*source, target);
        }
        Self { table }
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (Rgba, Rgba)>) -> Self {
        Self {
            table: pairs.into_iter().collect(),
        }
    }

    /// Mapped color for an exact source value.
    pub fn get(&self, source: &Rgba) -> Option<&Rgba> {
        self.table.get(source)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREEN: Rgba = Rgba::new(0, 255, 0, 255);
    const YELLOW: Rgba = Rgba::new(255, 255, 0, 255);
    const RED: Rgba = Rgba::new(255, 0, 0, 255);

    #[test]
    fn test_parse_hex() {
        assert_eq!(Rgba::from_hex("ff0000ff").unwrap(), RED);
        assert_eq!(Rgba::from_hex("#000040").unwrap(), Rgba::new(0, 0, 64, 255));
        assert!(Rgba::from_hex("f00").is_err());
        assert!(Rgba::from_hex("gg0000ff").is_err());
        assert_eq!(RED.to_string(), "ff0000ff");
    }

    #[test]
    fn test_identity_lookup_without_custom() {
        let lookup = ColorLookup::build(&[GREEN, YELLOW, RED], None, None, None);
        assert_eq!(lookup.len(), 3);
        assert_eq!(lookup.get(&YELLOW), Some(&YELLOW));
    }

    #[test]
    fn test_custom_palette_resampled() {
        let blues = [
            Rgba::new(240, 240, 255, 255),
            Rgba::new(0, 0, 255, 255),
        ];
        let lookup = ColorLookup::build(&[GREEN, YELLOW, RED], Some(&blues), None, None);
        assert_eq!(lookup.get(&GREEN), Some(&blues[0]));
        assert_eq!(lookup.get(&YELLOW), Some(&blues[0]));
        assert_eq!(lookup.get(&RED), Some(&blues[1]));
    }

    #[test]
    fn test_range_hides_outside_classes() {
        let lookup = ColorLookup::build(&[GREEN, YELLOW, RED], None, Some(1), Some(1));
        assert_eq!(lookup.get(&GREEN), Some(&Rgba::TRANSPARENT));
        assert_eq!(lookup.get(&YELLOW), Some(&YELLOW));
        assert_eq!(lookup.get(&RED), Some(&Rgba::TRANSPARENT));
    }

    #[test]
    fn test_palette_keys_distinguish_configurations() {
        let a = PaletteKey { custom: Some("blue-1".into()), min: None, max: None };
        let b = PaletteKey { custom: Some("blue-1".into()), min: Some(0), max: None };
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "blue-1,,");
    }
}
