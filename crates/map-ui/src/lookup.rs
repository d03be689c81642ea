//! Pixel rewriting through a color lookup table.
//!
//! Tiles of palette-driven layers are decoded to RGBA and every pixel whose
//! exact value appears in the lookup is replaced with the mapped color.
//! Pixels with no entry pass through unchanged.

use image::{Rgba as Pixel, RgbaImage};
use std::rc::Rc;
use tracing::trace;

use map_common::{ColorLookup, MapError, MapResult, Rgba};

/// Decode encoded tile bytes (PNG, JPEG, ...) into RGBA pixels.
pub fn decode_tile(bytes: &[u8]) -> MapResult<RgbaImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| MapError::Decode(e.to_string()))?;
    Ok(img.to_rgba8())
}

/// Rewrite `img` in place. Returns the number of pixels replaced.
pub fn apply_lookup(img: &mut RgbaImage, lookup: &ColorLookup) -> usize {
    let mut replaced = 0;
    for pixel in img.pixels_mut() {
        let source = Rgba::from(pixel.0);
        if let Some(target) = lookup.get(&source) {
            *pixel = Pixel(target.to_array());
            replaced += 1;
        }
    }
    replaced
}

/// Tile loader substituted for the default one while a palette lookup is
/// active for a layer.
#[derive(Debug, Clone)]
pub struct LookupTileLoader {
    lookup: Rc<ColorLookup>,
}

impl LookupTileLoader {
    pub fn new(lookup: Rc<ColorLookup>) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &ColorLookup {
        &self.lookup
    }

    /// Decode a fetched tile and rewrite its pixels.
    pub fn load(&self, bytes: &[u8]) -> MapResult<RgbaImage> {
        let mut img = decode_tile(bytes)?;
        let replaced = apply_lookup(&mut img, &self.lookup);
        trace!(
            width = img.width(),
            height = img.height(),
            replaced = replaced,
            "Applied color lookup to tile"
        );
        Ok(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;
    use std::io::Cursor;

    const GREEN: Rgba = Rgba::new(0, 255, 0, 255);
    const RED: Rgba = Rgba::new(255, 0, 0, 255);
    const GREY: Rgba = Rgba::new(128, 128, 128, 255);

    fn encode_png(img: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn tile() -> RgbaImage {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Pixel(GREEN.to_array()));
        img.put_pixel(1, 0, Pixel(GREEN.to_array()));
        img.put_pixel(0, 1, Pixel(GREY.to_array()));
        img.put_pixel(1, 1, Pixel(RED.to_array()));
        img
    }

    #[test]
    fn test_apply_lookup_replaces_exact_matches() {
        let lookup = ColorLookup::from_pairs([(GREEN, RED), (RED, Rgba::TRANSPARENT)]);
        let mut img = tile();

        assert_eq!(apply_lookup(&mut img, &lookup), 3);
        assert_eq!(img.get_pixel(0, 0).0, RED.to_array());
        assert_eq!(img.get_pixel(1, 0).0, RED.to_array());
        assert_eq!(img.get_pixel(0, 1).0, GREY.to_array());
        assert_eq!(img.get_pixel(1, 1).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_empty_lookup_is_identity() {
        let mut img = tile();
        assert_eq!(apply_lookup(&mut img, &ColorLookup::default()), 0);
        assert_eq!(img, tile());
    }

    #[test]
    fn test_loader_decodes_and_rewrites() {
        let loader = LookupTileLoader::new(Rc::new(ColorLookup::from_pairs([(GREY, GREEN)])));
        let img = loader.load(&encode_png(&tile())).unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 1).0, GREEN.to_array());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let err = decode_tile(b"not an image").unwrap_err();
        assert!(matches!(err, MapError::Decode(_)));
    }
}
