//! Zoom button state and the pointer coordinate readout.

use map_common::CrsCode;

/// Enabled state of the zoom buttons at a zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomButtons {
    pub zoom_in: bool,
    pub zoom_out: bool,
}

impl ZoomButtons {
    pub fn at(zoom: u32, max_zoom: u32) -> Self {
        Self {
            zoom_in: zoom < max_zoom,
            zoom_out: zoom > 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

/// Format decimal degrees as degrees, minutes and seconds with a
/// hemisphere letter, e.g. `38°53'23"N`.
pub fn format_dms(value: f64, axis: Axis) -> String {
    let hemisphere = match (axis, value < 0.0) {
        (Axis::Latitude, false) => 'N',
        (Axis::Latitude, true) => 'S',
        (Axis::Longitude, false) => 'E',
        (Axis::Longitude, true) => 'W',
    };
    let total = (value.abs() * 3600.0).round() as u64;
    let degrees = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{}°{:02}'{:02}\"{}", degrees, minutes, seconds, hemisphere)
}

/// Readout for a geographic position (longitude, latitude), suffixed with
/// the code of the projection being viewed.
pub fn coordinate_readout(lon_lat: (f64, f64), crs: &CrsCode) -> String {
    format!(
        "{}, {} {}",
        format_dms(lon_lat.1, Axis::Latitude),
        format_dms(lon_lat.0, Axis::Longitude),
        crs
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_buttons() {
        assert_eq!(
            ZoomButtons::at(0, 8),
            ZoomButtons { zoom_in: true, zoom_out: false }
        );
        assert_eq!(
            ZoomButtons::at(8, 8),
            ZoomButtons { zoom_in: false, zoom_out: true }
        );
        assert_eq!(
            ZoomButtons::at(3, 8),
            ZoomButtons { zoom_in: true, zoom_out: true }
        );
    }

    #[test]
    fn test_format_dms() {
        assert_eq!(format_dms(38.8897, Axis::Latitude), "38°53'23\"N");
        assert_eq!(format_dms(-77.0089, Axis::Longitude), "77°00'32\"W");
        assert_eq!(format_dms(0.0, Axis::Longitude), "0°00'00\"E");
        assert_eq!(format_dms(-90.0, Axis::Latitude), "90°00'00\"S");
    }

    #[test]
    fn test_coordinate_readout() {
        assert_eq!(
            coordinate_readout((-77.0089, 38.8897), &CrsCode::Epsg4326),
            "38°53'23\"N, 77°00'32\"W EPSG:4326"
        );
    }
}
