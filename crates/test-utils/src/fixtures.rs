//! Common test fixtures for the map client tests.
//!
//! The configuration mirrors a small deployment: three projections, daily
//! and static base layers, palette driven overlays, static and daily WMS
//! overlays and a graticule.

use chrono::NaiveDate;
use map_common::AppConfig;

/// Palette colors used by the fixture configuration.
pub mod colors {
    pub const RED: &str = "ff0000ff";
    pub const LIGHT_RED: &str = "fff0f0ff";
    pub const DARK_RED: &str = "400000ff";
    pub const GREEN: &str = "00ff00ff";
    pub const YELLOW: &str = "ffff00ff";
    pub const BLUE: &str = "0000ffff";
    pub const LIGHT_BLUE: &str = "f0f0ffff";
    pub const DARK_BLUE: &str = "000040";
}

/// Bounding boxes in geographic coordinates.
pub mod bbox {
    /// Whole world
    pub const GLOBAL: [f64; 4] = [-180.0, -90.0, 180.0, 90.0];

    /// Continental United States
    pub const CONUS: [f64; 4] = [-130.0, 20.0, -60.0, 55.0];

    /// Europe
    pub const EUROPE: [f64; 4] = [-15.0, 35.0, 45.0, 72.0];
}

pub const CONFIG_JSON: &str = r#"{
    "defaults": {"projection": "geographic"},
    "projections": {
        "geographic": {
            "id": "geographic", "epsg": 4326, "crs": "EPSG:4326",
            "maxExtent": [-180, -90, 180, 90],
            "resolutions": [0.5625, 0.28125, 0.140625, 0.0703125, 0.03515625,
                            0.017578125, 0.0087890625, 0.00439453125],
            "startCenter": [0, 0],
            "startZoom": 2
        },
        "arctic": {
            "id": "arctic", "epsg": 3413, "crs": "EPSG:3413",
            "maxExtent": [-4194304, -4194304, 4194304, 4194304],
            "resolutions": [8192, 4096, 2048, 1024, 512, 256],
            "startCenter": [0, 0],
            "startZoom": 1
        },
        "antarctic": {
            "id": "antarctic", "epsg": 3031, "crs": "EPSG:3031",
            "maxExtent": [-4194304, -4194304, 4194304, 4194304],
            "resolutions": [8192, 4096, 2048, 1024, 512, 256],
            "startZoom": 1
        }
    },
    "sources": {
        "gibs-geographic": {
            "url": "https://gibs.earthdata.nasa.gov/wmts/epsg4326/best/wmts.cgi",
            "matrixSets": {
                "EPSG4326_250m": {
                    "id": "EPSG4326_250m",
                    "resolutions": [0.5625, 0.28125, 0.140625, 0.0703125, 0.03515625,
                                    0.017578125, 0.0087890625, 0.00439453125],
                    "tileSize": [512, 512]
                },
                "EPSG4326_2km": {
                    "id": "EPSG4326_2km",
                    "resolutions": [0.5625, 0.28125, 0.140625, 0.0703125, 0.03515625],
                    "tileSize": [512, 512]
                }
            }
        },
        "gibs-arctic": {
            "url": "https://gibs.earthdata.nasa.gov/wmts/epsg3413/best/wmts.cgi",
            "matrixSets": {
                "EPSG3413_250m": {
                    "id": "EPSG3413_250m",
                    "resolutions": [8192, 4096, 2048, 1024, 512, 256],
                    "tileSize": [512, 512]
                }
            }
        },
        "gibs-antarctic": {
            "url": "https://gibs.earthdata.nasa.gov/wmts/epsg3031/best/wmts.cgi",
            "matrixSets": {
                "EPSG3031_250m": {
                    "id": "EPSG3031_250m",
                    "resolutions": [8192, 4096, 2048, 1024, 512, 256],
                    "tileSize": [512, 512]
                }
            }
        },
        "gibs-wms": {
            "url": "https://gibs.earthdata.nasa.gov/wms/epsg4326/best/wms.cgi"
        }
    },
    "layers": {
        "terra-cr": {
            "id": "terra-cr", "group": "baselayers",
            "period": "daily", "startDate": "2000-01-01",
            "type": "wmts", "source": "gibs-geographic", "matrixSet": "EPSG4326_250m",
            "layer": "MODIS_Terra_CorrectedReflectance_TrueColor", "format": "image/jpeg",
            "projections": {
                "geographic": {},
                "arctic": {"source": "gibs-arctic", "matrixSet": "EPSG3413_250m"},
                "antarctic": {"source": "gibs-antarctic", "matrixSet": "EPSG3031_250m"}
            }
        },
        "aqua-cr": {
            "id": "aqua-cr", "group": "baselayers",
            "period": "daily", "startDate": "2002-01-01",
            "type": "wmts", "source": "gibs-geographic", "matrixSet": "EPSG4326_250m",
            "layer": "MODIS_Aqua_CorrectedReflectance_TrueColor", "format": "image/jpeg",
            "projections": {
                "geographic": {},
                "arctic": {"source": "gibs-arctic", "matrixSet": "EPSG3413_250m"},
                "antarctic": {"source": "gibs-antarctic", "matrixSet": "EPSG3031_250m"}
            }
        },
        "mask": {
            "id": "mask", "group": "baselayers",
            "type": "wmts", "source": "gibs-geographic", "matrixSet": "EPSG4326_250m",
            "layer": "Land_Water_Map", "format": "image/png",
            "projections": {
                "geographic": {},
                "arctic": {"source": "gibs-arctic", "matrixSet": "EPSG3413_250m"},
                "antarctic": {"source": "gibs-antarctic", "matrixSet": "EPSG3031_250m"}
            }
        },
        "terra-aod": {
            "id": "terra-aod", "group": "overlays",
            "period": "daily", "startDate": "2000-01-01",
            "type": "wmts", "source": "gibs-geographic", "matrixSet": "EPSG4326_2km",
            "layer": "MODIS_Terra_Aerosol", "format": "image/png",
            "projections": {"geographic": {}},
            "palette": {"id": "terra-aod"}
        },
        "aqua-aod": {
            "id": "aqua-aod", "group": "overlays",
            "period": "daily", "startDate": "2002-01-01",
            "type": "wmts", "source": "gibs-geographic", "matrixSet": "EPSG4326_2km",
            "layer": "MODIS_Aqua_Aerosol", "format": "image/png",
            "projections": {"geographic": {}},
            "palette": {"id": "aqua-aod"}
        },
        "combo-aod": {
            "id": "combo-aod", "group": "overlays",
            "type": "wms", "source": "gibs-wms",
            "layer": "MODIS_Combined_Aerosol", "format": "image/png",
            "projections": {"geographic": {}}
        },
        "combo-aod-daily": {
            "id": "combo-aod-daily", "group": "overlays",
            "period": "daily", "startDate": "2000-01-01",
            "type": "wms", "source": "gibs-wms",
            "layer": "MODIS_Combined_Aerosol_Daily", "format": "image/png",
            "projections": {"geographic": {}}
        },
        "graticule": {
            "id": "graticule", "group": "overlays",
            "type": "graticule",
            "projections": {"geographic": {}, "arctic": {}, "antarctic": {}}
        }
    },
    "palettes": {
        "rendered": {
            "terra-aod": {
                "scale": {
                    "colors": ["00ff00ff", "ffff00ff", "ff0000ff"],
                    "labels": ["0", "1", "2"],
                    "values": [0, 1, 2]
                }
            },
            "aqua-aod": {
                "scale": {
                    "colors": ["00ff00ff", "ffff00ff", "ff0000ff"],
                    "labels": ["0", "1", "2"],
                    "values": [0, 1, 2]
                }
            }
        },
        "custom": {
            "blue-1": {"colors": ["f0f0ffff", "0000ffff", "000040"]},
            "red-1": {"colors": ["fff0f0ff", "ff0000ff", "400000ff"]}
        }
    }
}"#;

/// The fixture configuration.
pub fn config() -> AppConfig {
    AppConfig::from_json(CONFIG_JSON).expect("fixture configuration parses")
}

/// The fixture configuration with a different cache capacity.
pub fn config_with_capacity(capacity: usize) -> AppConfig {
    let mut config = config();
    config.map.cache_capacity = capacity;
    config
}

/// Default selected date of the scenarios.
pub fn date() -> NaiveDate {
    ymd(2014, 1, 1)
}

pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

#[cfg(test)]
mod tests {
    use super::*;
    use map_common::{LayerId, ProjectionId};

    #[test]
    fn test_fixture_config_is_valid() {
        let config = config();
        config.validate().unwrap();
        assert_eq!(config.projections.len(), 3);
        assert_eq!(config.layers.len(), 8);
    }

    #[test]
    fn test_fixture_layers() {
        let config = config();
        let graticule = config.layer("graticule").unwrap();
        assert!(graticule.is_graticule(&ProjectionId::from("arctic")));

        let aod = config.layer("terra-aod").unwrap();
        assert!(aod.is_daily());
        assert!(!aod.supports_projection(&ProjectionId::from("arctic")));
        assert_eq!(aod.id, LayerId::from("terra-aod"));
    }

    #[test]
    fn test_capacity_override() {
        assert_eq!(config_with_capacity(2).map.cache_capacity, 2);
    }
}
