//! Common types and utilities shared across the map client crates.

pub mod bbox;
pub mod config;
pub mod crs;
pub mod error;
pub mod layer;
pub mod palette;
pub mod projection;
pub mod source;
pub mod tile;
pub mod time;

pub use bbox::BoundingBox;
pub use config::{AppConfig, MapSettings};
pub use crs::CrsCode;
pub use error::{MapError, MapResult};
pub use layer::{EffectiveLayerDefinition, LayerDefinition, LayerId, LayerKind, Period};
pub use palette::{ColorLookup, PaletteKey, Rgba};
pub use projection::{ProjectionDescriptor, ProjectionId};
pub use source::{MatrixSet, SourceDescriptor};
pub use tile::{TileCoord, TileGrid};
pub use time::{date_id, parse_date_id};
