//! Map layer composition and caching.
//!
//! This crate turns declarative layer definitions into displayable tile
//! layers and keeps a set of per-projection map surfaces consistent with the
//! user's selection:
//!
//! - [`key`]: reuse identity of a constructed layer
//! - [`factory`]: WMTS/WMS layer construction behind an LRU cache
//! - [`reconciler`]: [`MapUi`], which applies model changes to the surfaces
//! - [`state`]: an in-memory [`MapModel`] implementation
//! - [`lookup`]: palette driven pixel rewriting for tiles
//!
//! Everything here is single-threaded; layer handles are shared with `Rc`.

pub mod controls;
pub mod factory;
pub mod handle;
pub mod key;
pub mod lookup;
pub mod model;
pub mod observer;
pub mod reconciler;
pub mod state;
pub mod surface;
pub mod throttle;

pub use controls::{format_dms, Axis, ZoomButtons};
pub use factory::{CreateOptions, LayerFactory};
pub use handle::{LayerHandle, TileLayer, TileSource};
pub use key::{derive_key, LayerKey};
pub use lookup::{apply_lookup, LookupTileLoader};
pub use model::{LayerQuery, MapModel, ModelEvent, PaletteChange};
pub use observer::{Observable, Subscription};
pub use reconciler::{LayerFailure, MapUi, Reconciled};
pub use state::SelectionState;
pub use surface::{Control, HeadlessSurface, MapSurface};
pub use throttle::{Clock, ExtentThrottle, ManualClock, SystemClock};
