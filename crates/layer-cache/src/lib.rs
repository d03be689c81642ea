//! Bounded least-recently-used cache for constructed map layers.
//!
//! Entries are evicted immediately when an insertion takes the cache over
//! its capacity, so the bound holds after every call. Access through
//! [`LayerCache::get`] or [`LayerCache::put`] refreshes recency;
//! [`LayerCache::peek`] does not.
//!
//! The cache never reaches outside itself. Evicted values are handed back to
//! the caller, which is responsible for detaching them from anything still
//! displaying them.
//!
//! ## Statistics
//!
//! - `hits`/`misses`: lookups through `get`
//! - `evictions`: entries dropped for capacity
//! - `invalidations`: entries dropped by `remove_matching`

pub mod cache;

pub use cache::{CacheError, CacheStats, LayerCache};
