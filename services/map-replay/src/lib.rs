//! Scenario replay for the map client.
//!
//! Loads a map configuration and a scenario of user actions, drives the
//! selection model and the map reconciler over headless surfaces, and
//! reports the resulting layer stacks.

pub mod replay;
pub mod scenario;
pub mod snapshot;

pub use replay::Replay;
pub use scenario::{Scenario, Step, Window};
pub use snapshot::Snapshot;
