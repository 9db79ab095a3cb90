// src/cache/mod.rs

//! Content-addressable bundle cache with watch-driven invalidation.

pub mod slot;
pub mod store;
pub mod watcher;

pub use slot::{BundleSlot, SlotConfig, SlotPolicy, SlotState, WatchStatus};
pub use store::BundleStore;
pub use watcher::WatchGroup;
