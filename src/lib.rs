//! tier-cache: tiered expiration cache over a pluggable key-value store.
//!
//! Clients register named tiers, each with a duration. A value set under
//! a tier survives until the store has gone untouched (no get/set across
//! any tier) for at least that tier's duration; at that point the tier
//! and every shorter-lived tier are purged en masse. Inactivity is
//! measured against a timestamp persisted in the store itself, so it
//! survives process restarts. Invalidation is lazy: it runs at the start
//! of every operation, never in the background.

pub mod cache;
pub mod config;
pub mod store;

pub use cache::facade::{CacheError, TieredCache};
pub use cache::index::KeyIndex;
pub use cache::invalidate::{Invalidation, InvalidationEngine, LAST_CHANGE_KEY};
pub use cache::tiers::{TierEntry, TierRegistry, TierSpec};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
