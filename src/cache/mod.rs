//! Tiered expiration cache core.
//!
//! This module contains the cache data structures and algorithms:
//! - [`tiers`]: TierRegistry and the derived prefix chain
//! - [`index`]: KeyIndex, the one-tier-per-key binding table
//! - [`invalidate`]: InvalidationEngine, inactivity tracking and purging
//! - [`facade`]: TieredCache, the public get/set/remove surface

pub mod facade;
pub mod index;
pub mod invalidate;
pub mod tiers;
