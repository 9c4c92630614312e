//! The cache facade.
//!
//! [`TieredCache`] composes the tier registry, the key index, and the
//! invalidation engine over a backing store. Every public operation runs
//! invalidation first, so staleness is enforced lazily on access; an
//! expired entry can sit in the store until the next call touches it.
//!
//! The facade has a dual surface: `try_*` methods return `Result` for
//! callers that want the concrete failure, and the sentinel-return
//! wrappers (`get`/`set`/`remove`/`remove_all`) report the condition
//! through `tracing` and fold any failure into `None`/`false`, so no
//! error ever crosses that boundary.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::index::KeyIndex;
use crate::cache::invalidate::InvalidationEngine;
use crate::cache::tiers::{TierRegistry, TierSpec};
use crate::store::{KeyValueStore, StoreError};

/// Sentinel key written and removed by the availability probe.
const PROBE_KEY: &str = "__tier-cache-probe__";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Tier {0} does not exist")]
    UnknownTier(String),

    #[error("Cannot set existing key {key} under new tier {requested}")]
    TierMismatch { key: String, requested: String },

    #[error("Key {key} contains tier name {tier}")]
    ReservedNameCollision { key: String, tier: String },

    #[error("Backing store unavailable")]
    StoreUnavailable,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Tiered expiration cache over a [`KeyValueStore`].
///
/// Values are serialized to JSON at this boundary; the store only ever
/// sees opaque strings under tier-qualified keys
/// (`<tier-prefix-chain>-<logicalKey>`).
pub struct TieredCache<S: KeyValueStore> {
    store: S,
    registry: TierRegistry,
    index: KeyIndex,
    engine: InvalidationEngine,
}

impl<S: KeyValueStore> TieredCache<S> {
    /// Build a cache over `store` with the given tier specs.
    ///
    /// Invalid tier names are dropped (warned and recorded on the
    /// registry); construction never fails. The inactivity window is
    /// measured against whatever last-change timestamp the store already
    /// holds, so reconstructing over a previously used store picks up
    /// where the old instance left off. Key bindings are recovered from
    /// the store itself: every full key encodes its tier prefix, so the
    /// index is reseeded by stripping the deepest matching prefix.
    pub fn new(store: S, specs: &[TierSpec]) -> Self {
        let registry = TierRegistry::new(specs);
        let mut index = KeyIndex::new();

        match store.keys() {
            Ok(keys) => {
                for full_key in keys {
                    // Deepest prefix wins, so scan shortest-lived first:
                    // C-B-A-test belongs to tier A, not C.
                    let logical = registry.chain().iter().rev().find_map(|tier| {
                        full_key.strip_prefix(&format!("{}-", tier.prefix))
                    });
                    let Some(logical) = logical.map(str::to_string) else {
                        continue;
                    };
                    if !index.bind(&logical, &full_key) {
                        warn!(key = %logical, %full_key, "Conflicting persisted binding ignored");
                    }
                }
            }
            Err(err) => {
                warn!(%err, "Could not enumerate store keys, starting with an empty index");
            }
        }

        Self {
            store,
            registry,
            index,
            engine: InvalidationEngine::new(),
        }
    }

    /// The validated tier set.
    pub fn registry(&self) -> &TierRegistry {
        &self.registry
    }

    /// Number of logical keys currently bound.
    pub fn key_count(&self) -> usize {
        self.index.len()
    }

    /// Hand the backing store back, consuming the cache.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Retrieve and deserialize the value bound to `logical_key`.
    ///
    /// `Ok(None)` when the key is unbound or its tier was just purged.
    pub fn try_get<T: DeserializeOwned>(
        &mut self,
        logical_key: &str,
    ) -> Result<Option<T>, CacheError> {
        self.run_invalidation()?;

        let Some(full_key) = self.index.lookup(logical_key).map(str::to_string) else {
            return Ok(None);
        };

        match self.store.get_item(&full_key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => {
                // The entry vanished underneath the binding (e.g. another
                // instance purged it). Heal the index.
                self.index.unbind(logical_key);
                Ok(None)
            }
        }
    }

    /// Serialize `value` and store it under `logical_key` in `tier`.
    ///
    /// Guards run in order, short-circuiting on the first failure:
    /// tier existence, store availability, reserved-name collision,
    /// tier-rebinding conflict. The index binding is only updated after
    /// the write has succeeded, so a quota failure can never leave the
    /// index pointing at a key that was never written.
    pub fn try_set<T: Serialize>(
        &mut self,
        logical_key: &str,
        value: &T,
        tier: &str,
    ) -> Result<(), CacheError> {
        let prefix = self
            .registry
            .get(tier)
            .ok_or_else(|| CacheError::UnknownTier(tier.to_string()))?
            .prefix
            .clone();

        if !self.probe() {
            return Err(CacheError::StoreUnavailable);
        }

        if let Some(name) = self.registry.name_collision(logical_key) {
            return Err(CacheError::ReservedNameCollision {
                key: logical_key.to_string(),
                tier: name.to_string(),
            });
        }

        let full_key = format!("{prefix}-{logical_key}");
        if let Some(existing) = self.index.lookup(logical_key) {
            if existing != full_key {
                return Err(CacheError::TierMismatch {
                    key: logical_key.to_string(),
                    requested: tier.to_string(),
                });
            }
        }

        self.run_invalidation()?;

        let serialized = serde_json::to_string(value)?;
        self.store.set_item(&full_key, &serialized)?;
        self.index.bind(logical_key, &full_key);

        debug!(key = logical_key, tier, %full_key, "Stored value");
        Ok(())
    }

    /// Delete the entry bound to `logical_key`.
    ///
    /// `Ok(false)` when the key is unbound.
    pub fn try_remove(&mut self, logical_key: &str) -> Result<bool, CacheError> {
        let Some(full_key) = self.index.lookup(logical_key).map(str::to_string) else {
            return Ok(false);
        };

        self.store.remove_item(&full_key)?;
        self.index.unbind(logical_key);
        self.run_invalidation()?;

        debug!(key = logical_key, %full_key, "Removed value");
        Ok(true)
    }

    /// Purge every key under the longest-lived tier's prefix (which, by
    /// nesting, covers all tiers), clear the index, and reset the
    /// inactivity window. Keys outside the tier namespace are spared.
    pub fn try_remove_all(&mut self) -> Result<(), CacheError> {
        if !self.probe() {
            return Err(CacheError::StoreUnavailable);
        }

        if let Some(root) = self.registry.root() {
            let prefix = root.prefix.clone();
            let purged = self.engine.purge_prefix(&mut self.store, &prefix)?;
            debug!(purged = purged.len(), "Cleared all tiers");
        }
        self.index.clear();
        self.engine.reset_window(&mut self.store, Self::now_ms())?;
        Ok(())
    }

    /// Sentinel wrapper over [`try_get`](Self::try_get): fails closed.
    pub fn get<T: DeserializeOwned>(&mut self, logical_key: &str) -> Option<T> {
        match self.try_get(logical_key) {
            Ok(value) => value,
            Err(err) => {
                warn!(key = logical_key, %err, "Get failed");
                None
            }
        }
    }

    /// Sentinel wrapper over [`try_set`](Self::try_set).
    pub fn set<T: Serialize>(&mut self, logical_key: &str, value: &T, tier: &str) -> bool {
        match self.try_set(logical_key, value, tier) {
            Ok(()) => true,
            Err(err) => {
                warn!(key = logical_key, tier, %err, "Set refused");
                false
            }
        }
    }

    /// Sentinel wrapper over [`try_remove`](Self::try_remove).
    pub fn remove(&mut self, logical_key: &str) -> bool {
        match self.try_remove(logical_key) {
            Ok(removed) => removed,
            Err(err) => {
                warn!(key = logical_key, %err, "Remove failed");
                false
            }
        }
    }

    /// Sentinel wrapper over [`try_remove_all`](Self::try_remove_all).
    pub fn remove_all(&mut self) -> bool {
        match self.try_remove_all() {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "Remove-all failed");
                false
            }
        }
    }

    /// Probe the backing store by writing and removing a sentinel key.
    ///
    /// A QuotaExceeded probe failure marks the store unavailable only
    /// when it already holds at least one entry; quota signals from an
    /// empty store are treated as transient and the store is considered
    /// available. Any other failure is unavailable. The sentinel is
    /// released on every exit path.
    pub fn is_available(&mut self) -> bool {
        self.probe()
    }

    fn probe(&mut self) -> bool {
        match self.store.set_item(PROBE_KEY, "probe") {
            Ok(()) => {
                let _ = self.store.remove_item(PROBE_KEY);
                true
            }
            Err(StoreError::QuotaExceeded) => {
                let _ = self.store.remove_item(PROBE_KEY);
                let occupied = self.store.keys().map(|k| !k.is_empty()).unwrap_or(true);
                if occupied {
                    warn!("Availability probe hit quota on an occupied store");
                }
                !occupied
            }
            Err(err) => {
                let _ = self.store.remove_item(PROBE_KEY);
                warn!(%err, "Availability probe failed");
                false
            }
        }
    }

    fn run_invalidation(&mut self) -> Result<(), CacheError> {
        let outcome = self
            .engine
            .invalidate(&self.registry, &mut self.store, Self::now_ms())?;
        self.index.remove_purged(&outcome.purged);
        Ok(())
    }

    fn now_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}
