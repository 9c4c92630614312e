//! Invalidation engine: inactivity measurement and stale-tier purging.
//!
//! The engine runs at the start of every cache operation. It compares the
//! current instant against a timestamp persisted in the backing store,
//! walks the tier chain longest-lived first, and once it meets a tier
//! whose expiration the measured inactivity has reached, deletes every
//! key under that tier's accumulated prefix. Because prefixes nest, that
//! one deletion pass covers every shorter-lived tier as well.

use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::tiers::{TierEntry, TierRegistry};
use crate::store::{KeyValueStore, StoreError};

/// Reserved store key holding the JSON-encoded timestamp (milliseconds
/// since the Unix epoch) of the last invalidation-running operation.
pub const LAST_CHANGE_KEY: &str = "last-change";

/// Outcome of one invalidation pass.
#[derive(Debug, Default)]
pub struct Invalidation {
    /// Time since the previous operation, or `None` on first-ever use.
    pub inactivity: Option<Duration>,

    /// Full storage keys deleted by this pass. The caller prunes its
    /// key index with these.
    pub purged: Vec<String>,
}

/// The invalidation policy engine.
#[derive(Debug, Default)]
pub struct InvalidationEngine;

impl InvalidationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Run one invalidation pass at instant `now_ms`.
    ///
    /// Reads the persisted last-change timestamp, purges stale tiers, and
    /// unconditionally rewrites the timestamp to `now_ms` so the
    /// inactivity window resets on every access, not only on mutations.
    pub fn invalidate<S: KeyValueStore>(
        &self,
        registry: &TierRegistry,
        store: &mut S,
        now_ms: u64,
    ) -> Result<Invalidation, StoreError> {
        let last_change = match self.read_timestamp(store)? {
            Some(ms) => ms,
            None => {
                // First-ever use: nothing to measure against, no purge.
                self.write_timestamp(store, now_ms)?;
                return Ok(Invalidation::default());
            }
        };

        let inactivity = Duration::from_millis(now_ms.saturating_sub(last_change));

        let purged = match self.stale_boundary(registry, inactivity) {
            Some(boundary) => {
                let purged = self.purge_prefix(store, &boundary.prefix)?;
                debug!(
                    boundary = %boundary.name,
                    prefix = %boundary.prefix,
                    purged = purged.len(),
                    inactivity_ms = inactivity.as_millis() as u64,
                    "Purged stale tiers"
                );
                purged
            }
            None => Vec::new(),
        };

        self.write_timestamp(store, now_ms)?;

        Ok(Invalidation {
            inactivity: Some(inactivity),
            purged,
        })
    }

    /// Find the stale boundary: the longest-lived tier whose expiration
    /// the inactivity has reached. Everything at and below it is stale.
    /// Equality expires (`inactivity >= expiration`).
    pub fn stale_boundary<'a>(
        &self,
        registry: &'a TierRegistry,
        inactivity: Duration,
    ) -> Option<&'a TierEntry> {
        registry
            .chain()
            .iter()
            .find(|tier| inactivity >= tier.expiration)
    }

    /// Delete every key under `prefix` and return the deleted keys.
    ///
    /// Matching is anchored starts-with on `<prefix>-`, never substring
    /// containment: a tier prefix must not match a sibling key that
    /// merely contains the same characters elsewhere, and the trailing
    /// separator keeps `C-B` from matching a key whose first segment
    /// only extends the prefix string.
    pub fn purge_prefix<S: KeyValueStore>(
        &self,
        store: &mut S,
        prefix: &str,
    ) -> Result<Vec<String>, StoreError> {
        let filter = format!("{prefix}-");
        let mut purged = Vec::new();
        for key in store.keys()? {
            if key.starts_with(&filter) {
                store.remove_item(&key)?;
                purged.push(key);
            }
        }
        Ok(purged)
    }

    /// Reset the inactivity window to `now_ms` without measuring or
    /// purging anything. Used after a full clear.
    pub fn reset_window<S: KeyValueStore>(
        &self,
        store: &mut S,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        self.write_timestamp(store, now_ms)
    }

    fn read_timestamp<S: KeyValueStore>(&self, store: &S) -> Result<Option<u64>, StoreError> {
        let Some(raw) = store.get_item(LAST_CHANGE_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<u64>(&raw) {
            Ok(ms) => Ok(Some(ms)),
            Err(err) => {
                // Unmeasurable inactivity: treat as first use rather than
                // purging fresh data against a garbage baseline.
                warn!(%err, "Last-change timestamp unreadable, treating as absent");
                Ok(None)
            }
        }
    }

    fn write_timestamp<S: KeyValueStore>(
        &self,
        store: &mut S,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        let encoded = now_ms.to_string();
        store.set_item(LAST_CHANGE_KEY, &encoded)
    }
}
