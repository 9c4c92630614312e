//! In-memory backing store.
//!
//! The default store for tests and short-lived processes. An optional
//! entry quota makes it possible to exercise the QuotaExceeded paths
//! without a real size-bounded medium.

use std::collections::BTreeMap;

use crate::store::{KeyValueStore, StoreError};

/// A string map with an optional cap on the number of entries.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    /// Create an unbounded in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes of new keys once `max_entries`
    /// entries are present. Overwrites of existing keys always succeed.
    pub fn with_quota(max_entries: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(max_entries),
        }
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(max) = self.quota {
            if !self.entries.contains_key(key) && self.entries.len() >= max {
                return Err(StoreError::QuotaExceeded);
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.keys().cloned().collect())
    }
}
