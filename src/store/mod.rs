//! Backing-store abstraction.
//!
//! The cache core treats storage as an opaque string-keyed, string-valued
//! map behind the [`KeyValueStore`] trait:
//! - [`memory`]: in-memory store with an optional entry quota
//! - [`file`]: JSON-file-backed store that survives process restarts

pub mod file;
pub mod memory;

use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store quota exceeded")]
    QuotaExceeded,

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The capability set the cache requires from a backing store.
///
/// Values are opaque strings; the cache facade owns serialization at its
/// own boundary. `keys` exists so the invalidation engine can scan the
/// flat namespace for stale-prefix matches.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, overwriting any previous value.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Deleting an absent key is not an error.
    fn remove_item(&mut self, key: &str) -> Result<(), StoreError>;

    /// Enumerate every key currently present.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }
}
