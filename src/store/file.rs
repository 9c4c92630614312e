//! JSON-file-backed store.
//!
//! Persists the whole key space as a single JSON object. The file is read
//! once on open and rewritten after every mutation, so a cache
//! reconstructed over the same path sees everything a previous instance
//! wrote, including the last-change timestamp.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::store::{KeyValueStore, StoreError};

/// A persistent store backed by a single JSON file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`, creating parent directories as needed.
    /// A missing file is an empty store; a corrupt file is replaced on
    /// the next write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let entries = if path.exists() {
            let data = fs::read_to_string(&path)?;
            match serde_json::from_str(&data) {
                Ok(map) => map,
                Err(err) => {
                    warn!(path = %path.display(), %err, "Store file unreadable, starting empty");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), entries = entries.len(), "Opened file store");
        Ok(Self { path, entries })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Rewrite the whole file through a temp file so a crash mid-write
    // never leaves a truncated store behind.
    fn flush(&self) -> Result<(), StoreError> {
        let data = serde_json::to_string(&self.entries)
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.keys().cloned().collect())
    }
}
