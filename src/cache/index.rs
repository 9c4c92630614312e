//! Logical-key index.
//!
//! Maps each user-facing logical key to the single tier-qualified storage
//! key it currently occupies. A logical key is bound to at most one tier
//! at a time; rebinding under a different tier is refused until the key
//! is removed or expires.

use std::collections::HashMap;

/// Logical key → full storage key.
#[derive(Debug, Default)]
pub struct KeyIndex {
    bindings: HashMap<String, String>,
}

impl KeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `logical_key` to `full_key`.
    ///
    /// Returns `true` if the key was unbound or already bound to the same
    /// full key (an idempotent re-set within the same tier). Returns
    /// `false` without touching the existing binding if the key is bound
    /// to a different full key.
    pub fn bind(&mut self, logical_key: &str, full_key: &str) -> bool {
        match self.bindings.get(logical_key) {
            Some(existing) if existing != full_key => false,
            _ => {
                self.bindings
                    .insert(logical_key.to_string(), full_key.to_string());
                true
            }
        }
    }

    /// The full storage key `logical_key` is bound to, if any.
    pub fn lookup(&self, logical_key: &str) -> Option<&str> {
        self.bindings.get(logical_key).map(String::as_str)
    }

    /// Drop the binding for `logical_key`. Absence is not an error.
    pub fn unbind(&mut self, logical_key: &str) {
        self.bindings.remove(logical_key);
    }

    /// Drop every binding whose full key appears in `purged`. Called
    /// after an invalidation pass so the index never references a key
    /// the engine just deleted.
    pub fn remove_purged(&mut self, purged: &[String]) {
        if purged.is_empty() {
            return;
        }
        self.bindings
            .retain(|_, full_key| !purged.contains(full_key));
    }

    /// Drop all bindings.
    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    /// Number of live bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no keys are bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
