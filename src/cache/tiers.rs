//! Tier registration and the hierarchical prefix chain.
//!
//! Tiers are sorted longest-lived first; each tier's storage prefix is its
//! parent's prefix plus its own name, hyphen-joined. Every key stored
//! under a tier therefore carries the names of all longer-lived tiers in
//! front of it, which is what lets one inactivity threshold purge a tier
//! together with everything nested inside it.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A tier definition as supplied by configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierSpec {
    /// Tier name. Must not contain whitespace; it becomes part of the
    /// storage key namespace.
    pub name: String,

    /// Inactivity budget in milliseconds. Once the store has gone
    /// untouched this long, the tier and all shorter-lived tiers expire.
    pub expiration_ms: u64,
}

/// An accepted tier with its derived storage prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierEntry {
    /// Tier name.
    pub name: String,

    /// Accumulated prefix: all tier names from the longest-lived tier
    /// down to this one, hyphen-joined.
    pub prefix: String,

    /// Inactivity budget.
    pub expiration: Duration,
}

/// The validated, ordered tier set.
#[derive(Debug, Clone, Default)]
pub struct TierRegistry {
    /// Tiers sorted by expiration, descending. Ties keep input order.
    chain: Vec<TierEntry>,

    /// Tier name → index into `chain`.
    by_name: HashMap<String, usize>,

    /// Names rejected at registration (whitespace in the name).
    rejected: Vec<String>,
}

impl TierRegistry {
    /// Build a registry from tier specs.
    ///
    /// Specs whose name contains whitespace are dropped and reported;
    /// the registry continues with the remainder. The sort is stable, so
    /// two tiers with equal expiration keep their relative input order
    /// (they still get adjacent but distinct prefixes).
    pub fn new(specs: &[TierSpec]) -> Self {
        let mut accepted: Vec<TierSpec> = Vec::with_capacity(specs.len());
        let mut rejected = Vec::new();

        for spec in specs {
            if spec.name.chars().any(char::is_whitespace) {
                warn!(tier = %spec.name, "Invalid tier name with whitespace, dropping");
                rejected.push(spec.name.clone());
            } else {
                accepted.push(spec.clone());
            }
        }

        accepted.sort_by(|a, b| b.expiration_ms.cmp(&a.expiration_ms));

        let mut chain: Vec<TierEntry> = Vec::with_capacity(accepted.len());
        let mut by_name = HashMap::with_capacity(accepted.len());
        for spec in accepted {
            let prefix = match chain.last() {
                None => spec.name.clone(),
                Some(parent) => format!("{}-{}", parent.prefix, spec.name),
            };
            by_name.insert(spec.name.clone(), chain.len());
            chain.push(TierEntry {
                name: spec.name,
                prefix,
                expiration: Duration::from_millis(spec.expiration_ms),
            });
        }

        Self {
            chain,
            by_name,
            rejected,
        }
    }

    /// Look up a tier by name.
    pub fn get(&self, name: &str) -> Option<&TierEntry> {
        self.by_name.get(name).map(|&i| &self.chain[i])
    }

    /// The ordered chain, longest-lived tier first.
    pub fn chain(&self) -> &[TierEntry] {
        &self.chain
    }

    /// The longest-lived tier, whose prefix covers every other tier.
    pub fn root(&self) -> Option<&TierEntry> {
        self.chain.first()
    }

    /// Tier names dropped at registration.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    /// Number of accepted tiers.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether no tiers were accepted.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Returns the first registered tier name that occurs inside
    /// `logical_key`, if any. Logical keys must not contain tier names:
    /// the invalidation engine matches prefixes over a flat namespace,
    /// and a tier name embedded in a key could fall inside a purge match.
    pub fn name_collision(&self, logical_key: &str) -> Option<&str> {
        self.chain
            .iter()
            .find(|tier| logical_key.contains(&tier.name))
            .map(|tier| tier.name.as_str())
    }
}
