//! Runtime configuration for tier-cache.
//!
//! Configuration is loaded from a JSON file or constructed
//! programmatically. It selects the backing store and carries the full
//! tier set; tier validation itself happens in the registry.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::cache::tiers::TierSpec;
use crate::store::{FileStore, KeyValueStore, MemoryStore, StoreError};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "tier-cache", about = "Tiered expiration cache over a key-value store")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// One cache operation per invocation.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Retrieve the value bound to a key.
    Get { key: String },

    /// Store a JSON value under a key in a tier.
    Set {
        key: String,
        /// Value, parsed as JSON (falls back to a plain string).
        value: String,
        /// Tier name the key belongs to.
        #[arg(short, long)]
        tier: String,
    },

    /// Remove the value bound to a key.
    Remove { key: String },

    /// Purge every key under every tier.
    RemoveAll,

    /// Probe whether the backing store is usable.
    Check,
}

/// Selects the concrete backing store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Target {
    /// Volatile in-memory store.
    Memory,
    /// JSON-file-backed store at the given path.
    File { path: PathBuf },
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Which backing store to bind.
    pub target: Target,

    /// The full tier set; order is irrelevant, the registry sorts it.
    pub tiers: Vec<TierSpec>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target: Target::File {
                path: PathBuf::from("tier-cache.json"),
            },
            tiers: vec![
                TierSpec {
                    name: "session".to_string(),
                    expiration_ms: 30 * 60 * 1000,
                },
                TierSpec {
                    name: "day".to_string(),
                    expiration_ms: 24 * 60 * 60 * 1000,
                },
            ],
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file is absent.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let data = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&data)?;
            Ok(config)
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Ok(Config::default())
        }
    }

    /// Open the backing store this configuration selects.
    pub fn open_store(&self) -> Result<Box<dyn KeyValueStore>, StoreError> {
        match &self.target {
            Target::Memory => Ok(Box::new(MemoryStore::new())),
            Target::File { path } => Ok(Box::new(FileStore::open(path)?)),
        }
    }
}
