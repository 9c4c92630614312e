//! tier-cache CLI.
//!
//! One cache operation per invocation against the store selected in the
//! config file. Because the inactivity timestamp lives in the store
//! itself, successive invocations over a file-backed store behave exactly
//! like successive calls on one long-lived cache instance.

use clap::Parser;
use tracing::info;

use tier_cache::config::{Cli, Command, Config};
use tier_cache::TieredCache;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "tier_cache=debug"
    } else {
        "tier_cache=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true)
        .init();

    // Load configuration and bind the backing store.
    let config = Config::load(&cli.config)?;
    let store = config.open_store()?;

    info!(
        tiers = config.tiers.len(),
        target = ?config.target,
        "Configuration loaded"
    );

    let mut cache = TieredCache::new(store, &config.tiers);
    for name in cache.registry().rejected() {
        eprintln!("warning: tier {name:?} dropped (whitespace in name)");
    }

    let ok = match cli.command {
        Command::Get { key } => match cache.get::<serde_json::Value>(&key) {
            Some(value) => {
                println!("{value}");
                true
            }
            None => {
                println!("null");
                true
            }
        },
        Command::Set { key, value, tier } => {
            // Accept raw JSON; anything unparseable is stored as a string.
            let value: serde_json::Value = serde_json::from_str(&value)
                .unwrap_or(serde_json::Value::String(value));
            cache.set(&key, &value, &tier)
        }
        Command::Remove { key } => cache.remove(&key),
        Command::RemoveAll => cache.remove_all(),
        Command::Check => {
            let available = cache.is_available();
            println!("{}", if available { "available" } else { "unavailable" });
            available
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}
