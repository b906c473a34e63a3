//! Tagged Flush Demo
//!
//! Writes entries under overlapping tag sets, flushes one tag and shows
//! which entries remain reachable.
//!
//! Usage:
//!   cargo run --example tagged_flush
//!
//! Environment variables (a `.env` file is read too):
//!   CACHE_DRIVER - memory, file, redis, ... (default: memory)
//!   CACHE_PATH   - cache directory for the file driver
//!   REDIS_URL    - connection URL for the redis driver

use ouroboros_cache::{CacheManager, CacheManagerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = CacheManagerConfig::from_env();
    let manager = CacheManager::new(config)?;
    let cache = manager.store(None).await?;

    info!("=== Tagged Flush Demo ({}) ===", cache.store().name());

    cache.tags(["people", "artists"])?.put("john", "John Lennon", 10).await?;
    cache.tags(["people", "authors"])?.put("anne", "Anne Rice", 10).await?;
    cache.tags(["artists"])?.forever("yoko", "Yoko Ono").await?;

    info!("Flushing tag: artists");
    cache.tags(["artists"])?.flush().await?;

    for (tags, key) in [
        (vec!["people", "artists"], "john"),
        (vec!["people", "authors"], "anne"),
        (vec!["artists"], "yoko"),
    ] {
        let value = cache.tags(tags.clone())?.get(key).await?;
        info!("{:?} {} -> {:?}", tags, key, value);
    }

    Ok(())
}
