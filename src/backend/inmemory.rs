//! In-memory response cache (default, process-lifetime only).
//!
//! Uses DashMap for concurrent access with per-key sharding. Expiry is
//! checked on read; nothing is evicted in the background or by size.

use super::CacheBackend;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Cached bytes plus the moment they were fetched.
struct CacheEntry {
    data: Vec<u8>,
    fetched_at: Instant,
    ttl: Option<Duration>,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        CacheEntry {
            data,
            fetched_at: Instant::now(),
            ttl,
        }
    }

    /// Valid only while `now - fetched_at < ttl`.
    fn is_expired(&self) -> bool {
        self.ttl.is_some_and(|ttl| self.fetched_at.elapsed() >= ttl)
    }
}

/// Thread-safe async in-memory cache backend.
///
/// Clones share the same map. Timestamps come from `tokio::time`, so a
/// paused test clock moves entries across their TTL deterministically.
///
/// # Example
///
/// ```no_run
/// use pokedex_kit::backend::{CacheBackend, InMemoryBackend};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = InMemoryBackend::new();
///
///     backend
///         .set("pokemon:25", b"pikachu".to_vec(), Some(Duration::from_secs(300)))
///         .await?;
///     assert!(backend.get("pokemon:25").await?.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, CacheEntry>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        InMemoryBackend {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Number of stored entries, expired ones included until overwritten.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.store.get(key) {
            if !entry.is_expired() {
                debug!("✓ InMemory GET {} -> HIT", key);
                return Ok(Some(entry.data.clone()));
            }
        }

        // Expired entries stay until the next successful fetch overwrites them.
        debug!("✓ InMemory GET {} -> MISS", key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        self.store
            .insert(key.to_string(), CacheEntry::new(value, ttl));

        match ttl {
            Some(d) => debug!("✓ InMemory SET {} (TTL: {:?})", key, d),
            None => debug!("✓ InMemory SET {}", key),
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        debug!("✓ InMemory DELETE {}", key);
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        self.store.clear();
        warn!("⚠ InMemory CLEAR_ALL executed - response cache emptied");
        Ok(())
    }
}
