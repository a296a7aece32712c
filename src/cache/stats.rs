//! Cache statistics
//!
//! Introspection only; nothing here affects correctness. Hit and miss
//! counters are process-local even in Redis mode.

use super::{KeyValueCache, StoreBackend};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;

/// Snapshot of cache state and traffic counters
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheStats {
    /// Which backend is active: `"redis"` or `"memory"`
    pub backend: String,
    /// Entry count of the in-process store (fallback mode only)
    pub entries: Option<u64>,
    /// Process-local hit count
    pub hits: u64,
    /// Process-local miss count
    pub misses: u64,
    /// Hit ratio (0.0 to 1.0)
    pub hit_ratio: f64,
    /// Clients connected to the Redis server (Redis mode only)
    pub connected_clients: Option<u64>,
    /// Human-readable Redis memory usage (Redis mode only)
    pub used_memory: Option<String>,
    /// Server-side keyspace hits (Redis mode only)
    pub keyspace_hits: Option<u64>,
    /// Server-side keyspace misses (Redis mode only)
    pub keyspace_misses: Option<u64>,
}

impl KeyValueCache {
    /// Collect cache statistics
    pub async fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            backend: self.backend_kind().to_string(),
            hits: self.stats_hits.load(Ordering::Relaxed),
            misses: self.stats_misses.load(Ordering::Relaxed),
            ..Default::default()
        };

        let total = stats.hits + stats.misses;
        if total > 0 {
            stats.hit_ratio = stats.hits as f64 / total as f64;
        }

        match &*self.backend {
            StoreBackend::Redis(client) => match self.redis_info(client).await {
                Ok(info) => {
                    stats.connected_clients = info
                        .get("connected_clients")
                        .and_then(|v| v.parse().ok());
                    stats.used_memory = info.get("used_memory_human").cloned();
                    stats.keyspace_hits =
                        info.get("keyspace_hits").and_then(|v| v.parse().ok());
                    stats.keyspace_misses =
                        info.get("keyspace_misses").and_then(|v| v.parse().ok());
                }
                Err(e) => {
                    tracing::warn!("failed to fetch redis info: {}", e);
                }
            },
            StoreBackend::Memory(store) => {
                stats.entries = Some(store.len().await as u64);
            }
        }

        stats
    }
}
