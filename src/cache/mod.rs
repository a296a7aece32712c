//! TTL key-value cache with Redis backend and in-process fallback
//!
//! The cache operates in one of two mutually exclusive modes, decided once
//! at construction:
//! 1. **Redis mode**: the configured backend URL answered a PING probe.
//! 2. **Fallback mode**: no URL configured, or the probe failed. Entries
//!    live in a process-local map with the same get/set/delete/TTL contract.
//!
//! The mode is sticky for the process lifetime; there is no re-probe or
//! promotion path if the external store becomes reachable later. Every
//! operation is best-effort: store failures are logged and converted into
//! neutral results, so callers may rely on cached values for performance
//! but never for correctness.

mod memoize;
mod memory;
mod operations;
mod payload;
mod redis;
mod stats;

pub use memoize::{cached, cached_sync, result_key};
pub use stats::CacheStats;

use crate::config::CacheConfig;
use memory::MemoryStore;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

/// Storage backend chosen at construction time
pub(crate) enum StoreBackend {
    /// External Redis store, shared across processes
    Redis(::redis::Client),
    /// Process-local fallback map
    Memory(MemoryStore),
}

/// Namespaced TTL cache over the selected backend
#[derive(Clone)]
pub struct KeyValueCache {
    config: CacheConfig,
    backend: Arc<StoreBackend>,
    stats_hits: Arc<AtomicU64>,
    stats_misses: Arc<AtomicU64>,
}

impl KeyValueCache {
    /// Connect to the configured backend.
    ///
    /// Probes the backend URL once with a PING; on failure the cache logs a
    /// warning and degrades to the in-process store for the remainder of the
    /// process lifetime. Construction itself never fails.
    pub async fn connect(config: CacheConfig) -> Self {
        let backend = if config.backend_url.is_empty() {
            tracing::info!("no cache backend configured, using in-process store");
            StoreBackend::Memory(MemoryStore::default())
        } else {
            match ::redis::Client::open(config.backend_url.as_str()) {
                Ok(client) => {
                    match Self::probe_redis(&client, config.connect_timeout()).await {
                        Ok(()) => {
                            tracing::info!("redis cache connection established");
                            StoreBackend::Redis(client)
                        }
                        Err(e) => {
                            tracing::warn!(
                                "redis not available, using in-process fallback: {}",
                                e
                            );
                            StoreBackend::Memory(MemoryStore::default())
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "redis client creation failed, using in-process fallback: {}",
                        e
                    );
                    StoreBackend::Memory(MemoryStore::default())
                }
            }
        };

        Self::with_backend(config, backend)
    }

    pub(crate) fn with_backend(config: CacheConfig, backend: StoreBackend) -> Self {
        Self {
            config,
            backend: Arc::new(backend),
            stats_hits: Arc::new(AtomicU64::new(0)),
            stats_misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Which backend this cache ended up on: `"redis"` or `"memory"`
    pub fn backend_kind(&self) -> &'static str {
        match &*self.backend {
            StoreBackend::Redis(_) => "redis",
            StoreBackend::Memory(_) => "memory",
        }
    }

    /// Get configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Prefix a caller key with the configured namespace
    pub(crate) fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.config.namespace, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_url_selects_fallback() {
        let cache = KeyValueCache::connect(CacheConfig::default()).await;
        assert_eq!(cache.backend_kind(), "memory");
    }

    #[tokio::test]
    async fn test_unreachable_backend_selects_fallback() {
        let config = CacheConfig {
            backend_url: "redis://127.0.0.1:1/".to_string(),
            ..Default::default()
        };
        let cache = KeyValueCache::connect(config).await;
        assert_eq!(cache.backend_kind(), "memory");
    }

    #[tokio::test]
    async fn test_fallback_still_serves_operations() {
        let config = CacheConfig {
            backend_url: "redis://127.0.0.1:1/".to_string(),
            ..Default::default()
        };
        let cache = KeyValueCache::connect(config).await;

        let stored = cache
            .set("key1", &"value1", std::time::Duration::from_secs(60))
            .await
            .expect("valid ttl");
        assert!(stored);
        assert_eq!(cache.get::<String>("key1").await.as_deref(), Some("value1"));
    }

    #[tokio::test]
    async fn test_namespacing() {
        let config = CacheConfig {
            namespace: "app".to_string(),
            ..Default::default()
        };
        let cache = KeyValueCache::connect(config).await;
        assert_eq!(cache.namespaced("members:1"), "app:members:1");
    }
}
