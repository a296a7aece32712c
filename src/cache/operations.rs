//! Cache operations
//!
//! The public cache surface: get, set, delete, exists, increment, expire
//! and pattern invalidation. Every operation is defensive — store and
//! serialization failures are logged and converted into neutral results
//! rather than propagated. The single exception is `increment`, which
//! surfaces store errors so admission layers can observe failure and fail
//! open.

use super::payload;
use super::{KeyValueCache, StoreBackend};
use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::atomic::Ordering;
use std::time::Duration;

impl KeyValueCache {
    /// Get a value from cache.
    ///
    /// Returns `None` for missing, expired and undecodable entries alike,
    /// and for any store failure.
    pub async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let full_key = self.namespaced(key);

        let raw = match &*self.backend {
            StoreBackend::Redis(client) => match self.get_from_redis(client, &full_key).await {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::error!("cache get failed for {}: {}", key, e);
                    self.stats_misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            },
            StoreBackend::Memory(store) => store.get(&full_key).await,
        };

        match raw {
            Some(raw) => match payload::decode(raw) {
                Ok(value) => {
                    self.stats_hits.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!("cache hit: {}", key);
                    Some(value)
                }
                Err(e) => {
                    tracing::warn!("failed to decode cached value at {}: {}", key, e);
                    self.stats_misses.fetch_add(1, Ordering::Relaxed);
                    None
                }
            },
            None => {
                self.stats_misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("cache miss: {}", key);
                None
            }
        }
    }

    /// Set a value with the given TTL.
    ///
    /// Returns `Ok(false)` and logs when the value could not be stored;
    /// `Err` is reserved for caller bugs (a zero TTL).
    pub async fn set<T>(&self, key: &str, value: &T, ttl: Duration) -> Result<bool>
    where
        T: Serialize,
    {
        if ttl.is_zero() {
            return Err(Error::invalid_argument("ttl must be greater than zero"));
        }

        let full_key = self.namespaced(key);
        let payload = match payload::encode(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("cache set failed to serialize {}: {}", key, e);
                return Ok(false);
            }
        };

        match &*self.backend {
            StoreBackend::Redis(client) => {
                match self.set_in_redis(client, &full_key, &payload, ttl).await {
                    Ok(()) => {
                        tracing::debug!("cache set: {} (ttl {:?})", key, ttl);
                        Ok(true)
                    }
                    Err(e) => {
                        tracing::error!("cache set failed for {}: {}", key, e);
                        Ok(false)
                    }
                }
            }
            StoreBackend::Memory(store) => {
                let raw = match serde_json::to_value(&payload) {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::error!("cache set failed to serialize {}: {}", key, e);
                        return Ok(false);
                    }
                };
                store.set(full_key, raw, ttl).await;
                tracing::debug!("cache set: {} (ttl {:?})", key, ttl);
                Ok(true)
            }
        }
    }

    /// Set a value using the configured default TTL
    pub async fn set_with_default<T>(&self, key: &str, value: &T) -> Result<bool>
    where
        T: Serialize,
    {
        self.set(key, value, self.config.default_ttl()).await
    }

    /// Delete a key, reporting whether a live entry was present
    pub async fn delete(&self, key: &str) -> bool {
        let full_key = self.namespaced(key);

        match &*self.backend {
            StoreBackend::Redis(client) => {
                match self.delete_from_redis(client, &full_key).await {
                    Ok(removed) => {
                        tracing::debug!("cache delete: {} (removed {})", key, removed);
                        removed
                    }
                    Err(e) => {
                        tracing::error!("cache delete failed for {}: {}", key, e);
                        false
                    }
                }
            }
            StoreBackend::Memory(store) => store.delete(&full_key).await,
        }
    }

    /// Check whether a live entry exists for `key`
    pub async fn exists(&self, key: &str) -> bool {
        let full_key = self.namespaced(key);

        match &*self.backend {
            StoreBackend::Redis(client) => {
                match self.exists_in_redis(client, &full_key).await {
                    Ok(found) => found,
                    Err(e) => {
                        tracing::error!("cache exists failed for {}: {}", key, e);
                        false
                    }
                }
            }
            StoreBackend::Memory(store) => store.exists(&full_key).await,
        }
    }

    /// Atomically add `amount` to the integer counter at `key`.
    ///
    /// A missing or expired counter starts from zero; a freshly created one
    /// carries no TTL until [`expire`](Self::expire) sets one. Unlike the
    /// other operations, store failures surface as `Err` so callers that
    /// enforce limits can choose to fail open.
    pub async fn increment(&self, key: &str, amount: i64) -> Result<i64> {
        let full_key = self.namespaced(key);

        match &*self.backend {
            StoreBackend::Redis(client) => {
                self.increment_in_redis(client, &full_key, amount).await
            }
            StoreBackend::Memory(store) => store.increment(&full_key, amount).await,
        }
    }

    /// Set or refresh the TTL on an existing key
    pub async fn expire(&self, key: &str, ttl: Duration) -> bool {
        let full_key = self.namespaced(key);

        match &*self.backend {
            StoreBackend::Redis(client) => {
                match self.expire_in_redis(client, &full_key, ttl).await {
                    Ok(updated) => updated,
                    Err(e) => {
                        tracing::error!("cache expire failed for {}: {}", key, e);
                        false
                    }
                }
            }
            StoreBackend::Memory(store) => store.expire(&full_key, ttl).await,
        }
    }

    /// Remove every entry in this cache's namespace whose key matches the
    /// pattern, returning the count removed.
    ///
    /// The Redis backend uses its native glob syntax wrapped as
    /// `namespace:*pattern*`; the fallback store uses substring containment
    /// with `*` splitting the pattern into ordered segments.
    pub async fn clear_pattern(&self, pattern: &str) -> u64 {
        match &*self.backend {
            StoreBackend::Redis(client) => {
                let glob = format!("{}:*{}*", self.config.namespace, pattern);
                match self.clear_pattern_redis(client, &glob).await {
                    Ok(removed) => {
                        tracing::info!(
                            "cache pattern cleared: {} ({} keys removed)",
                            pattern,
                            removed
                        );
                        removed
                    }
                    Err(e) => {
                        tracing::error!("cache pattern clear failed for {}: {}", pattern, e);
                        0
                    }
                }
            }
            StoreBackend::Memory(store) => {
                let removed = store.clear_matching(pattern).await;
                tracing::info!(
                    "cache pattern cleared: {} ({} keys removed)",
                    pattern,
                    removed
                );
                removed
            }
        }
    }
}
