//! In-process fallback store
//!
//! A process-local map from namespaced key to `(value, expires_at)`. Used
//! only when the external store is unreachable at startup. Expired entries
//! are inert: they are dropped lazily when a read discovers them. All
//! read-modify-write sequences run under the write lock so concurrent
//! callers racing on one key observe the same atomicity the external store
//! provides natively.

use crate::error::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// A single fallback-store entry
struct MemoryEntry {
    value: Value,
    /// Absolute expiry; `None` for keys created without a TTL (counters)
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Process-local key-value store with lazy TTL expiry
#[derive(Clone, Default)]
pub(crate) struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, MemoryEntry>>>,
}

impl MemoryStore {
    /// Get a live value, lazily dropping the entry if it has expired
    pub(crate) async fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    pub(crate) async fn set(&self, key: String, value: Value, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            MemoryEntry {
                value,
                expires_at: Some(Instant::now() + ttl),
            },
        );
    }

    /// Remove a key, reporting whether a live entry was present
    pub(crate) async fn delete(&self, key: &str) -> bool {
        let mut entries = self.entries.write().await;
        match entries.remove(key) {
            Some(entry) => !entry.is_expired(),
            None => false,
        }
    }

    pub(crate) async fn exists(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    /// Atomically add `amount` to the integer at `key`, creating it at zero.
    ///
    /// Like the external store's increment, a freshly created counter has no
    /// TTL until one is set explicitly.
    pub(crate) async fn increment(&self, key: &str, amount: i64) -> Result<i64> {
        let mut entries = self.entries.write().await;

        let (current, expires_at) = match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                (0, None)
            }
            Some(entry) => {
                let current = entry.value.as_i64().ok_or_else(|| {
                    Error::cache(format!("value at {} is not an integer", key))
                })?;
                (current, entry.expires_at)
            }
            None => (0, None),
        };

        let next = current + amount;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: Value::from(next),
                expires_at,
            },
        );
        Ok(next)
    }

    /// Set or refresh the TTL on an existing live key
    pub(crate) async fn expire(&self, key: &str, ttl: Duration) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                false
            }
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                true
            }
            None => false,
        }
    }

    /// Remove every key matching the pattern, returning the count removed
    pub(crate) async fn clear_matching(&self, pattern: &str) -> u64 {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key_matches(key, pattern));
        (before - entries.len()) as u64
    }

    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

/// Substring-containment matching. A `*` splits the pattern into segments
/// that must appear in the key in order; there is no full glob semantics.
fn key_matches(key: &str, pattern: &str) -> bool {
    let mut rest = key;
    for segment in pattern.split('*').filter(|s| !s.is_empty()) {
        match rest.find(segment) {
            Some(idx) => rest = &rest[idx + segment.len()..],
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_matches_substring() {
        assert!(key_matches("app:members:1", "members"));
        assert!(key_matches("app:members:1", "members:*"));
        assert!(key_matches("app:members:1", "*members*"));
        assert!(!key_matches("app:stats:1", "members:*"));
    }

    #[test]
    fn test_key_matches_ordered_segments() {
        assert!(key_matches("app:members:list:7", "members*list"));
        assert!(!key_matches("app:list:members:7", "members*list"));
    }

    #[tokio::test]
    async fn test_increment_rejects_non_integer() {
        let store = MemoryStore::default();
        store
            .set(
                "k".to_string(),
                Value::from("text"),
                Duration::from_secs(60),
            )
            .await;
        assert!(store.increment("k", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_expire_on_missing_key() {
        let store = MemoryStore::default();
        assert!(!store.expire("absent", Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_expired_entry_dropped_on_read() {
        let store = MemoryStore::default();
        store
            .set("k".to_string(), Value::from(1), Duration::from_millis(20))
            .await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(store.get("k").await.is_none());
        assert_eq!(store.len().await, 0); // Dropped, not just hidden
    }
}
