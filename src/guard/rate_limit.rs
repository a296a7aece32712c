//! Fixed-window rate limiting
//!
//! Counts requests per identifier in fixed time windows through the cache's
//! atomic increment. The counter's TTL is the window: it expires, the next
//! request recreates it at 1 and a fresh window begins. Bursts are possible
//! at window boundaries (a full budget just before expiry plus a full
//! budget right after); that is an accepted property of the fixed-window
//! algorithm, not a bug.

use super::RequestGuard;
use crate::constants::RATE_LIMIT_KEY_PREFIX;
use std::time::Duration;

impl RequestGuard {
    /// Count this request against `identifier`'s window and report whether
    /// it fits the budget.
    ///
    /// Fails open: if the counter backing is unavailable the request is
    /// allowed, since availability of the protected resource outranks
    /// strict enforcement during an infrastructure failure.
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        max_requests: u32,
        window: Duration,
    ) -> bool {
        let key = counter_key(identifier);

        match self.cache.increment(&key, 1).await {
            Ok(count) => {
                if count == 1 {
                    // First request of a fresh window: the TTL is the window
                    if !self.cache.expire(&key, window).await {
                        tracing::warn!(
                            "failed to set rate limit window on counter for {}",
                            identifier
                        );
                    }
                }
                count <= i64::from(max_requests)
            }
            Err(e) => {
                tracing::warn!(
                    "rate limit check failed for {}, failing open: {}",
                    identifier,
                    e
                );
                true
            }
        }
    }

    /// How many requests remain in `identifier`'s current window.
    ///
    /// A missing or expired counter counts as zero used.
    pub async fn remaining_requests(&self, identifier: &str, max_requests: u32) -> u32 {
        let used = self
            .cache
            .get::<i64>(&counter_key(identifier))
            .await
            .unwrap_or(0);
        u32::try_from(i64::from(max_requests) - used).unwrap_or(0)
    }
}

fn counter_key(identifier: &str) -> String {
    format!("{}:{}", RATE_LIMIT_KEY_PREFIX, identifier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{KeyValueCache, StoreBackend};
    use crate::config::{CacheConfig, GuardConfig};
    use std::sync::Arc;

    /// A Redis-mode cache pointed at a closed port, probe bypassed, so
    /// every store operation errors.
    fn unavailable_cache() -> Arc<KeyValueCache> {
        let client = ::redis::Client::open("redis://127.0.0.1:1/").expect("valid url");
        Arc::new(KeyValueCache::with_backend(
            CacheConfig::default(),
            StoreBackend::Redis(client),
        ))
    }

    #[tokio::test]
    async fn test_fail_open_when_store_unavailable() {
        let guard = RequestGuard::new(unavailable_cache(), GuardConfig::default());

        // Every call errors against the store; all must be allowed
        for _ in 0..10 {
            assert!(
                guard
                    .check_rate_limit("client1", 2, Duration::from_secs(60))
                    .await
            );
        }
    }

    #[tokio::test]
    async fn test_remaining_requests_when_store_unavailable() {
        let guard = RequestGuard::new(unavailable_cache(), GuardConfig::default());

        // Unreadable counter counts as zero used
        assert_eq!(guard.remaining_requests("client1", 5).await, 5);
    }
}
