//! Result-caching combinators
//!
//! Wraps a computation so its result is cached under a key derived from the
//! computation's name and a hash of its arguments. The wrapped computation
//! may be suspending ([`cached`]) or immediate ([`cached_sync`]); the
//! wrapper itself is async either way, since the cache round-trip is a
//! suspension point.

use super::KeyValueCache;
use crate::constants::MEMOIZED_KEY_PREFIX;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::time::Duration;

/// Build the cache key for a named computation and its arguments
pub fn result_key<A>(name: &str, args: &A) -> String
where
    A: Serialize + ?Sized,
{
    let encoded = serde_json::to_string(args).unwrap_or_default();
    let digest = Sha256::digest(encoded.as_bytes());
    format!(
        "{}:{}:{}",
        MEMOIZED_KEY_PREFIX,
        name,
        &hex::encode(digest)[..8]
    )
}

/// Run `compute` unless a cached result exists for `(name, args)`.
///
/// On a miss the result is stored with `ttl`, best-effort: a store failure
/// is logged and the freshly computed value returned regardless.
pub async fn cached<A, T, F, Fut>(
    cache: &KeyValueCache,
    name: &str,
    args: &A,
    ttl: Duration,
    compute: F,
) -> T
where
    A: Serialize + ?Sized,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = T>,
{
    let key = result_key(name, args);

    if let Some(hit) = cache.get::<T>(&key).await {
        tracing::debug!("memoized result served from cache: {}", name);
        return hit;
    }

    let value = compute().await;
    match cache.set(&key, &value, ttl).await {
        Ok(true) => tracing::debug!("computed result cached: {} (ttl {:?})", name, ttl),
        Ok(false) => {}
        Err(e) => tracing::warn!("failed to cache computed result for {}: {}", name, e),
    }
    value
}

/// [`cached`] for computations that return immediately
pub async fn cached_sync<A, T, F>(
    cache: &KeyValueCache,
    name: &str,
    args: &A,
    ttl: Duration,
    compute: F,
) -> T
where
    A: Serialize + ?Sized,
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> T,
{
    cached(cache, name, args, ttl, move || async move { compute() }).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_key_is_deterministic() {
        let a = result_key("monthly_report", &("gym-1", 2026));
        let b = result_key("monthly_report", &("gym-1", 2026));
        assert_eq!(a, b);
        assert!(a.starts_with("fn:monthly_report:"));
    }

    #[test]
    fn test_result_key_varies_with_args() {
        let a = result_key("monthly_report", &("gym-1", 2026));
        let b = result_key("monthly_report", &("gym-2", 2026));
        assert_ne!(a, b);
    }

    #[test]
    fn test_result_key_varies_with_name() {
        let a = result_key("monthly_report", &1);
        let b = result_key("weekly_report", &1);
        assert_ne!(a, b);
    }
}
