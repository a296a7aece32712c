//! Cache contract tests against a live Redis.
//!
//! Ignored by default; run with a reachable store:
//! `REDIS_URL=redis://127.0.0.1:6379/ cargo test -- --ignored`

use std::sync::Arc;
use std::time::Duration;
use turnstile::{CacheConfig, GuardConfig, KeyValueCache, RequestGuard};

async fn redis_cache() -> KeyValueCache {
    let config = CacheConfig {
        backend_url: std::env::var("REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379/".to_string()),
        // Distinct namespace per run so repeated runs don't collide
        namespace: format!("turnstile_test_{}", std::process::id()),
        ..Default::default()
    };
    let cache = KeyValueCache::connect(config).await;
    assert_eq!(
        cache.backend_kind(),
        "redis",
        "live Redis required for integration tests"
    );
    cache
}

#[tokio::test]
#[ignore]
async fn test_redis_ttl_expiry() -> Result<(), Box<dyn std::error::Error>> {
    let cache = redis_cache().await;

    assert!(cache.set("short", &"lived", Duration::from_millis(300)).await?);
    assert_eq!(cache.get::<String>("short").await.as_deref(), Some("lived"));

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(cache.get::<String>("short").await, None);
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_redis_overwrite_resets_ttl() -> Result<(), Box<dyn std::error::Error>> {
    let cache = redis_cache().await;

    assert!(cache.set("key", &"v1", Duration::from_millis(600)).await?);
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(cache.set("key", &"v2", Duration::from_millis(600)).await?);
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(cache.get::<String>("key").await.as_deref(), Some("v2"));
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_redis_pattern_invalidation() -> Result<(), Box<dyn std::error::Error>> {
    let cache = redis_cache().await;

    cache.set("members:1", &"a", Duration::from_secs(60)).await?;
    cache.set("members:2", &"b", Duration::from_secs(60)).await?;
    cache.set("stats:1", &"c", Duration::from_secs(60)).await?;

    assert_eq!(cache.clear_pattern("members:").await, 2);
    assert_eq!(cache.get::<String>("members:1").await, None);
    assert_eq!(cache.get::<String>("stats:1").await.as_deref(), Some("c"));

    cache.clear_pattern("").await; // Clean the namespace up
    Ok(())
}

#[tokio::test]
#[ignore]
async fn test_redis_concurrent_increments() {
    let cache = Arc::new(redis_cache().await);

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.increment("counter", 1).await })
        })
        .collect();

    for result in futures::future::join_all(tasks).await {
        result.expect("task panicked").expect("increment failed");
    }

    assert_eq!(cache.get::<i64>("counter").await, Some(50));
    cache.delete("counter").await;
}

#[tokio::test]
#[ignore]
async fn test_redis_fixed_window_rate_limit() {
    let cache = Arc::new(redis_cache().await);
    let guard = RequestGuard::new(cache, GuardConfig::default());
    let window = Duration::from_millis(500);

    for _ in 0..3 {
        assert!(guard.check_rate_limit("client1", 3, window).await);
    }
    assert!(!guard.check_rate_limit("client1", 3, window).await);

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert!(guard.check_rate_limit("client1", 3, window).await);
}
