//! Redis cache operations
//!
//! Redis-specific operations including the startup connection probe,
//! get/set/delete, atomic counters and pattern-based bulk removal.

use super::KeyValueCache;
use super::payload::Payload;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::time::Duration;

impl KeyValueCache {
    /// Probe the Redis connection with a bounded PING
    pub(crate) async fn probe_redis(client: &::redis::Client, timeout: Duration) -> Result<()> {
        let mut conn =
            match tokio::time::timeout(timeout, client.get_multiplexed_async_connection()).await {
                Ok(Ok(conn)) => conn,
                Ok(Err(e)) => {
                    return Err(Error::cache(format!("redis connection failed: {}", e)));
                }
                Err(_) => return Err(Error::cache("redis connection timed out")),
            };

        match tokio::time::timeout(timeout, ::redis::cmd("PING").query_async::<()>(&mut conn))
            .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(Error::cache(format!("redis PING failed: {}", e))),
            Err(_) => Err(Error::cache("redis PING timed out")),
        }
    }

    /// Get a value from Redis
    pub(crate) async fn get_from_redis(
        &self,
        client: &::redis::Client,
        key: &str,
    ) -> Result<Option<serde_json::Value>> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let data: Option<String> = ::redis::cmd("GET").arg(key).query_async(&mut conn).await?;

        match data {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Set a value in Redis with a millisecond TTL
    pub(crate) async fn set_in_redis(
        &self,
        client: &::redis::Client,
        key: &str,
        payload: &Payload,
        ttl: Duration,
    ) -> Result<()> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let raw = serde_json::to_string(payload)?;
        ::redis::cmd("SET")
            .arg(key)
            .arg(raw)
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    /// Delete a key, reporting whether it was present
    pub(crate) async fn delete_from_redis(
        &self,
        client: &::redis::Client,
        key: &str,
    ) -> Result<bool> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let removed: i64 = ::redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(removed > 0)
    }

    pub(crate) async fn exists_in_redis(
        &self,
        client: &::redis::Client,
        key: &str,
    ) -> Result<bool> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let found: i64 = ::redis::cmd("EXISTS")
            .arg(key)
            .query_async(&mut conn)
            .await?;
        Ok(found > 0)
    }

    /// Atomically add `amount` to the integer at `key`
    pub(crate) async fn increment_in_redis(
        &self,
        client: &::redis::Client,
        key: &str,
        amount: i64,
    ) -> Result<i64> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let value: i64 = ::redis::cmd("INCRBY")
            .arg(key)
            .arg(amount)
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    /// Set a millisecond TTL on an existing key
    pub(crate) async fn expire_in_redis(
        &self,
        client: &::redis::Client,
        key: &str,
        ttl: Duration,
    ) -> Result<bool> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let updated: i64 = ::redis::cmd("PEXPIRE")
            .arg(key)
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await?;
        Ok(updated > 0)
    }

    /// Remove all keys matching a glob pattern with one batched DEL
    pub(crate) async fn clear_pattern_redis(
        &self,
        client: &::redis::Client,
        pattern: &str,
    ) -> Result<u64> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let keys: Vec<String> = ::redis::cmd("KEYS")
            .arg(pattern)
            .query_async(&mut conn)
            .await?;
        if keys.is_empty() {
            return Ok(0);
        }
        let removed: i64 = ::redis::cmd("DEL").arg(&keys).query_async(&mut conn).await?;
        Ok(removed as u64)
    }

    /// Fetch a parsed subset of `INFO` for stats reporting
    pub(crate) async fn redis_info(
        &self,
        client: &::redis::Client,
    ) -> Result<HashMap<String, String>> {
        let mut conn = client.get_multiplexed_async_connection().await?;
        let raw: String = ::redis::cmd("INFO").query_async(&mut conn).await?;

        let mut fields = HashMap::new();
        for line in raw.lines() {
            if line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                fields.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Ok(fields)
    }
}
