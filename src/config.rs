//! Configuration types
//!
//! Serde-backed config structs with environment loading. The backend URL is
//! read once at startup; an empty URL selects the in-process fallback store
//! without attempting a connection.

use crate::constants::{
    CACHE_CONNECT_TIMEOUT, CACHE_DEFAULT_TTL, CACHE_NAMESPACE, GUARD_ATTEMPT_WINDOW,
    GUARD_BLOCK_DURATION, GUARD_MAX_FAILED_ATTEMPTS,
};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CacheConfig {
    /// Backing store connection URL; empty means in-process fallback only
    #[serde(default)]
    pub backend_url: String,
    /// Namespace prefix applied to every key
    #[serde(default = "default_namespace")]
    #[validate(length(min = 1))]
    pub namespace: String,
    /// Default TTL in seconds for convenience setters
    #[serde(default = "default_ttl_secs")]
    #[validate(range(min = 1))]
    pub default_ttl_secs: u64,
    /// Timeout in seconds for the startup connection probe
    #[serde(default = "default_connect_timeout_secs")]
    #[validate(range(min = 1))]
    pub connect_timeout_secs: u64,
}

fn default_namespace() -> String {
    CACHE_NAMESPACE.to_string()
}

fn default_ttl_secs() -> u64 {
    CACHE_DEFAULT_TTL.as_secs()
}

fn default_connect_timeout_secs() -> u64 {
    CACHE_CONNECT_TIMEOUT.as_secs()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            namespace: default_namespace(),
            default_ttl_secs: default_ttl_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl CacheConfig {
    /// Load configuration from `TURNSTILE_*` environment variables.
    ///
    /// Falls back to the conventional `REDIS_URL` variable when no backend
    /// URL is set through the prefixed form.
    pub fn from_env() -> Result<Self> {
        let mut cfg: Self = config::Config::builder()
            .add_source(config::Environment::with_prefix("TURNSTILE"))
            .build()?
            .try_deserialize()?;

        if cfg.backend_url.is_empty()
            && let Ok(url) = std::env::var("REDIS_URL")
        {
            cfg.backend_url = url;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Default TTL as a `Duration`
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Probe timeout as a `Duration`
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Request guard configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GuardConfig {
    /// Failed attempts within the window before a source is blocked
    #[serde(default = "default_max_failed_attempts")]
    #[validate(range(min = 1))]
    pub max_failed_attempts: u32,
    /// How long a blocked source stays blocked, in seconds
    #[serde(default = "default_block_duration_secs")]
    #[validate(range(min = 1))]
    pub block_duration_secs: u64,
    /// Sliding window over which failed attempts count, in seconds
    #[serde(default = "default_attempt_window_secs")]
    #[validate(range(min = 1))]
    pub attempt_window_secs: u64,
}

fn default_max_failed_attempts() -> u32 {
    GUARD_MAX_FAILED_ATTEMPTS
}

fn default_block_duration_secs() -> u64 {
    GUARD_BLOCK_DURATION.as_secs()
}

fn default_attempt_window_secs() -> u64 {
    GUARD_ATTEMPT_WINDOW.as_secs()
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: default_max_failed_attempts(),
            block_duration_secs: default_block_duration_secs(),
            attempt_window_secs: default_attempt_window_secs(),
        }
    }
}

impl GuardConfig {
    /// Load configuration from `TURNSTILE_GUARD_*` environment variables
    pub fn from_env() -> Result<Self> {
        let cfg: Self = config::Config::builder()
            .add_source(config::Environment::with_prefix("TURNSTILE_GUARD"))
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Block duration as a `Duration`
    pub fn block_duration(&self) -> Duration {
        Duration::from_secs(self.block_duration_secs)
    }

    /// Attempt window as a `Duration`
    pub fn attempt_window(&self) -> Duration {
        Duration::from_secs(self.attempt_window_secs)
    }
}
