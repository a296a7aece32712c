//! Library-wide constants and defaults

use std::time::Duration;

/// Namespace prefix applied to every key before it reaches the backing store
pub const CACHE_NAMESPACE: &str = "turnstile";

/// Default TTL for cache entries when the caller does not specify one
pub const CACHE_DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Timeout for the one-shot connection probe at startup
pub const CACHE_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Key prefix for fixed-window rate limit counters
pub const RATE_LIMIT_KEY_PREFIX: &str = "rate_limit";

/// Key prefix for memoized function results
pub const MEMOIZED_KEY_PREFIX: &str = "fn";

/// Failed attempts within the tracking window before a source is blocked
pub const GUARD_MAX_FAILED_ATTEMPTS: u32 = 5;

/// How long a blocked source stays blocked
pub const GUARD_BLOCK_DURATION: Duration = Duration::from_secs(900);

/// Sliding window over which failed attempts are counted
pub const GUARD_ATTEMPT_WINDOW: Duration = Duration::from_secs(86_400);

/// Requests per minute for authentication endpoints
pub const RATE_LIMIT_AUTH: u32 = 10;

/// Requests per minute for general API endpoints
pub const RATE_LIMIT_API: u32 = 100;

/// Requests per minute for dashboard queries
pub const RATE_LIMIT_DASHBOARD: u32 = 30;

/// Requests per minute for write operations
pub const RATE_LIMIT_WRITE: u32 = 50;

/// Requests per minute for uploads
pub const RATE_LIMIT_UPLOAD: u32 = 20;

/// Window shared by the per-endpoint rate presets
pub const RATE_PRESET_WINDOW: Duration = Duration::from_secs(60);
