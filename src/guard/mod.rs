//! Request guard - rate limiting and abuse blocking
//!
//! Two independent but composable admission policies:
//! - fixed-window request-rate limiting per identifier, counted through the
//!   cache's atomic increment
//! - temporary blocking of sources that accumulate repeated failures inside
//!   a sliding tracking window
//!
//! The guard is constructed once at startup with its cache handle and
//! passed by reference to whatever needs it; there is no global instance.

mod failures;
mod rate_limit;
pub mod source;

pub use source::extract_source_ip;

use crate::cache::KeyValueCache;
use crate::config::GuardConfig;
use crate::constants::{
    RATE_LIMIT_API, RATE_LIMIT_AUTH, RATE_LIMIT_DASHBOARD, RATE_LIMIT_UPLOAD, RATE_LIMIT_WRITE,
    RATE_PRESET_WINDOW,
};
use dashmap::DashMap;
use failures::SourceRecord;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Why a request was refused admission.
///
/// The two variants carry retry-after context so the calling layer can
/// shape distinct responses: a block is a security outcome, a rate limit
/// an ordinary back-pressure signal.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("source temporarily blocked, retry after {retry_after:?}")]
    TemporarilyBlocked { retry_after: Duration },

    #[error("rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },
}

/// Named request budgets for common endpoint classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RatePreset {
    /// Authentication endpoints - most restrictive
    Auth,
    /// General APIs
    Api,
    /// Dashboard (heavy queries)
    Dashboard,
    /// Write operations
    Write,
    /// Uploads
    Upload,
}

impl RatePreset {
    /// Maximum requests per window for this class
    pub fn max_requests(self) -> u32 {
        match self {
            Self::Auth => RATE_LIMIT_AUTH,
            Self::Api => RATE_LIMIT_API,
            Self::Dashboard => RATE_LIMIT_DASHBOARD,
            Self::Write => RATE_LIMIT_WRITE,
            Self::Upload => RATE_LIMIT_UPLOAD,
        }
    }

    /// Window duration for this class
    pub fn window(self) -> Duration {
        RATE_PRESET_WINDOW
    }

    pub(crate) fn scope(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::Api => "api",
            Self::Dashboard => "dashboard",
            Self::Write => "write",
            Self::Upload => "upload",
        }
    }
}

/// Admission control over a cache-backed counter and per-source failure
/// tracking
pub struct RequestGuard {
    pub(crate) cache: Arc<KeyValueCache>,
    pub(crate) config: GuardConfig,
    pub(crate) trackers: DashMap<String, SourceRecord>,
}

impl RequestGuard {
    /// Create a new guard over the given cache handle
    pub fn new(cache: Arc<KeyValueCache>, config: GuardConfig) -> Self {
        Self {
            cache,
            config,
            trackers: DashMap::new(),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Refuse sources that are currently blocked.
    ///
    /// Returns [`AdmissionError::TemporarilyBlocked`] with the remaining
    /// block duration; rate limits are not consulted here.
    pub fn check_request_limits(&self, source_id: &str) -> Result<(), AdmissionError> {
        if let Some(retry_after) = self.block_remaining(source_id) {
            tracing::warn!(
                "blocked source attempted access: {} (retry after {:?})",
                source_id,
                retry_after
            );
            return Err(AdmissionError::TemporarilyBlocked { retry_after });
        }
        Ok(())
    }

    /// Full admission check: block status first, then the fixed-window
    /// request budget.
    pub async fn admit(
        &self,
        source_id: &str,
        max_requests: u32,
        window: Duration,
    ) -> Result<(), AdmissionError> {
        self.check_request_limits(source_id)?;

        if !self.check_rate_limit(source_id, max_requests, window).await {
            return Err(AdmissionError::RateLimited {
                retry_after: window,
            });
        }
        Ok(())
    }

    /// [`admit`](Self::admit) with a named preset budget, counted
    /// separately per endpoint class.
    pub async fn admit_preset(
        &self,
        source_id: &str,
        preset: RatePreset,
    ) -> Result<(), AdmissionError> {
        self.check_request_limits(source_id)?;

        let identifier = format!("{}:{}", preset.scope(), source_id);
        if !self
            .check_rate_limit(&identifier, preset.max_requests(), preset.window())
            .await
        {
            return Err(AdmissionError::RateLimited {
                retry_after: preset.window(),
            });
        }
        Ok(())
    }
}
