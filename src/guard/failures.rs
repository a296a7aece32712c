//! Failure tracking and temporary blocking
//!
//! Keeps a sliding log of failed attempts per source identifier. Entries
//! older than the tracking window are pruned before every evaluation; once
//! the pruned log reaches the configured threshold the source is blocked
//! for a fixed duration. The tables are process-local shared state, guarded
//! by the concurrent map.

use super::RequestGuard;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// One failed attempt against a source
#[derive(Debug, Clone)]
pub(crate) struct FailedAttempt {
    at: Instant,
    /// Caller-supplied context, e.g. the endpoint attempted
    context: String,
}

/// Tracking state for a single source identifier
#[derive(Debug, Default)]
pub(crate) struct SourceRecord {
    attempts: VecDeque<FailedAttempt>,
    blocked_until: Option<Instant>,
}

impl RequestGuard {
    /// Record a failed attempt for `source_id`.
    ///
    /// Prunes attempts older than the tracking window, then blocks the
    /// source once the remaining count reaches the configured threshold.
    pub fn record_failed_attempt(&self, source_id: &str, context: &str) {
        let now = Instant::now();
        let window = self.config.attempt_window();

        let mut record = self.trackers.entry(source_id.to_string()).or_default();
        record.attempts.push_back(FailedAttempt {
            at: now,
            context: context.to_string(),
        });

        prune_attempts(&mut record.attempts, window);

        if record.attempts.len() >= self.config.max_failed_attempts as usize {
            record.blocked_until = Some(now + self.config.block_duration());
            let contexts: Vec<&str> = record.attempts.iter().map(|a| a.context.as_str()).collect();
            tracing::warn!(
                "source {} temporarily blocked after {} failed attempts (contexts: {:?})",
                source_id,
                record.attempts.len(),
                contexts
            );
        }
    }

    /// Record a successful attempt: the source's failure history is wiped
    /// entirely, not decremented. An active block is left to lapse on its
    /// own.
    pub fn record_successful_attempt(&self, source_id: &str) {
        let mut drop_record = false;
        if let Some(mut record) = self.trackers.get_mut(source_id) {
            record.attempts.clear();
            drop_record = record.blocked_until.is_none();
        }
        if drop_record {
            self.trackers.remove(source_id);
        }
    }

    /// Whether `source_id` is currently blocked.
    ///
    /// A lapsed block is expired on the spot: the source's entire tracking
    /// record, history included, is removed before `false` is returned. A
    /// caller therefore cannot distinguish "never failed" from "block
    /// lapsed" after this call.
    pub fn is_blocked(&self, source_id: &str) -> bool {
        self.block_remaining(source_id).is_some()
    }

    /// Remaining block duration for `source_id`, expiring lapsed blocks
    pub(crate) fn block_remaining(&self, source_id: &str) -> Option<Duration> {
        let lapsed = {
            let record = self.trackers.get(source_id)?;
            match record.blocked_until {
                Some(until) => {
                    let now = Instant::now();
                    if until > now {
                        return Some(until - now);
                    }
                    true
                }
                None => false,
            }
        };

        if lapsed {
            self.expire_lapsed_block(source_id);
        }
        None
    }

    /// Drop a source's tracking record after its block has lapsed.
    ///
    /// The wipe is deliberate: a source that served out a block starts over
    /// with a clean history, so its next failure counts as the first of a
    /// new sequence.
    fn expire_lapsed_block(&self, source_id: &str) {
        self.trackers.remove(source_id);
        tracing::debug!("block lapsed for source {}, tracking record cleared", source_id);
    }

    /// Number of failed attempts currently on record for `source_id`
    pub fn failed_attempt_count(&self, source_id: &str) -> usize {
        self.trackers
            .get(source_id)
            .map_or(0, |record| record.attempts.len())
    }
}

fn prune_attempts(attempts: &mut VecDeque<FailedAttempt>, window: Duration) {
    while attempts
        .front()
        .is_some_and(|attempt| attempt.at.elapsed() > window)
    {
        attempts.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::KeyValueCache;
    use crate::config::{CacheConfig, GuardConfig};
    use std::sync::Arc;

    async fn guard(config: GuardConfig) -> RequestGuard {
        let cache = Arc::new(KeyValueCache::connect(CacheConfig::default()).await);
        RequestGuard::new(cache, config)
    }

    #[tokio::test]
    async fn test_below_threshold_not_blocked() {
        let guard = guard(GuardConfig::default()).await;

        for _ in 0..4 {
            guard.record_failed_attempt("10.0.0.1", "/login");
        }
        assert!(!guard.is_blocked("10.0.0.1"));
        assert_eq!(guard.failed_attempt_count("10.0.0.1"), 4);
    }

    #[tokio::test]
    async fn test_threshold_blocks() {
        let guard = guard(GuardConfig::default()).await;

        for _ in 0..5 {
            guard.record_failed_attempt("10.0.0.1", "/login");
        }
        assert!(guard.is_blocked("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_sources_are_independent() {
        let guard = guard(GuardConfig::default()).await;

        for _ in 0..5 {
            guard.record_failed_attempt("10.0.0.1", "/login");
        }
        assert!(guard.is_blocked("10.0.0.1"));
        assert!(!guard.is_blocked("10.0.0.2"));
    }

    #[tokio::test]
    async fn test_success_wipes_history() {
        let guard = guard(GuardConfig::default()).await;

        for _ in 0..4 {
            guard.record_failed_attempt("10.0.0.1", "/login");
        }
        guard.record_successful_attempt("10.0.0.1");
        assert_eq!(guard.failed_attempt_count("10.0.0.1"), 0);

        // The next failure is the first of a new sequence
        guard.record_failed_attempt("10.0.0.1", "/login");
        assert!(!guard.is_blocked("10.0.0.1"));
        assert_eq!(guard.failed_attempt_count("10.0.0.1"), 1);
    }

    #[tokio::test]
    async fn test_lapsed_block_wipes_record() {
        let config = GuardConfig {
            max_failed_attempts: 2,
            block_duration_secs: 1,
            ..Default::default()
        };
        let guard = guard(config).await;

        guard.record_failed_attempt("10.0.0.1", "/login");
        guard.record_failed_attempt("10.0.0.1", "/login");
        assert!(guard.is_blocked("10.0.0.1"));

        tokio::time::sleep(Duration::from_millis(1300)).await;

        // The lapse check is destructive: record gone, history gone
        assert!(!guard.is_blocked("10.0.0.1"));
        assert_eq!(guard.failed_attempt_count("10.0.0.1"), 0);
    }
}
