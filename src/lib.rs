//! Turnstile - caching and admission control
//!
//! A TTL key-value cache backed by Redis with a transparent in-process
//! fallback, plus a request guard combining fixed-window rate limiting
//! with failure tracking and temporary source blocking.

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod guard;

pub use cache::{CacheStats, KeyValueCache};
pub use config::{CacheConfig, GuardConfig};
pub use error::{Error, Result};
pub use guard::{AdmissionError, RatePreset, RequestGuard};
