//! error.rs
//! Construction-time configuration errors and verbose admission denials.

use crate::types::Millis;
use thiserror::Error;

/// Rejected limiter configuration.
///
/// Every field of a [`TokenBucketConfig`](crate::TokenBucketConfig) must be
/// strictly positive; a limiter is never built from a config that fails here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("capacity must be greater than 0")]
    ZeroCapacity,
    #[error("refill_interval must be greater than 0")]
    ZeroRefillInterval,
    /// The interval is positive but rounds down to zero whole milliseconds.
    #[error("refill_interval must be at least 1ms, got {nanos}ns")]
    SubMillisecondInterval { nanos: u32 },
    #[error("tokens_per_interval must be greater than 0")]
    ZeroTokensPerInterval,
}

/// Denial returned by [`KeyedRateLimiter::check`](crate::KeyedRateLimiter::check).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum RateLimitError {
    /// The caller's bucket is empty.
    #[error("no tokens available, retry after {retry_after_millis}ms")]
    InsufficientTokens { retry_after_millis: Millis },
}

/// Result type for verbose admission checks.
pub type AdmissionResult = Result<(), RateLimitError>;
