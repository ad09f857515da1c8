//! Limiter configuration.
//!
//! [`TokenBucketConfig`] is the user-facing shape: plain fields that can be
//! built in code or deserialized from a surrounding service's config file.
//! It is turned into a [`BucketPolicy`] exactly once, at limiter construction,
//! and every invalid combination is rejected there.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bucket::BucketPolicy;
use crate::error::ConfigError;
use crate::types::{Millis, Tokens};

/// Configuration for a [`KeyedRateLimiter`](crate::KeyedRateLimiter).
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use rate_guard_keyed::TokenBucketConfig;
///
/// let config = TokenBucketConfig {
///     capacity: 4,
///     refill_interval: Duration::from_secs(1),
///     tokens_per_interval: 1,
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBucketConfig {
    /// Maximum number of tokens a bucket can hold (the burst size).
    pub capacity: Tokens,
    /// Length of one refill period. Only whole milliseconds count.
    pub refill_interval: Duration,
    /// Tokens granted per whole elapsed period. Also the balance a new bucket starts with.
    pub tokens_per_interval: Tokens,
}

impl TokenBucketConfig {
    pub fn new(capacity: Tokens, refill_interval: Duration, tokens_per_interval: Tokens) -> Self {
        Self {
            capacity,
            refill_interval,
            tokens_per_interval,
        }
    }

    /// Checks every field and produces the policy the buckets run on.
    pub fn validate(&self) -> Result<BucketPolicy, ConfigError> {
        if self.refill_interval.is_zero() {
            return Err(ConfigError::ZeroRefillInterval);
        }
        let interval_millis = self.refill_interval.as_millis();
        if interval_millis == 0 {
            return Err(ConfigError::SubMillisecondInterval {
                nanos: self.refill_interval.subsec_nanos(),
            });
        }
        let interval_millis = interval_millis.min(Millis::MAX as u128) as Millis;
        BucketPolicy::new(self.capacity, interval_millis, self.tokens_per_interval)
    }
}

impl TryFrom<TokenBucketConfig> for BucketPolicy {
    type Error = ConfigError;

    #[inline]
    fn try_from(config: TokenBucketConfig) -> Result<Self, Self::Error> {
        config.validate()
    }
}
