use crate::error::ConfigError;
use crate::types::{Millis, Tokens};

/// Validated refill policy shared by every bucket of one limiter.
///
/// All three values are strictly positive; the only way to obtain a policy is
/// through [`BucketPolicy::new`] or [`TokenBucketConfig::validate`](crate::TokenBucketConfig::validate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketPolicy {
    /// Maximum number of tokens a bucket can hold
    capacity: Tokens,
    /// Length of one refill period in milliseconds
    refill_interval_millis: Millis,
    /// Tokens credited per whole elapsed period
    tokens_per_interval: Tokens,
}

impl BucketPolicy {
    /// Creates a policy, rejecting any zero parameter.
    ///
    /// # Example
    ///
    /// ```rust
    /// use rate_guard_keyed::{BucketPolicy, ConfigError};
    ///
    /// assert!(BucketPolicy::new(4, 1_000, 1).is_ok());
    /// assert_eq!(BucketPolicy::new(0, 1_000, 1), Err(ConfigError::ZeroCapacity));
    /// ```
    pub fn new(
        capacity: Tokens,
        refill_interval_millis: Millis,
        tokens_per_interval: Tokens,
    ) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if refill_interval_millis == 0 {
            return Err(ConfigError::ZeroRefillInterval);
        }
        if tokens_per_interval == 0 {
            return Err(ConfigError::ZeroTokensPerInterval);
        }
        Ok(Self {
            capacity,
            refill_interval_millis,
            tokens_per_interval,
        })
    }

    #[inline]
    pub fn capacity(&self) -> Tokens {
        self.capacity
    }

    #[inline]
    pub fn refill_interval_millis(&self) -> Millis {
        self.refill_interval_millis
    }

    #[inline]
    pub fn tokens_per_interval(&self) -> Tokens {
        self.tokens_per_interval
    }

    /// Balance a bucket starts with: one period's grant, never above capacity.
    #[inline]
    pub fn initial_tokens(&self) -> Tokens {
        self.tokens_per_interval.min(self.capacity)
    }
}

/// What a call to [`Bucket::refill`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefillOutcome {
    /// Less than one whole period has elapsed; nothing changed.
    Idle,
    /// `periods` whole periods were accounted for and `added` tokens credited.
    /// `added` may be smaller than `periods * tokens_per_interval` when the
    /// bucket hit its capacity.
    Refilled { periods: u64, added: Tokens },
    /// The clock reported a time before the last refill marker. Treated as zero
    /// elapsed periods; nothing changed.
    ClockRegressed { now: Millis, last_refill: Millis },
}

/// Per-caller token bucket state.
///
/// A bucket holds only its balance and the refill marker. The policy and the
/// current time are passed into each operation, so the same policy value can
/// drive any number of buckets and time stays under the caller's control.
///
/// # Invariants
///
/// - `0 <= tokens <= policy.capacity()` after every mutation.
/// - `last_refill` only moves forward, and only by whole multiples of the
///   refill interval. The sub-period remainder of elapsed time stays credited
///   toward the next refill.
///
/// # Example
///
/// ```rust
/// use rate_guard_keyed::{Bucket, BucketPolicy};
///
/// let policy = BucketPolicy::new(4, 1_000, 1).unwrap();
/// let mut bucket = Bucket::new(&policy, 0);
///
/// assert!(bucket.try_consume());
/// assert!(!bucket.try_consume());
///
/// bucket.refill(&policy, 4_001);
/// assert_eq!(bucket.tokens(), 4);
/// assert_eq!(bucket.last_refill_millis(), 4_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// Current balance
    tokens: Tokens,
    /// Point up to which elapsed time has been converted into tokens
    last_refill: Millis,
}

impl Bucket {
    /// Creates a bucket seeded with [`BucketPolicy::initial_tokens`] and its
    /// refill marker at `now`.
    pub fn new(policy: &BucketPolicy, now: Millis) -> Self {
        Bucket {
            tokens: policy.initial_tokens(),
            last_refill: now,
        }
    }

    #[inline]
    pub fn tokens(&self) -> Tokens {
        self.tokens
    }

    #[inline]
    pub fn last_refill_millis(&self) -> Millis {
        self.last_refill
    }

    /// Credits tokens for every whole period elapsed since the last refill.
    ///
    /// Excess above capacity is discarded. The refill marker advances by the
    /// credited periods only, so a partial period is never lost. A `now` earlier
    /// than the marker is treated as zero elapsed periods.
    pub fn refill(&mut self, policy: &BucketPolicy, now: Millis) -> RefillOutcome {
        if now < self.last_refill {
            return RefillOutcome::ClockRegressed {
                now,
                last_refill: self.last_refill,
            };
        }

        let elapsed = now - self.last_refill;
        let periods = elapsed / policy.refill_interval_millis;
        if periods == 0 {
            return RefillOutcome::Idle;
        }

        let granted = periods.saturating_mul(policy.tokens_per_interval);
        let before = self.tokens;
        self.tokens = self.tokens.saturating_add(granted).min(policy.capacity);
        // periods * interval <= elapsed, so this cannot overflow
        self.last_refill += periods * policy.refill_interval_millis;

        debug_assert!(self.tokens <= policy.capacity);
        RefillOutcome::Refilled {
            periods,
            added: self.tokens - before,
        }
    }

    /// Takes exactly one token if any is available.
    #[inline]
    pub fn try_consume(&mut self) -> bool {
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    /// Milliseconds from `now` until the next period boundary credits tokens.
    ///
    /// Meaningful right after [`refill`](Self::refill) with the same `now`; for
    /// a regressed clock it measures from the stored marker.
    pub fn retry_after_millis(&self, policy: &BucketPolicy, now: Millis) -> Millis {
        self.last_refill
            .saturating_add(policy.refill_interval_millis)
            .saturating_sub(now)
    }
}
