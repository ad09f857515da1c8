use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::bucket::{Bucket, BucketPolicy, RefillOutcome};
use crate::clock::{Clock, SystemClock};
use crate::config::TokenBucketConfig;
use crate::error::{AdmissionResult, ConfigError, RateLimitError};
use crate::store::BucketStore;
use crate::types::{Millis, Tokens};

/// Per-caller token bucket rate limiter.
///
/// Every distinct identifier gets its own [`Bucket`], created on first use with
/// one period's worth of tokens. Each admission request refills the caller's
/// bucket from the elapsed time and then tries to take a single token.
///
/// The limiter is `Send + Sync` and is meant to be shared (by reference or in
/// an `Arc`) by every thread admitting work. Requests for the same identifier
/// are serialized on that identifier's bucket; requests for different
/// identifiers do not wait on each other.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use rate_guard_keyed::{KeyedRateLimiter, ManualClock, TokenBucketConfig};
///
/// let clock = ManualClock::new(0);
/// let config = TokenBucketConfig::new(4, Duration::from_secs(1), 1);
/// let limiter: KeyedRateLimiter<String, _> = KeyedRateLimiter::new(config, clock.clone()).unwrap();
///
/// assert!(limiter.allowed("bob"));
/// assert!(!limiter.allowed("bob"));
/// assert!(limiter.allowed("alice"));
///
/// clock.advance(1_000);
/// assert!(limiter.allowed("bob"));
/// ```
#[derive(Debug)]
pub struct KeyedRateLimiter<K, C = SystemClock>
where
    K: Eq + Hash,
{
    config: TokenBucketConfig,
    policy: BucketPolicy,
    buckets: BucketStore<K>,
    clock: C,
}

impl<K> KeyedRateLimiter<K, SystemClock>
where
    K: Eq + Hash,
{
    /// Creates a limiter driven by a fresh [`SystemClock`].
    pub fn with_system_clock(config: TokenBucketConfig) -> Result<Self, ConfigError> {
        Self::new(config, SystemClock::new())
    }
}

impl<K, C> KeyedRateLimiter<K, C>
where
    K: Eq + Hash,
    C: Clock,
{
    /// Validates `config` and builds a limiter owning `clock`.
    ///
    /// # Errors
    ///
    /// Any zero capacity, interval or per-interval grant yields a [`ConfigError`].
    pub fn new(config: TokenBucketConfig, clock: C) -> Result<Self, ConfigError> {
        let policy = config.validate()?;
        debug!(
            capacity = policy.capacity(),
            refill_interval_ms = policy.refill_interval_millis(),
            tokens_per_interval = policy.tokens_per_interval(),
            "keyed rate limiter created"
        );
        Ok(Self {
            config,
            policy,
            buckets: BucketStore::new(),
            clock,
        })
    }

    /// Shorthand for [`new`](Self::new) with the configuration spelled out.
    pub fn from_parts(
        capacity: Tokens,
        refill_interval: Duration,
        tokens_per_interval: Tokens,
        clock: C,
    ) -> Result<Self, ConfigError> {
        Self::new(
            TokenBucketConfig::new(capacity, refill_interval, tokens_per_interval),
            clock,
        )
    }

    /// Decides whether `identifier` may perform one operation now.
    ///
    /// Resolves or creates the caller's bucket, refills it and consumes one
    /// token. Never blocks waiting for tokens; a `false` is final for this call.
    pub fn allowed<Q>(&self, identifier: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + Debug + ?Sized,
    {
        self.check(identifier).is_ok()
    }

    /// Like [`allowed`](Self::allowed), but a denial says how long until the
    /// next refill period credits this caller.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use rate_guard_keyed::{KeyedRateLimiter, ManualClock, RateLimitError};
    ///
    /// let clock = ManualClock::new(0);
    /// let limiter: KeyedRateLimiter<u64, _> =
    ///     KeyedRateLimiter::from_parts(2, Duration::from_secs(2), 1, clock.clone()).unwrap();
    ///
    /// assert_eq!(limiter.check(&7), Ok(()));
    /// clock.advance(500);
    /// assert_eq!(
    ///     limiter.check(&7),
    ///     Err(RateLimitError::InsufficientTokens { retry_after_millis: 1_500 })
    /// );
    /// ```
    pub fn check<Q>(&self, identifier: &Q) -> AdmissionResult
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + Debug + ?Sized,
    {
        let policy = &self.policy;
        // Read under the bucket lock so two callers of one key see ordered times.
        let mut now: Millis = 0;
        let (result, created) = self.buckets.with_bucket(
            identifier,
            || Bucket::new(policy, self.clock.now_millis()),
            |bucket| {
                now = self.clock.now_millis();
                self.refill(identifier, bucket, now);
                if bucket.try_consume() {
                    Ok(())
                } else {
                    Err(RateLimitError::InsufficientTokens {
                        retry_after_millis: bucket.retry_after_millis(policy, now),
                    })
                }
            },
        );

        if created {
            debug!(key = ?identifier, tracked_keys = self.buckets.len(), "bucket created");
        }
        match &result {
            Ok(()) => trace!(key = ?identifier, now, "admitted"),
            Err(RateLimitError::InsufficientTokens { retry_after_millis }) => {
                trace!(key = ?identifier, now, retry_after_millis, "denied")
            }
        }
        result
    }

    /// Current balance of `identifier`'s bucket after refilling it, or `None`
    /// if the identifier has never been seen. Consumes nothing and never
    /// creates a bucket.
    pub fn tokens_remaining<Q>(&self, identifier: &Q) -> Option<Tokens>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.buckets.with_existing(identifier, |bucket| {
            let now = self.clock.now_millis();
            self.refill(identifier, bucket, now);
            bucket.tokens()
        })
    }

    /// Number of identifiers currently holding a bucket.
    ///
    /// Buckets are never evicted, so this only grows.
    pub fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_tracked<Q>(&self, identifier: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets.contains_key(identifier)
    }

    pub fn config(&self) -> &TokenBucketConfig {
        &self.config
    }

    pub fn policy(&self) -> &BucketPolicy {
        &self.policy
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn refill<Q>(&self, identifier: &Q, bucket: &mut Bucket, now: Millis)
    where
        Q: Debug + ?Sized,
    {
        if let RefillOutcome::ClockRegressed { now, last_refill } = bucket.refill(&self.policy, now) {
            warn!(
                key = ?identifier,
                now,
                last_refill,
                "clock moved backwards; refill skipped"
            );
        }
    }
}
