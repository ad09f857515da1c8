//! Per-caller admission control on top of a token bucket.
//!
//! Each caller identifier owns a bucket that holds at most `capacity` tokens and
//! is credited `tokens_per_interval` tokens for every whole `refill_interval`
//! that elapses. Every admission request takes one token; an empty bucket
//! denies. Bursts are bounded by the capacity, sustained throughput by the
//! refill rate.
//!
//! # Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use rate_guard_keyed::{KeyedRateLimiter, ManualClock, TokenBucketConfig};
//!
//! // Burst of up to 4, one new token per second
//! let clock = ManualClock::new(0);
//! let config = TokenBucketConfig::new(4, Duration::from_secs(1), 1);
//! let limiter: KeyedRateLimiter<String, _> = KeyedRateLimiter::new(config, clock.clone()).unwrap();
//!
//! assert!(limiter.allowed("bob"));  // new buckets start with one period's grant
//! assert!(!limiter.allowed("bob"));
//!
//! clock.advance(4_001);
//! for _ in 0..4 {
//!     assert!(limiter.allowed("bob"));
//! }
//! assert!(!limiter.allowed("bob"));
//! ```
//!
//! # Core Concepts
//!
//! ## Time Representation
//! Time is whatever the injected [`Clock`] says, in milliseconds since an
//! arbitrary epoch. [`SystemClock`] is monotonic; [`ManualClock`] is driven by
//! hand for tests. A clock that jumps backwards never removes tokens: the
//! refill is skipped and a warning is logged.
//!
//! ## Initial Balance
//! A new bucket starts with `tokens_per_interval` tokens (capped at
//! `capacity`), not a full bucket.
//!
//! ## Thread Safety
//! Bucket creation is an atomic insert-if-absent, and each bucket is mutated
//! under its own lock. Unrelated identifiers never wait on each other.
//!
//! ## Logging
//! Events are emitted through [`tracing`]; install a subscriber to see them.

pub mod bucket;
pub mod clock;
pub mod config;
pub mod error;
pub mod limiter;
pub mod rate_limit;
pub mod store;
pub mod types;

pub use bucket::{Bucket, BucketPolicy, RefillOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TokenBucketConfig;
pub use error::{AdmissionResult, ConfigError, RateLimitError};
pub use limiter::KeyedRateLimiter;
pub use rate_limit::AdmissionControl;
pub use store::{BucketStore, SharedBucket};
pub use types::{Millis, Tokens};
