//! Integer aliases shared by the bucket, store and limiter.
//!
//! Time is an abstract count of milliseconds since an arbitrary epoch chosen
//! by the [`Clock`](crate::Clock); token balances are whole units.

/// Milliseconds as reported by a [`Clock`](crate::Clock).
pub type Millis = u64;

/// Whole tokens held by a bucket.
pub type Tokens = u64;
