//! Time sources consumed by the limiter.
//!
//! The limiter never reads a process-wide clock on its own: a [`Clock`] is
//! handed to it at construction and owned for its whole lifetime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::types::Millis;

/// A source of milliseconds since an arbitrary fixed epoch.
///
/// Readings are expected to be non-decreasing. A reading that goes backwards
/// is tolerated by the limiter (see [`Bucket::refill`](crate::Bucket::refill))
/// but never credits or removes tokens.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> Millis;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now_millis(&self) -> Millis {
        (**self).now_millis()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now_millis(&self) -> Millis {
        (**self).now_millis()
    }
}

/// Monotonic wall clock whose epoch is the moment it was created.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    #[inline]
    fn now_millis(&self) -> Millis {
        // u128 millis only overflow u64 after ~584 million years of uptime.
        self.origin.elapsed().as_millis().min(Millis::MAX as u128) as Millis
    }
}

/// Manually driven clock for deterministic tests and simulations.
///
/// Clones share the same reading, so a test can keep one handle and give
/// another to the limiter.
///
/// ```rust
/// use rate_guard_keyed::{Clock, ManualClock};
///
/// let clock = ManualClock::new(0);
/// let handle = clock.clone();
/// handle.advance(1_000);
/// assert_eq!(clock.now_millis(), 1_000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_millis: Millis) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_millis)),
        }
    }

    /// Moves the clock forward by `millis`, saturating at `u64::MAX`.
    pub fn advance(&self, millis: Millis) {
        let _ = self
            .now
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |now| {
                Some(now.saturating_add(millis))
            });
    }

    /// Sets the reading to `millis`. Unlike [`advance`](Self::advance) this
    /// may move time backwards.
    pub fn set(&self, millis: Millis) {
        self.now.store(millis, Ordering::Release);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_millis(&self) -> Millis {
        self.now.load(Ordering::Acquire)
    }
}
