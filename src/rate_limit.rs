//! Object-safe admission trait.
//!
//! Lets a surrounding service hold a limiter as `Box<dyn AdmissionControl<str>>`
//! (or `Arc<dyn ...>`) without naming its key or clock types.

use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;

use crate::clock::Clock;
use crate::error::AdmissionResult;
use crate::limiter::KeyedRateLimiter;

/// An admission decision source keyed by identifiers of type `Q`.
pub trait AdmissionControl<Q: ?Sized>: Send + Sync {
    /// Admits or denies one operation for `identifier`.
    fn allowed(&self, identifier: &Q) -> bool;

    /// Same decision as [`allowed`](Self::allowed), with diagnostics on denial.
    fn check(&self, identifier: &Q) -> AdmissionResult;
}

impl<K, Q, C> AdmissionControl<Q> for KeyedRateLimiter<K, C>
where
    K: Eq + Hash + Borrow<Q> + Send + Sync,
    Q: Hash + Eq + ToOwned<Owned = K> + Debug + ?Sized,
    C: Clock,
{
    #[inline]
    fn allowed(&self, identifier: &Q) -> bool {
        KeyedRateLimiter::allowed(self, identifier)
    }

    #[inline]
    fn check(&self, identifier: &Q) -> AdmissionResult {
        KeyedRateLimiter::check(self, identifier)
    }
}
