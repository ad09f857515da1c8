//! Identifier-to-bucket mapping.
//!
//! # Concurrency contract
//!
//! - **Insert-if-absent is atomic.** Creation goes through the map's entry API,
//!   which holds the owning shard's write lock while it checks and inserts.
//!   Two callers racing on an unseen key observe the same bucket and the
//!   initializer runs once.
//! - **Mutation is exclusive per bucket.** Each bucket sits behind its own
//!   [`parking_lot::Mutex`]; the shard lock is released before the bucket lock
//!   is taken, so work on one key never holds up another key, not even one
//!   hashed into the same shard.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::bucket::Bucket;

/// Shared handle to one caller's bucket.
pub type SharedBucket = Arc<Mutex<Bucket>>;

/// Concurrent map from caller identifier to [`Bucket`].
///
/// Buckets are created lazily and retained for the life of the store.
#[derive(Debug)]
pub struct BucketStore<K>
where
    K: Eq + Hash,
{
    buckets: DashMap<K, SharedBucket>,
}

impl<K> BucketStore<K>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
        }
    }

    /// Returns the bucket for `key`, creating it with `init` when absent.
    ///
    /// The boolean is `true` when this call created the bucket. `init` runs at
    /// most once per key across all threads and must not touch the store.
    pub fn get_or_create<Q, F>(&self, key: &Q, init: F) -> (SharedBucket, bool)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
        F: FnOnce() -> Bucket,
    {
        if let Some(existing) = self.get(key) {
            return (existing, false);
        }

        let mut created = false;
        let bucket = self
            .buckets
            .entry(key.to_owned())
            .or_insert_with(|| {
                created = true;
                Arc::new(Mutex::new(init()))
            })
            .value()
            .clone();
        (bucket, created)
    }

    /// Runs `f` with exclusive access to the bucket for `key`, creating it with
    /// `init` when absent. Returns `f`'s result and whether the bucket was created.
    pub fn with_bucket<Q, F, R>(&self, key: &Q, init: F, f: impl FnOnce(&mut Bucket) -> R) -> (R, bool)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
        F: FnOnce() -> Bucket,
    {
        let (bucket, created) = self.get_or_create(key, init);
        let mut guard = bucket.lock();
        (f(&mut guard), created)
    }

    /// Runs `f` with exclusive access to an existing bucket; never creates one.
    pub fn with_existing<Q, R>(&self, key: &Q, f: impl FnOnce(&mut Bucket) -> R) -> Option<R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = self.get(key)?;
        let mut guard = bucket.lock();
        Some(f(&mut guard))
    }

    pub fn get<Q>(&self, key: &Q) -> Option<SharedBucket>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets.contains_key(key)
    }

    /// Number of buckets held.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl<K> Default for BucketStore<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
