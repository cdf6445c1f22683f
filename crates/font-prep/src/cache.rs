//! Bounded memoization caches.

use core::{borrow::Borrow, fmt, hash::Hash, num::NonZeroUsize};

use lru::LruCache;

/// Hit / miss counters of a [`BoundedCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of lookups answered from the cache.
    pub hits: u64,
    /// Number of lookups that had to compute the value.
    pub misses: u64,
}

/// Size-bounded key-value cache with least-recently-used eviction.
///
/// Each cache is owned by the component using it; there is no shared global state.
pub struct BoundedCache<K, V> {
    entries: LruCache<K, V>,
    stats: CacheStats,
}

impl<K: Hash + Eq, V> fmt::Debug for BoundedCache<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("BoundedCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.entries.cap())
            .field("stats", &self.stats)
            .finish()
    }
}

impl<K: Hash + Eq, V: Clone> BoundedCache<K, V> {
    /// Creates an empty cache holding at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    /// Returns the cached value for `key`, computing and caching it on a miss.
    pub fn get_or_insert_with<Q>(&mut self, key: &Q, compute: impl FnOnce(&Q) -> V) -> V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        let result: Result<V, core::convert::Infallible> =
            self.get_or_try_insert_with(key, |key| Ok(compute(key)));
        match result {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible version of [`Self::get_or_insert_with()`]. Errors are not cached.
    pub fn get_or_try_insert_with<Q, E>(
        &mut self,
        key: &Q,
        compute: impl FnOnce(&Q) -> Result<V, E>,
    ) -> Result<V, E>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        if let Some(value) = self.entries.get(key) {
            self.stats.hits += 1;
            return Ok(value.clone());
        }
        self.stats.misses += 1;
        let value = compute(key)?;
        self.entries.put(key.to_owned(), value.clone());
        Ok(value)
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Returns hit / miss counters.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
