//! Cache Entry Module
//!
//! Defines the structure for individual cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A single cache entry with its value and creation time.
///
/// The key is shared with the owning shard's position table.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<V> {
    /// Key the entry is stored under
    pub key: Arc<str>,
    /// Insertion time; expiry is measured from here
    pub created_at: Instant,
    /// The stored value
    pub value: V,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with `created_at`.
    pub(crate) fn new(key: Arc<str>, value: V, created_at: Instant) -> Self {
        Self {
            key,
            created_at,
            value,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry is expired once its age is greater than or
    /// equal to `ttl`, i.e. when `created_at + ttl <= now`. An entry read at
    /// exactly `ttl` after insertion is therefore a miss; a `<=` freshness
    /// test would still return it. The sweep uses this same predicate, so a
    /// lookup and a sweep never disagree about an entry.
    pub(crate) fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        self.age(now) >= ttl
    }

    /// Time elapsed since insertion, saturating at zero.
    pub(crate) fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    /// Remaining lifetime at `now`, zero once expired.
    #[cfg(test)]
    pub(crate) fn ttl_remaining(&self, ttl: Duration, now: Instant) -> Duration {
        ttl.saturating_sub(self.age(now))
    }
}
