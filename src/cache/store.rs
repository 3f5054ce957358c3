//! Entry Store Module
//!
//! Per-shard storage: TTL-aware insert, lookup and reclamation on top of the
//! expiry heap. Callers hold the shard lock around every call.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::{CacheEntry, ExpiryHeap};

// == Entry Store ==
/// Storage for one shard.
#[derive(Debug)]
pub(crate) struct EntryStore<V> {
    /// Entries indexed by key and ordered by creation time
    order: ExpiryHeap<V>,
}

impl<V> Default for EntryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> EntryStore<V> {
    // == Constructor ==
    /// Creates a new empty store.
    pub(crate) fn new() -> Self {
        Self {
            order: ExpiryHeap::new(),
        }
    }

    // == Insert ==
    /// Stores `value` under `key`, stamped with `now`.
    ///
    /// An existing entry for the key is replaced and its heap node removed, so
    /// a later sweep can only ever pop the entry the key currently refers to.
    ///
    /// Returns true if an entry was overwritten.
    pub(crate) fn insert(&mut self, key: &str, value: V, now: Instant) -> bool {
        let entry = CacheEntry::new(Arc::from(key), value, now);
        self.order.push(entry).is_some()
    }

    // == Get ==
    /// Returns the value for `key` if present and not expired at `now`.
    ///
    /// Expired entries are reported absent but left in place for the sweep.
    pub(crate) fn get(&self, key: &str, ttl: Duration, now: Instant) -> Option<&V> {
        self.order
            .get(key)
            .filter(|entry| !entry.is_expired(ttl, now))
            .map(|entry| &entry.value)
    }

    // == Reclaim Expired ==
    /// Pops expired entries off the front of the heap.
    ///
    /// Stops at the first entry that is still fresh: everything behind it was
    /// created no earlier, so it is fresh too.
    ///
    /// Returns the number of entries removed.
    pub(crate) fn reclaim_expired(&mut self, ttl: Duration, now: Instant) -> usize {
        let mut removed = 0;
        while self
            .order
            .peek_min()
            .is_some_and(|oldest| oldest.is_expired(ttl, now))
        {
            if self.order.pop_min().is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Creation time of the oldest entry, if any.
    #[cfg(test)]
    pub(crate) fn oldest_created_at(&self) -> Option<Instant> {
        self.order.peek_min().map(|entry| entry.created_at)
    }

    // == Length ==
    /// Returns the number of stored entries, expired or not.
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        self.order.assert_invariants();
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(10);

    #[test]
    fn test_store_new() {
        let store: EntryStore<String> = EntryStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert!(store.oldest_created_at().is_none());
    }

    #[test]
    fn test_store_insert_and_get() {
        let t0 = Instant::now();
        let mut store = EntryStore::new();

        assert!(!store.insert("key1", "value1".to_string(), t0));
        assert_eq!(store.get("key1", TTL, t0), Some(&"value1".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let store: EntryStore<String> = EntryStore::new();
        assert!(store.get("nonexistent", TTL, Instant::now()).is_none());
    }

    #[test]
    fn test_store_overwrite() {
        let t0 = Instant::now();
        let mut store = EntryStore::new();

        store.insert("key1", 1, t0);
        assert!(store.insert("key1", 2, t0 + Duration::from_secs(1)));

        assert_eq!(store.get("key1", TTL, t0 + Duration::from_secs(1)), Some(&2));
        assert_eq!(store.len(), 1);
        store.assert_invariants();
    }

    #[test]
    fn test_store_lazy_expiry_keeps_entry() {
        let t0 = Instant::now();
        let mut store = EntryStore::new();
        store.insert("key1", 1, t0);

        assert_eq!(store.get("key1", TTL, t0 + TTL - Duration::from_millis(1)), Some(&1));
        assert!(store.get("key1", TTL, t0 + TTL).is_none());
        // Lookups never remove; that is the sweep's job.
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_reclaim_expired() {
        let t0 = Instant::now();
        let mut store = EntryStore::new();

        store.insert("old1", 1, t0);
        store.insert("old2", 2, t0 + Duration::from_secs(1));
        store.insert("new", 3, t0 + Duration::from_secs(5));

        let removed = store.reclaim_expired(TTL, t0 + Duration::from_secs(11));
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("new", TTL, t0 + Duration::from_secs(11)), Some(&3));
        assert_eq!(store.oldest_created_at(), Some(t0 + Duration::from_secs(5)));
        store.assert_invariants();
    }

    #[test]
    fn test_store_reclaim_nothing_expired() {
        let t0 = Instant::now();
        let mut store = EntryStore::new();
        store.insert("key1", 1, t0);

        assert_eq!(store.reclaim_expired(TTL, t0 + Duration::from_secs(3)), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_reclaim_empty() {
        let mut store: EntryStore<u8> = EntryStore::new();
        assert_eq!(store.reclaim_expired(TTL, Instant::now()), 0);
    }

    #[test]
    fn test_reclaim_never_drops_overwritten_key() {
        let t0 = Instant::now();
        let mut store = EntryStore::new();

        // The first write is due at t0 + 10s, the overwrite at t0 + 18s.
        store.insert("key1", "stale", t0);
        store.insert("key1", "fresh", t0 + Duration::from_secs(8));

        let now = t0 + Duration::from_secs(12);
        assert_eq!(store.reclaim_expired(TTL, now), 0);
        assert_eq!(store.get("key1", TTL, now), Some(&"fresh"));
    }
}
