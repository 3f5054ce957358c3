//! Expiry Heap Module
//!
//! Indexed binary min-heap of cache entries ordered by creation time.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::CacheEntry;

// == Expiry Heap ==
/// Min-heap of entries by `created_at`, plus the key -> heap position table.
///
/// The table is the shard's lookup index: every key maps to the slot its entry
/// currently occupies in `entries`. Every swap rewrites the positions of both
/// entries involved, so an entry can be found and removed by key in O(log n).
///
/// Since every entry in a cache shares the same TTL, the root is always the
/// entry that expires first.
#[derive(Debug)]
pub(crate) struct ExpiryHeap<V> {
    /// Heap array; `entries[0]` is the earliest-created entry
    entries: Vec<CacheEntry<V>>,
    /// Key -> index into `entries`
    positions: HashMap<Arc<str>, usize>,
}

impl<V> Default for ExpiryHeap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ExpiryHeap<V> {
    // == Constructor ==
    /// Creates a new empty heap.
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    // == Push ==
    /// Inserts an entry, replacing any entry already stored under its key.
    ///
    /// The replaced entry's node is removed from the heap before the new one is
    /// pushed, so a key never has more than one node.
    ///
    /// Returns the replaced entry, if any.
    pub(crate) fn push(&mut self, entry: CacheEntry<V>) -> Option<CacheEntry<V>> {
        let replaced = self.remove(&entry.key);

        let pos = self.entries.len();
        self.positions.insert(Arc::clone(&entry.key), pos);
        self.entries.push(entry);
        self.sift_up(pos);

        replaced
    }

    // == Peek Min ==
    /// Returns the earliest-created entry without removing it.
    pub(crate) fn peek_min(&self) -> Option<&CacheEntry<V>> {
        self.entries.first()
    }

    // == Pop Min ==
    /// Removes and returns the earliest-created entry.
    ///
    /// Returns None if the heap is empty.
    pub(crate) fn pop_min(&mut self) -> Option<CacheEntry<V>> {
        if self.entries.is_empty() {
            return None;
        }
        Some(self.remove_at(0))
    }

    // == Remove ==
    /// Removes the entry stored under `key`, using its recorded position.
    pub(crate) fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let pos = *self.positions.get(key)?;
        Some(self.remove_at(pos))
    }

    // == Get ==
    /// Looks up the entry stored under `key`.
    pub(crate) fn get(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.positions.get(key).map(|&pos| &self.entries[pos])
    }

    /// Returns the current heap position of `key`.
    #[cfg(test)]
    pub(crate) fn position(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    // == Length ==
    /// Returns the number of entries in the heap.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_at(&mut self, pos: usize) -> CacheEntry<V> {
        // The last entry moves into the hole.
        let entry = self.entries.swap_remove(pos);
        self.positions.remove(&entry.key);

        if pos < self.entries.len() {
            self.set_position(pos);
            let pos = self.sift_up(pos);
            self.sift_down(pos);
        }

        entry
    }

    fn less(&self, i: usize, j: usize) -> bool {
        self.entries[i].created_at < self.entries[j].created_at
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.entries.swap(i, j);
        self.set_position(i);
        self.set_position(j);
    }

    fn set_position(&mut self, pos: usize) {
        if let Some(slot) = self.positions.get_mut(&*self.entries[pos].key) {
            *slot = pos;
        }
    }

    /// Moves the entry at `pos` towards the root; returns where it settled.
    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.less(pos, parent) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
        pos
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let smallest = if right < len && self.less(right, left) {
                right
            } else {
                left
            };
            if !self.less(smallest, pos) {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    /// Panics if the heap order or the position table is inconsistent.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        assert_eq!(self.positions.len(), self.entries.len(), "table/heap size mismatch");
        for (i, entry) in self.entries.iter().enumerate() {
            assert_eq!(self.positions.get(&entry.key), Some(&i), "stale position for {}", entry.key);
            if i > 0 {
                assert!(!self.less(i, (i - 1) / 2), "heap order violated at {}", i);
            }
        }
    }
}
