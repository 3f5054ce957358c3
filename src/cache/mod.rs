//! Cache Module
//!
//! Provides a sharded in-memory cache with TTL expiration and background
//! reclamation.

mod entry;
mod heap;
mod sharded;
mod stats;
mod store;


// Re-export public types
pub use sharded::{fnv1a_32, TtlCache};
pub use stats::CacheStats;

pub(crate) use entry::CacheEntry;
pub(crate) use heap::ExpiryHeap;
pub(crate) use sharded::CacheInner;
pub(crate) use store::EntryStore;
