//! Sharded Cache Module
//!
//! Public cache type: routes keys to independently locked shards and owns the
//! background reaper task.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::stats::StatCounters;
use crate::cache::{CacheStats, EntryStore};
use crate::config::{resolve_shard_count, saturating_millis, CacheConfig};
use crate::error::{CacheError, Result};
use crate::tasks::spawn_reaper_task;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a hash, used to route keys to shards.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

// == Cache Inner ==
/// State shared between the cache handle and its reaper task.
pub(crate) struct CacheInner<V> {
    /// Fixed for the lifetime of the cache
    shards: Box<[RwLock<EntryStore<V>>]>,
    ttl: Duration,
    stats: StatCounters,
}

impl<V> CacheInner<V> {
    pub(crate) fn new(ttl: Duration, shard_count: usize) -> Self {
        Self {
            shards: (0..shard_count)
                .map(|_| RwLock::new(EntryStore::new()))
                .collect(),
            ttl,
            stats: StatCounters::default(),
        }
    }

    pub(crate) fn ttl(&self) -> Duration {
        self.ttl
    }

    fn shard_index(&self, key: &str) -> usize {
        fnv1a_32(key.as_bytes()) as usize % self.shards.len()
    }

    fn shard(&self, key: &str) -> &RwLock<EntryStore<V>> {
        &self.shards[self.shard_index(key)]
    }

    // == Reclaim Expired ==
    /// Runs one sweep over every shard, one exclusive lock at a time.
    ///
    /// Returns the number of entries removed.
    pub(crate) fn reclaim_expired(&self, now: Instant) -> usize {
        let removed: usize = self
            .shards
            .iter()
            .map(|shard| shard.write().reclaim_expired(self.ttl, now))
            .sum();
        self.stats.record_reclaimed(removed);
        removed
    }

    fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }
}

// == TTL Cache ==
/// Concurrent in-memory cache where every entry expires a fixed time after
/// insertion.
///
/// Keys are spread over a fixed number of shards, each behind its own
/// read/write lock. Lookups take the read lock and check freshness lazily;
/// a background reaper task removes expired entries every `ttl`.
///
/// The reaper runs on the tokio runtime current at construction. It is
/// stopped by [`TtlCache::shutdown`], [`TtlCache::close`] or by dropping the
/// cache.
///
/// # Example
/// ```rust,no_run
/// use std::time::Duration;
/// use ttl_shard_cache::TtlCache;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = TtlCache::new(Duration::from_secs(60), 0).unwrap();
///     cache.add("answer", 42).unwrap();
///     assert_eq!(cache.get("answer"), Some(42));
///     cache.close().await;
/// }
/// ```
pub struct TtlCache<V> {
    inner: Arc<CacheInner<V>>,
    /// Sender to signal shutdown to the reaper task
    shutdown_tx: watch::Sender<bool>,
    /// Taken by the first `close`
    reaper: Mutex<Option<JoinHandle<()>>>,
}

impl<V: Send + Sync + 'static> TtlCache<V> {
    // == Constructor ==
    /// Creates a cache and starts its reaper task.
    ///
    /// # Arguments
    /// * `ttl` - Lifetime of every entry; also the sweep period
    /// * `shards` - Number of shards; 0 means one per available CPU
    ///
    /// # Errors
    /// - `CacheError::NoRuntime` if called outside a tokio runtime
    pub fn new(ttl: Duration, shards: usize) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let shard_count = resolve_shard_count(shards);
        let inner = Arc::new(CacheInner::new(ttl, shard_count));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let reaper = spawn_reaper_task(&runtime, Arc::clone(&inner), shutdown_rx);

        info!(
            ttl_ms = saturating_millis(ttl),
            shards = shard_count,
            "TTL cache created"
        );

        Ok(Self {
            inner,
            shutdown_tx,
            reaper: Mutex::new(Some(reaper)),
        })
    }

    /// Creates a cache from raw configuration values.
    ///
    /// # Errors
    /// - `CacheError::InvalidConfig` if the TTL is negative
    /// - `CacheError::NoRuntime` if called outside a tokio runtime
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let (ttl, shards) = config.validate()?;
        Self::new(ttl, shards)
    }
}

impl<V> TtlCache<V> {
    // == Add ==
    /// Stores `value` under `key`, replacing any previous value and restarting
    /// the key's TTL.
    ///
    /// # Errors
    /// - `CacheError::EmptyKey` if `key` is empty; nothing is stored
    pub fn add(&self, key: &str, value: V) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        let mut shard = self.inner.shard(key).write();
        shard.insert(key, value, Instant::now());
        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns None if the key is absent or its entry has outlived the TTL.
    /// Expired entries are left for the reaper.
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let now = Instant::now();
        let value = {
            let shard = self.inner.shard(key).read();
            shard.get(key, self.inner.ttl, now).cloned()
        };

        match value {
            Some(_) => self.inner.stats.record_hit(),
            None => self.inner.stats.record_miss(),
        }
        value
    }

    // == Reclaim Expired ==
    /// Runs one reclamation sweep immediately, independent of the reaper.
    ///
    /// Returns the number of entries removed.
    pub fn reclaim_expired(&self) -> usize {
        self.inner.reclaim_expired(Instant::now())
    }

    /// Returns the number of stored entries, including expired entries that
    /// have not been swept yet.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the shard `key` is routed to.
    pub fn shard_index(&self, key: &str) -> usize {
        self.inner.shard_index(key)
    }

    /// Returns the number of entries stored in shard `index`.
    pub fn shard_len(&self, index: usize) -> Option<usize> {
        self.inner.shards.get(index).map(|shard| shard.read().len())
    }

    pub fn shard_count(&self) -> usize {
        self.inner.shards.len()
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot(self.len(), self.shard_count())
    }

    // == Shutdown ==
    /// Signals the reaper task to stop. Safe to call more than once.
    ///
    /// The cache stays usable; expired entries are then only hidden, no longer
    /// reclaimed.
    pub fn shutdown(&self) {
        if !self.shutdown_tx.send_replace(true) {
            debug!("Shutdown signalled to reaper task");
        }
    }

    /// Returns true once shutdown has been signalled.
    pub fn is_shut_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    // == Close ==
    /// Signals shutdown and waits for the reaper task to exit.
    ///
    /// Only the first call waits; later calls return immediately.
    pub async fn close(&self) {
        self.shutdown();

        let reaper = self.reaper.lock().take();
        if let Some(handle) = reaper {
            if let Err(err) = handle.await {
                warn!("Reaper task did not exit cleanly: {}", err);
            }
        }
    }

    /// True once the reaper task has exited (or has been joined by `close`).
    #[cfg(test)]
    pub(crate) fn reaper_finished(&self) -> bool {
        self.reaper
            .lock()
            .as_ref()
            .map_or(true, JoinHandle::is_finished)
    }
}

impl<V> Drop for TtlCache<V> {
    fn drop(&mut self) {
        // Signal the reaper task to stop when the cache is dropped
        self.shutdown_tx.send_replace(true);
    }
}

impl<V> fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.inner.ttl)
            .field("shards", &self.inner.shards.len())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
