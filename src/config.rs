//! Configuration Module
//!
//! Raw construction parameters for a cache, as a host would deserialize them.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// Values are signed so that out-of-range input coming from a settings file
/// is caught by [`CacheConfig::validate`] rather than by the deserializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live of every entry, in milliseconds
    pub ttl_ms: i64,
    /// Number of shards; zero or negative means one per available CPU
    pub shards: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 300_000,
            shards: 0,
        }
    }
}

impl CacheConfig {
    /// Creates a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entry TTL.
    ///
    /// The TTL is stored in whole milliseconds, rounded up, so a non-zero
    /// sub-millisecond TTL becomes 1 ms rather than 0.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        let millis = ttl.as_millis() + u128::from(ttl.subsec_nanos() % 1_000_000 != 0);
        self.ttl_ms = i64::try_from(millis).unwrap_or(i64::MAX);
        self
    }

    /// Sets the shard count (zero selects the available parallelism).
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = i64::try_from(shards).unwrap_or(i64::MAX);
        self
    }

    // == Validate ==
    /// Checks the raw values and resolves them into a TTL and a shard count.
    ///
    /// # Errors
    /// - `CacheError::InvalidConfig` if `ttl_ms` is negative
    pub fn validate(&self) -> Result<(Duration, usize)> {
        let ttl_ms = u64::try_from(self.ttl_ms).map_err(|_| {
            CacheError::InvalidConfig(format!("ttl_ms cannot be negative, got {}", self.ttl_ms))
        })?;

        let shards = usize::try_from(self.shards).unwrap_or(0);
        Ok((Duration::from_millis(ttl_ms), resolve_shard_count(shards)))
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Maps a requested shard count to the one actually used.
///
/// Zero means "one shard per unit of available parallelism".
pub fn resolve_shard_count(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
