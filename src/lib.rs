//! TTL Shard Cache - A sharded in-memory cache with time-based expiry
//!
//! Every entry expires a fixed time after insertion. Keys are spread over
//! independently locked shards, and a background task reclaims expired
//! entries once per TTL.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{CacheStats, TtlCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
