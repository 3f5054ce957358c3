//! Background Tasks Module
//!
//! Contains background tasks that run periodically for the lifetime of a cache.
//!
//! # Tasks
//! - Reaper: reclaims expired cache entries once per TTL

mod reaper;

pub(crate) use reaper::spawn_reaper_task;
pub use reaper::{sweep_period, MAX_SWEEP_INTERVAL, MIN_SWEEP_INTERVAL};
