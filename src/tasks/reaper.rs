//! Reaper Task
//!
//! Background task that periodically reclaims expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::CacheInner;

/// Lower bound on the sweep period, so a zero TTL does not busy-loop.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Upper bound on the sweep period, so the timer deadline stays representable
/// for very large TTLs.
pub const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Sweep period for a given TTL: the TTL itself, clamped to
/// `[MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL]`.
///
/// Sweeping more often than the TTL only costs a lock pass per shard; it never
/// removes a fresh entry.
pub fn sweep_period(ttl: Duration) -> Duration {
    ttl.clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL)
}

/// Spawns the task that sweeps every shard once per TTL.
///
/// The first sweep runs one period after the call. The task exits when `true`
/// is sent on `shutdown_rx` or when the sender is dropped.
///
/// # Returns
/// A JoinHandle for the spawned task, awaited by `TtlCache::close`.
pub(crate) fn spawn_reaper_task<V>(
    runtime: &Handle,
    cache: Arc<CacheInner<V>>,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    let period = sweep_period(cache.ttl());

    runtime.spawn(async move {
        info!(
            "Starting reaper task with interval of {} ms",
            period.as_millis()
        );

        let start = Instant::now();
        let mut ticker = tokio::time::interval_at(start.checked_add(period).unwrap_or(start), period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = cache.reclaim_expired(Instant::now());

                    if removed > 0 {
                        info!("Reaper sweep: removed {} expired entries", removed);
                    } else {
                        debug!("Reaper sweep: no expired entries found");
                    }
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Reaper task stopped");
    })
}
