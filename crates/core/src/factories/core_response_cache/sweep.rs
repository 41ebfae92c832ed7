use super::{CoreResponseCacheConfig, Delivery, State};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Spawns a task that fires timed out waiters and drops stale records.
pub(super) fn spawn_sweep_task(
    config: &CoreResponseCacheConfig,
    state: Arc<Mutex<State>>,
) -> AbortHandle {
    tracing::info!("Starting response cache sweep task");

    let retention = config.retention();
    let mut interval = tokio::time::interval(config.sweep_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::spawn(async move {
        loop {
            interval.tick().await;

            for delivery in sweep(&state, retention, Instant::now()) {
                deliver_isolated(delivery);
            }
        }
    })
    .abort_handle()
}

/// Run a delivery so that a panicking callback cannot take the sweep task
/// down with it.
fn deliver_isolated(delivery: Delivery) {
    let key = delivery.key.clone();
    if std::panic::catch_unwind(AssertUnwindSafe(|| delivery.deliver()))
        .is_err()
    {
        tracing::warn!(%key, "waiter callback panicked");
    }
}

/// One pass over both maps.
///
/// Returns the deliveries for timed out waiters, which must be made after
/// the lock is released.
pub(super) fn sweep(
    state: &Mutex<State>,
    retention: Duration,
    now: Instant,
) -> Vec<Delivery> {
    let mut lock = state.lock().unwrap();
    let deliveries = lock.take_timed_out(now);
    lock.evict_expired(retention, now);
    deliveries
}
