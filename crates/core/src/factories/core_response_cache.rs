//! The core response cache implementation.
//!
//! A single logical query to a device, e.g. "list all recordings on a
//! channel", may be answered by the device with several fragments, in any
//! order, with no guarantee that all of them arrive. This module collects
//! those fragments and hands the assembled result to the one consumer
//! waiting for it.
//!
//! It consists of multiple parts:
//! - A record map that accumulates fragments per [CorrelationKey]
//! - A waiter map that holds one callback per [CorrelationKey]
//! - A sweep task that fires timed out waiters and drops stale records
//!
//! ### Records
//!
//! - Created by the first ingest for a key.
//! - Every ingest appends its fragments and overwrites the expected total.
//! - As soon as the fragment count equals the expected total, the record
//!   and the waiter for the key (if any) are removed together, and the
//!   waiter is notified.
//! - Records no one completes are dropped by the sweep task once they
//!   are older than the retention window.
//!
//! ### Waiters
//!
//! - Registering a waiter replaces any existing one for the same key.
//! - A waiter is notified on completion, or by the sweep task after its
//!   timeout with whatever was collected so far.
//! - A waiter that times out while nothing at all was collected for its
//!   key is dropped without being notified.
//!
//! ### Locking
//!
//! Both maps live behind one lock. Callbacks are always invoked after the
//! lock is released, so a callback may call back into the cache.

use respcache_api::{config::Config, *};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

mod sweep;

/// CoreResponseCache configuration types.
pub mod config {
    use std::time::Duration;

    /// Configuration parameters for [CoreResponseCacheFactory](super::CoreResponseCacheFactory).
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct CoreResponseCacheConfig {
        /// How long a record may sit in the cache without being completed
        /// before it is dropped. Default: 60 s.
        pub retention_s: u32,
        /// How often timed out waiters and stale records are checked for.
        /// Default: 1000 ms.
        pub sweep_interval_ms: u32,
    }

    impl Default for CoreResponseCacheConfig {
        fn default() -> Self {
            Self {
                retention_s: 60,
                sweep_interval_ms: 1000,
            }
        }
    }

    impl CoreResponseCacheConfig {
        /// Get the retention window as a [Duration].
        pub fn retention(&self) -> Duration {
            Duration::from_secs(self.retention_s as u64)
        }

        /// Get the sweep interval as a [Duration].
        pub fn sweep_interval(&self) -> Duration {
            Duration::from_millis(self.sweep_interval_ms as u64)
        }
    }

    /// Module-level configuration for CoreResponseCache.
    #[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct CoreResponseCacheModConfig {
        /// CoreResponseCache configuration.
        pub core_response_cache: CoreResponseCacheConfig,
    }
}

pub use config::*;

/// A production-ready response cache factory.
#[derive(Debug)]
pub struct CoreResponseCacheFactory {}

impl CoreResponseCacheFactory {
    /// Construct a new CoreResponseCacheFactory.
    pub fn create() -> DynResponseCacheFactory {
        let out: DynResponseCacheFactory = Arc::new(Self {});
        out
    }
}

impl ResponseCacheFactory for CoreResponseCacheFactory {
    fn default_config(&self, config: &mut Config) -> CacheResult<()> {
        config.set_module_config(&CoreResponseCacheModConfig::default())
    }

    fn validate_config(&self, config: &Config) -> CacheResult<()> {
        let config: CoreResponseCacheModConfig = config.get_module_config()?;

        if config.core_response_cache.retention_s == 0 {
            return Err(CacheError::InvalidConfig {
                reason: "retentionS must be non-zero",
            });
        }

        if config.core_response_cache.sweep_interval_ms == 0 {
            return Err(CacheError::InvalidConfig {
                reason: "sweepIntervalMs must be non-zero",
            });
        }

        Ok(())
    }

    fn create(
        &self,
        config: Arc<Config>,
    ) -> BoxFut<'static, CacheResult<DynResponseCache>> {
        let config = self
            .validate_config(&config)
            .and_then(|_| {
                config.get_module_config::<CoreResponseCacheModConfig>()
            });
        Box::pin(async move {
            let config = config?;
            let out: DynResponseCache =
                Arc::new(CoreResponseCache::new(config.core_response_cache));
            Ok(out)
        })
    }
}

/// Fragments collected so far for one key.
#[derive(Debug)]
struct Record {
    created_at: Instant,
    expected_total: usize,
    fragments: Vec<Fragment>,
}

impl Record {
    fn new(created_at: Instant, expected_total: usize) -> Self {
        Self {
            created_at,
            expected_total,
            fragments: Vec::new(),
        }
    }

    fn is_complete(&self) -> bool {
        self.fragments.len() == self.expected_total
    }

    fn into_result(self) -> AssembledResult {
        AssembledResult {
            complete: self.is_complete(),
            expected_total: self.expected_total,
            fragments: self.fragments,
        }
    }
}

/// A registered consumer for one key.
struct Waiter {
    callback: DeliverFn,
    registered_at: Instant,
    timeout: Duration,
}

impl std::fmt::Debug for Waiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waiter")
            .field("registered_at", &self.registered_at)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Waiter {
    fn has_timed_out(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.registered_at) > self.timeout
    }
}

/// State removed from the cache for one key, to be acted on once the
/// lock is released.
#[derive(Debug)]
struct Delivery {
    key: CorrelationKey,
    waiter: Option<Waiter>,
    result: Option<AssembledResult>,
}

impl Delivery {
    fn deliver(self) {
        let Delivery {
            key,
            waiter,
            result,
        } = self;

        match (waiter, result) {
            (Some(waiter), Some(result)) => {
                tracing::debug!(
                    %key,
                    complete = result.complete,
                    count = result.fragments.len(),
                    "notifying waiter"
                );
                (waiter.callback)(result);
            }
            (Some(_), None) => {
                tracing::debug!(
                    %key,
                    "waiter timed out with nothing collected, dropping it"
                );
            }
            (None, Some(result)) => {
                tracing::debug!(
                    %key,
                    complete = result.complete,
                    count = result.fragments.len(),
                    "no waiter registered, dropping result"
                );
            }
            (None, None) => (),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    records: HashMap<CorrelationKey, Record>,
    waiters: HashMap<CorrelationKey, Waiter>,
}

impl State {
    /// Append fragments to the record for `key`.
    ///
    /// Returns the delivery for the key if this call completed it.
    fn ingest(
        &mut self,
        key: CorrelationKey,
        expected_total: usize,
        fragments: Vec<Fragment>,
        now: Instant,
    ) -> Option<Delivery> {
        let record = self
            .records
            .entry(key.clone())
            .and_modify(|record| {
                // Latest caller wins, even if producers disagree.
                record.expected_total = expected_total;
            })
            .or_insert_with(|| Record::new(now, expected_total));
        record.fragments.extend(fragments);

        tracing::debug!(
            %key,
            expected_total,
            count = record.fragments.len(),
            "ingested fragments"
        );

        if !record.is_complete() {
            return None;
        }

        Some(self.take(&key))
    }

    /// Register a waiter, returning the one it replaced.
    fn register(
        &mut self,
        key: CorrelationKey,
        waiter: Waiter,
    ) -> Option<Waiter> {
        self.waiters.insert(key, waiter)
    }

    /// Remove both the record and the waiter for `key`.
    fn take(&mut self, key: &CorrelationKey) -> Delivery {
        Delivery {
            key: key.clone(),
            waiter: self.waiters.remove(key),
            result: self.records.remove(key).map(Record::into_result),
        }
    }

    /// Remove every waiter whose timeout has elapsed, along with the
    /// record collected for it so far.
    fn take_timed_out(&mut self, now: Instant) -> Vec<Delivery> {
        let timed_out: Vec<CorrelationKey> = self
            .waiters
            .iter()
            .filter(|(_, waiter)| waiter.has_timed_out(now))
            .map(|(key, _)| key.clone())
            .collect();

        timed_out.iter().map(|key| self.take(key)).collect()
    }

    /// Drop records older than `retention` without notifying anyone.
    fn evict_expired(&mut self, retention: Duration, now: Instant) {
        self.records.retain(|key, record| {
            let age = now.saturating_duration_since(record.created_at);
            if age > retention {
                tracing::debug!(
                    %key,
                    ?age,
                    count = record.fragments.len(),
                    "evicting expired record"
                );
                false
            } else {
                true
            }
        });
    }
}

#[derive(Debug)]
pub(crate) struct DropAbortHandle {
    pub(crate) name: &'static str,
    pub(crate) handle: tokio::task::AbortHandle,
}

impl Drop for DropAbortHandle {
    fn drop(&mut self) {
        tracing::info!("Aborting: {}", self.name);
        self.handle.abort();
    }
}

#[derive(Debug)]
struct CoreResponseCache {
    state: Arc<Mutex<State>>,
    sweep_task: Mutex<Option<DropAbortHandle>>,
}

impl CoreResponseCache {
    fn new(config: CoreResponseCacheConfig) -> Self {
        let state = Arc::new(Mutex::new(State::default()));
        let sweep_task = sweep::spawn_sweep_task(&config, state.clone());

        Self {
            state,
            sweep_task: Mutex::new(Some(DropAbortHandle {
                name: "Response cache sweep task",
                handle: sweep_task,
            })),
        }
    }
}

impl ResponseCache for CoreResponseCache {
    fn ingest(
        &self,
        device_id: &str,
        channel_id: &str,
        sn: u32,
        expected_total: usize,
        fragments: Vec<Fragment>,
    ) {
        let key = CorrelationKey::new(device_id, channel_id, sn);
        let delivery = self.state.lock().unwrap().ingest(
            key,
            expected_total,
            fragments,
            Instant::now(),
        );

        if let Some(delivery) = delivery {
            delivery.deliver();
        }
    }

    fn await_once(
        &self,
        device_id: &str,
        channel_id: &str,
        sn: u32,
        callback: DeliverFn,
        timeout: Duration,
    ) {
        let key = CorrelationKey::new(device_id, channel_id, sn);
        let waiter = Waiter {
            callback,
            registered_at: Instant::now(),
            timeout,
        };

        let replaced =
            self.state.lock().unwrap().register(key.clone(), waiter);

        if replaced.is_some() {
            tracing::debug!(%key, "replaced existing waiter");
        }
    }

    fn stats(&self) -> CacheStats {
        let lock = self.state.lock().unwrap();
        CacheStats {
            records: lock.records.len(),
            waiters: lock.waiters.len(),
        }
    }

    fn close(&self) {
        // Dropping the handle aborts the task.
        self.sweep_task.lock().unwrap().take();
    }
}
