//! Response cache related types.
//!
//! A response cache collects the fragments of multi-part device responses
//! and hands the assembled result to the single consumer that registered
//! interest in them.

use crate::*;
use std::sync::Arc;
use std::time::Duration;

/// An opaque fragment payload, as extracted by the protocol layer.
pub type Fragment = bytes::Bytes;

/// The snapshot delivered to a waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledResult {
    /// True if the fragment count reached the expected total.
    ///
    /// A result delivered because the waiter timed out may be partial.
    pub complete: bool,

    /// The expected total, as supplied by the most recent ingest.
    pub expected_total: usize,

    /// The fragments collected so far, in arrival order.
    pub fragments: Vec<Fragment>,
}

/// Callback invoked at most once with the assembled result.
pub type DeliverFn = Box<dyn FnOnce(AssembledResult) + 'static + Send>;

/// Point-in-time sizes of the cache maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of in-progress accumulation records.
    pub records: usize,

    /// Number of registered waiters.
    pub waiters: usize,
}

/// Correlates fragments of a response with the consumer waiting on it.
pub trait ResponseCache: 'static + Send + Sync + std::fmt::Debug {
    /// Add fragments for a key.
    ///
    /// `expected_total` overwrites whatever total was previously recorded
    /// for the key. If producers disagree about the total, the latest call
    /// wins, which can complete a response early or late.
    ///
    /// When the fragment count reaches the expected total, the registered
    /// waiter (if any) is notified and all state for the key is dropped.
    fn ingest(
        &self,
        device_id: &str,
        channel_id: &str,
        sn: u32,
        expected_total: usize,
        fragments: Vec<Fragment>,
    );

    /// Register a one-shot callback for a key.
    ///
    /// Replaces any callback already registered for the key; the replaced
    /// callback is dropped and never invoked.
    ///
    /// The callback runs when a later ingest completes the key, or once
    /// `timeout` has elapsed, with whatever has been collected so far.
    /// If nothing at all was collected by then the callback is dropped
    /// without being invoked. Registering after the key has already
    /// completed therefore never delivers.
    fn await_once(
        &self,
        device_id: &str,
        channel_id: &str,
        sn: u32,
        callback: DeliverFn,
        timeout: Duration,
    );

    /// Sizes of the record and waiter maps.
    fn stats(&self) -> CacheStats;

    /// Stop background expiry processing.
    fn close(&self);

    /// Register interest in a key and wait for the result.
    ///
    /// Resolves with an error if the callback is dropped without being
    /// invoked: it was replaced by another registration, it timed out with
    /// nothing collected, or the cache went away.
    fn await_response(
        &self,
        key: CorrelationKey,
        timeout: Duration,
    ) -> BoxFut<'_, CacheResult<AssembledResult>> {
        let (send, recv) = tokio::sync::oneshot::channel();
        self.await_once(
            &key.device_id,
            &key.channel_id,
            key.sn,
            Box::new(move |result| {
                let _ = send.send(result);
            }),
            timeout,
        );
        Box::pin(async move {
            recv.await.map_err(|_| CacheError::WaiterAbandoned { key })
        })
    }
}

/// Trait-object [ResponseCache].
pub type DynResponseCache = Arc<dyn ResponseCache>;

/// A factory for constructing [ResponseCache] instances.
pub trait ResponseCacheFactory: 'static + Send + Sync + std::fmt::Debug {
    /// Write this module's default configuration into `config`.
    fn default_config(&self, config: &mut config::Config) -> CacheResult<()>;

    /// Check a configuration before it is used.
    fn validate_config(&self, config: &config::Config) -> CacheResult<()>;

    /// Construct a response cache instance.
    ///
    /// Must be called from within a tokio runtime, the instance owns a
    /// background expiry task.
    fn create(
        &self,
        config: Arc<config::Config>,
    ) -> BoxFut<'static, CacheResult<DynResponseCache>>;
}

/// Trait-object [ResponseCacheFactory].
pub type DynResponseCacheFactory = Arc<dyn ResponseCacheFactory>;
