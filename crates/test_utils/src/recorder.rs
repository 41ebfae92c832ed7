use respcache_api::{AssembledResult, DeliverFn};
use std::sync::{Arc, Mutex};

/// Records every result delivered through the callbacks it hands out.
///
/// Each callback is tagged, so tests can tell which registration was
/// notified when a waiter has been replaced.
#[derive(Debug, Clone, Default)]
pub struct DeliveryRecorder(Arc<Mutex<Vec<(&'static str, AssembledResult)>>>);

impl DeliveryRecorder {
    /// Construct a new, empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that records its result under `tag`.
    pub fn callback(&self, tag: &'static str) -> DeliverFn {
        let inner = self.0.clone();
        Box::new(move |result| {
            inner.lock().unwrap().push((tag, result));
        })
    }

    /// All recorded deliveries so far.
    pub fn deliveries(&self) -> Vec<(&'static str, AssembledResult)> {
        self.0.lock().unwrap().clone()
    }

    /// Number of recorded deliveries.
    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    /// Number of deliveries recorded under `tag`.
    pub fn count_for(&self, tag: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|(t, _)| *t == tag).count()
    }
}
