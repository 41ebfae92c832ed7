//! Response cache error types.

use crate::CorrelationKey;
use std::sync::Arc;

/// The response cache error type.
///
/// Ingest and waiter registration never fail. This type covers the
/// fallible edges: configuration handling and the async
/// [await_response](crate::ResponseCache::await_response) bridge.
///
/// It is `Clone` so results can be shared between futures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CacheError {
    /// A config could not be converted to or from json.
    #[error("config {op} failed: {src}")]
    ConfigJson {
        /// What was being done, e.g. "parse" or "render".
        op: &'static str,

        /// The serde_json failure.
        #[source]
        src: Arc<serde_json::Error>,
    },

    /// Two module configs claimed the same top-level property.
    #[error("refusing to overwrite conflicting module name: {name}")]
    ConfigConflict {
        /// The property both modules tried to set.
        name: String,
    },

    /// A module config has a value the module cannot run with.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// Which setting is wrong and why.
        reason: &'static str,
    },

    /// A waiter was dropped without being called: it was replaced, timed
    /// out with nothing collected, or the cache went away.
    #[error("waiter abandoned: {key}")]
    WaiterAbandoned {
        /// The key the waiter was registered for.
        key: CorrelationKey,
    },
}

impl CacheError {
    pub(crate) fn config_json(
        op: &'static str,
        src: serde_json::Error,
    ) -> Self {
        Self::ConfigJson {
            op,
            src: Arc::new(src),
        }
    }
}

/// The response cache result type.
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            "waiter abandoned: 4:dev1/3:ch1/7",
            CacheError::WaiterAbandoned {
                key: CorrelationKey::new("dev1", "ch1", 7),
            }
            .to_string(),
        );
        assert_eq!(
            "invalid config: sweepIntervalMs must be non-zero",
            CacheError::InvalidConfig {
                reason: "sweepIntervalMs must be non-zero",
            }
            .to_string(),
        );
    }

    #[test]
    fn json_source_is_reachable() {
        use std::error::Error;

        let json_err =
            serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CacheError::config_json("parse", json_err);
        assert!(err.to_string().starts_with("config parse failed: "));
        assert!(err.source().is_some());

        let err = CacheError::ConfigConflict {
            name: "modOne".into(),
        };
        assert!(err.source().is_none());
    }

    #[test]
    fn ensure_cache_error_type_is_send_and_sync() {
        fn ensure<T: std::fmt::Display + Send + Sync + Clone>(_t: T) {}
        ensure(CacheError::InvalidConfig { reason: "bla" });
    }
}
