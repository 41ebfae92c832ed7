#![deny(missing_docs)]
//! Asynchronous response-correlation cache.
//!
//! Collects the fragments of multi-part device responses, keyed by
//! device, channel and sequence number, and delivers the assembled result
//! to the single consumer waiting for it, on completion or on timeout.

use respcache_api::{config::Config, *};

/// Construct the production-ready default factory.
///
/// The default response cache is [factories::CoreResponseCacheFactory].
pub fn default_factory() -> DynResponseCacheFactory {
    factories::CoreResponseCacheFactory::create()
}

/// Construct a config populated with the defaults of [default_factory].
pub fn default_config() -> CacheResult<Config> {
    let mut config = Config::default();
    default_factory().default_config(&mut config)?;
    Ok(config)
}

pub mod factories;
