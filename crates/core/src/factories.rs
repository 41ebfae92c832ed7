//! Factories for generating instances of response cache modules.

pub mod core_response_cache;
pub use core_response_cache::CoreResponseCacheFactory;
