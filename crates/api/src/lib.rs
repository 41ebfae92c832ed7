#![deny(missing_docs)]
//! Response cache API contains the response cache module traits and the
//! basic types required to define the api of those traits.
//!
//! If you want a working cache, please see the respcache_core crate.

/// Boxed future type.
pub type BoxFut<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

pub mod config;

mod error;
pub use error::*;

mod key;
pub use key::*;

pub mod response_cache;
pub use response_cache::*;
