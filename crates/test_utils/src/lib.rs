#![deny(missing_docs)]
//! Test utilities to help with testing the response cache.

pub mod fragment;
pub use fragment::*;

mod recorder;
pub use recorder::*;

/// Enable tracing with the RUST_LOG environment variable.
///
/// This is intended to be used in tests, so it defaults to DEBUG level.
pub fn enable_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::DEBUG.into())
                .from_env_lossy(),
        )
        .try_init();
}

/// Repeat a code block until it `break`s or a timeout elapses.
///
/// - `iter_check!(timeout_ms, sleep_ms, { ... })`
/// - `iter_check!(timeout_ms, { ... })` sleeps 1ms between iterations.
/// - `iter_check!({ ... })` times out after 1000ms.
///
/// Panics if the timeout elapses before the block breaks out of the loop.
#[macro_export]
macro_rules! iter_check {
    ($timeout_ms:expr, $sleep_ms:expr, $code:block) => {
        tokio::time::timeout(
            std::time::Duration::from_millis($timeout_ms),
            async {
                loop {
                    tokio::time::sleep(std::time::Duration::from_millis(
                        $sleep_ms,
                    ))
                    .await;
                    $code
                }
            },
        )
        .await
        .expect("iter_check timed out");
    };
    ($timeout_ms:expr, $code:block) => {
        $crate::iter_check!($timeout_ms, 1, $code)
    };
    ($code:block) => {
        $crate::iter_check!(1000, $code)
    };
}
