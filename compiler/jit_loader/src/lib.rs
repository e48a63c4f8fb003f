//! JIT Loader - patch-on-load interception.
//!
//! The [`Interceptor`] sits between the autoloader and the file system:
//! it picks the file for a class, decides whether it should be patched,
//! runs the [`Patchers`](jit_patch::Patchers) chain and keeps the result in a
//! [`PatchCache`] mirrored under the cache directory.
//!
//! # Tracing
//!
//! Enable with `RUST_LOG=jit_loader=debug` (or `jit_patch=trace` for
//! per-patcher output) after calling [`init_tracing`].

mod cache;
mod config;
mod error;
mod interceptor;

use std::sync::Once;

pub use cache::PatchCache;
pub use config::InterceptorConfig;
pub use error::LoaderError;
pub use interceptor::Interceptor;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
