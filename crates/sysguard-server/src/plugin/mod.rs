//! Metrics source capability.
//!
//! The protocol layer only sees `MetricsSource`. How the metrics are produced
//! (a dynamically loaded native plugin, or an in-process stub in tests) is
//! decided by whoever builds `AppState`.

pub mod native;

use async_trait::async_trait;

use sysguard_core::error::Result;

pub use native::NativePlugin;

/// Anything that can produce one JSON metrics document per call.
///
/// Implementations must be safe to call concurrently: every open push loop and
/// every `/health` request calls `fetch` independently.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;

    /// Produce a fresh JSON document. An error is never fatal to the server.
    async fn fetch(&self) -> Result<String>;
}
