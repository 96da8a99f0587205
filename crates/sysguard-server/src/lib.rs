//! SysGuard server library entry.
//!
//! This crate wires the config, metrics plugin bridge, router, asset and
//! metrics responders, and WebSocket push sessions into one server. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod assets;
pub mod config;
pub mod obs;
pub mod ops;
pub mod plugin;
pub mod router;
pub mod server;
pub mod shutdown;
pub mod transport;

pub use app_state::AppState;
pub use plugin::{MetricsSource, NativePlugin};
pub use server::Server;
