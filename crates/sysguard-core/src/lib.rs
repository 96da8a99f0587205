//! SysGuard core: transport-agnostic protocol primitives and error types.
//!
//! This crate defines the wire-level contracts shared by the server and its
//! tests: request classification, response heads, WebSocket frame headers and
//! the upgrade accept key. It intentionally carries no runtime dependencies so
//! it can be exercised against plain byte slices.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `SysGuardError`/`Result` so a hostile
//! request can only ever close its own connection.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorClass, Result, SysGuardError};
