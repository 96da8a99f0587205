//! Top-level facade crate for SysGuard.
//!
//! Re-exports the wire primitives and the server library so users can depend on a single crate.

pub mod core {
    pub use sysguard_core::*;
}

pub mod server {
    pub use sysguard_server::*;
}
