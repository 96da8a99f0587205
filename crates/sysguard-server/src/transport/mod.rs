//! Transport layer (raw TCP: request read, WebSocket upgrade, push loops).
//!
//! Exposes the single-read request codec, the upgrade handshake, the
//! per-connection push loop and the pool that supervises push loops.

pub mod codec;
pub mod handshake;
pub mod pool;
pub mod ws;
