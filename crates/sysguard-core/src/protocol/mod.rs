//! Protocol modules (HTTP request/response + WebSocket push frames).
//!
//! - `http`: single-read request parsing, prefix routing, response heads.
//! - `ws`: upgrade accept key and server-to-client frame headers.
//!
//! All parsers are panic-free: malformed input is reported as `SysGuardError`
//! instead of panicking or indexing raw buffers.

pub mod http;
pub mod ws;
