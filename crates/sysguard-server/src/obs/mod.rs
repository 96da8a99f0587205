//! Lightweight in-process counters.
//!
//! Stored as atomics, rendered in Prometheus text format and logged when the
//! server shuts down.

pub mod metrics;
