//! Internal telemetry for the parking pipeline.
//!
//! Metrics are collected in-memory on atomics and periodically logged as a
//! snapshot; no external metrics system is involved.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::*;
pub use tracing_setup::*;
