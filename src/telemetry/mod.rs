//! Pool observability, compiled in with the `telemetry` feature.
//!
//! Counters for the submission and execution paths plus an execution-latency
//! histogram, exposed as point-in-time snapshots through
//! `ThreadPool::metrics`.

#[cfg(feature = "telemetry")]
pub mod metrics;

#[cfg(feature = "telemetry")]
pub use metrics::{Metrics, MetricsSnapshot};
