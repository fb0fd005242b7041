//! FOUNDRY - bounded, priority-aware worker pool
//!
//! A thread pool that orders pending work by priority, applies backpressure
//! at submission time, and returns a future-like handle for every accepted
//! unit of work. Two scaling policies are supported: a fixed worker count,
//! or elastic growth under load with idle workers retiring back toward a
//! floor.
//!
//! # Quick Start
//!
//! ```
//! use foundry::ThreadPool;
//!
//! # fn main() -> foundry::Result<()> {
//! let pool = ThreadPool::new(4)?;
//!
//! let handle = pool.submit(|| 2 + 2)?;
//! assert_eq!(handle.join()?, 4);
//!
//! pool.close();
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Priority scheduling**: higher levels dequeue first; equal levels
//!   drain in admission order
//! - **Backpressure**: a full queue blocks submitters up to a configurable
//!   admission timeout, then rejects through the returned handle
//! - **Elastic scaling**: workers are added while the backlog outruns the
//!   live count and retire after sitting idle past the pool timeout
//! - **Failure isolation**: a panicking task resolves its own handle with
//!   the panic message and never takes down a worker
//! - **File logging**: a dedicated-thread FIFO logger with timestamp
//!   prefixes and size-based rotation
//! - **Framed TCP**: blocking length-prefixed message streams, handy as
//!   pool workloads
//! - **Telemetry**: counters and latency percentiles (optional)

// Lint configuration
#![warn(missing_debug_implementations)]
#![allow(dead_code)]

pub mod config;
pub mod error;
pub mod logger;
pub mod net;
pub mod pool;
pub mod prelude;
pub mod telemetry;

// Re-export key types at crate root
pub use config::{ConfigBuilder, PoolConfig, WorkMode};
pub use error::{Error, Result};
pub use pool::{TaskHandle, ThreadPool};
