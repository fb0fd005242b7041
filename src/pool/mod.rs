//! The worker pool: priority queue, manager, workers, and result handles.
//!
//! Submission flows caller → [`ThreadPool::submit`] → queue entry → an idle
//! worker → outcome written into the caller's [`TaskHandle`]. All policy
//! (capacity, admission timeout, scaling mode) lives in the manager.

pub mod handle;
pub mod manager;
pub mod queue;
pub mod task;
pub mod worker;

pub use handle::TaskHandle;
pub use manager::ThreadPool;
pub use task::TaskId;
