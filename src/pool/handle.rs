//! Caller-side result retrieval.
//!
//! A [`TaskHandle`] and its private `ResultSink` share a single-assignment
//! cell: the executing worker writes exactly once, the submitter reads after
//! resolution. The cell is a mutex-guarded slot with a condvar, so a blocked
//! reader wakes the moment the outcome lands.

use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Cell<T> {
    slot: Mutex<Option<Result<T>>>,
    resolved: Condvar,
}

/// Create a connected handle/sink pair for one task.
pub(crate) fn result_channel<T>() -> (TaskHandle<T>, ResultSink<T>) {
    let cell = Arc::new(Cell {
        slot: Mutex::new(None),
        resolved: Condvar::new(),
    });
    (
        TaskHandle {
            cell: Arc::clone(&cell),
        },
        ResultSink { cell, done: false },
    )
}

/// Future-like handle returned by `submit`.
///
/// Resolves once, to the task's return value or its propagated failure.
pub struct TaskHandle<T> {
    cell: Arc<Cell<T>>,
}

impl<T> TaskHandle<T> {
    /// Block until the task's outcome is available.
    pub fn wait(&self) {
        let mut slot = self.cell.slot.lock();
        while slot.is_none() {
            self.cell.resolved.wait(&mut slot);
        }
    }

    /// Block up to `timeout`; returns whether the handle resolved in time.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut slot = self.cell.slot.lock();
        while slot.is_none() {
            if self.cell.resolved.wait_until(&mut slot, deadline).timed_out() {
                return slot.is_some();
            }
        }
        true
    }

    /// Non-blocking check.
    pub fn is_resolved(&self) -> bool {
        self.cell.slot.lock().is_some()
    }

    /// Block until resolution and take the outcome.
    pub fn join(self) -> Result<T> {
        let mut slot = self.cell.slot.lock();
        while slot.is_none() {
            self.cell.resolved.wait(&mut slot);
        }
        slot.take().expect("resolved handle lost its outcome")
    }
}

impl<T> std::fmt::Debug for TaskHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// Worker-side writer. Single assignment; consumed by `resolve`.
pub(crate) struct ResultSink<T> {
    cell: Arc<Cell<T>>,
    done: bool,
}

impl<T> ResultSink<T> {
    pub fn resolve(mut self, outcome: Result<T>) {
        self.done = true;
        let mut slot = self.cell.slot.lock();
        if slot.is_none() {
            *slot = Some(outcome);
        }
        drop(slot);
        self.cell.resolved.notify_all();
    }
}

impl<T> Drop for ResultSink<T> {
    fn drop(&mut self) {
        // A sink dropped without resolving means the pool lost the task
        // (e.g. teardown with work in flight). Fail the handle rather than
        // leaving the caller blocked forever.
        if !self.done {
            let mut slot = self.cell.slot.lock();
            if slot.is_none() {
                *slot = Some(Err(Error::TaskDropped));
            }
            drop(slot);
            self.cell.resolved.notify_all();
        }
    }
}
