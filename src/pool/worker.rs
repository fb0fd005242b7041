// worker thread loop and registry types
use super::manager::PoolCore;
use crate::config::WorkMode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Per-pool worker identifier, allocated from the pool's own atomic counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct WorkerId(pub(crate) usize);

/// What a worker is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerPhase {
    Idle,
    Running,
    Retired,
}

/// Registry slot. The join handle stays here until `close()` takes it, even
/// after the worker retires, so every thread is joined deterministically.
pub(crate) struct WorkerSlot {
    pub(crate) thread: Option<JoinHandle<()>>,
    pub(crate) phase: WorkerPhase,
}

pub(crate) struct Worker {
    id: WorkerId,
    core: Arc<PoolCore>,
}

impl Worker {
    pub fn new(id: WorkerId, core: Arc<PoolCore>) -> Self {
        Self { id, core }
    }

    // main loop
    pub fn run(self) {
        let core = &self.core;

        loop {
            let task = {
                let mut state = core.state.lock();
                loop {
                    if let Some(task) = core.queue.dequeue() {
                        if let Some(slot) = state.workers.get_mut(&self.id) {
                            slot.phase = WorkerPhase::Running;
                        }
                        break Some(task);
                    }

                    // queue empty; drain is complete once the pool is closing
                    if state.closing {
                        break None;
                    }

                    if let Some(slot) = state.workers.get_mut(&self.id) {
                        slot.phase = WorkerPhase::Idle;
                    }

                    match core.mode {
                        WorkMode::Fixed => core.not_empty.wait(&mut state),
                        WorkMode::Elastic => {
                            let timeout = state.admission_timeout;
                            if core.not_empty.wait_for(&mut state, timeout).timed_out() {
                                if !state.closing
                                    && core.live_workers.load(Ordering::Acquire)
                                        > core.min_workers
                                {
                                    self.retire(&mut state);
                                    return;
                                }
                                // At the floor: wait plainly for the next
                                // signal instead of retiring. Every wake
                                // re-evaluates queue and closing above.
                                if !state.closing {
                                    core.not_empty.wait(&mut state);
                                }
                            }
                        }
                    }
                }
            };

            match task {
                Some(task) => {
                    // slot freed; execution happens outside the lock
                    core.not_full.notify_all();

                    #[cfg(feature = "telemetry")]
                    let start = std::time::Instant::now();

                    task.execute();

                    #[cfg(feature = "telemetry")]
                    core.metrics
                        .record_execution(start.elapsed().as_nanos() as u64);
                }
                None => break,
            }
        }

        let mut state = core.state.lock();
        if let Some(slot) = state.workers.get_mut(&self.id) {
            slot.phase = WorkerPhase::Retired;
        }
        core.live_workers.fetch_sub(1, Ordering::AcqRel);
    }

    fn retire(&self, state: &mut super::manager::PoolState) {
        if let Some(slot) = state.workers.get_mut(&self.id) {
            slot.phase = WorkerPhase::Retired;
        }
        let remaining = self.core.live_workers.fetch_sub(1, Ordering::AcqRel) - 1;
        tracing::debug!(worker = self.id.0, remaining, "idle timeout reached, retiring");

        #[cfg(feature = "telemetry")]
        self.core.metrics.record_worker_retired();
    }
}
