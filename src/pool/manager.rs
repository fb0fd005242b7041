use super::handle::{result_channel, TaskHandle};
use super::queue::TaskQueue;
use super::task::{panic_message, Task};
use super::worker::{Worker, WorkerId, WorkerPhase, WorkerSlot};
use crate::config::{PoolConfig, WorkMode};
use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[cfg(feature = "telemetry")]
use crate::telemetry::{Metrics, MetricsSnapshot};

/// Everything a worker needs a reference to. The single state lock guards
/// the registry and all mutable policy; the queue carries its own internal
/// lock so `len()` snapshots don't contend with admission waits.
pub(crate) struct PoolCore {
    pub(crate) queue: TaskQueue,
    pub(crate) state: Mutex<PoolState>,
    pub(crate) not_empty: Condvar,
    pub(crate) not_full: Condvar,
    pub(crate) mode: WorkMode,
    pub(crate) min_workers: usize,
    pub(crate) max_workers: usize,
    pub(crate) live_workers: AtomicUsize,
    next_worker_id: AtomicUsize,
    thread_name_prefix: String,
    stack_size: Option<usize>,
    #[cfg(feature = "telemetry")]
    pub(crate) metrics: Arc<Metrics>,
}

/// Mutable pool state; touched only under the state lock.
pub(crate) struct PoolState {
    pub(crate) closing: bool,
    pub(crate) max_queue_length: usize,
    pub(crate) admission_timeout: Duration,
    pub(crate) priority_level: usize,
    pub(crate) workers: HashMap<WorkerId, WorkerSlot>,
}

/// Bounded, priority-aware worker pool.
///
/// Work submitted through [`submit`](ThreadPool::submit) is ordered by
/// priority, executed by a managed set of OS threads, and observed through
/// the returned [`TaskHandle`]. Dropping the pool closes it, draining the
/// queue and joining every worker.
pub struct ThreadPool {
    core: Arc<PoolCore>,
}

impl ThreadPool {
    /// Fixed-mode pool with `workers` threads (capped at the hardware
    /// concurrency).
    pub fn new(workers: usize) -> Result<Self> {
        Self::with_mode(workers, WorkMode::Fixed)
    }

    pub fn with_mode(workers: usize, mode: WorkMode) -> Result<Self> {
        Self::with_config(PoolConfig {
            workers: Some(workers),
            mode,
            ..Default::default()
        })
    }

    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        let hardware = num_cpus::get();
        let requested = config.worker_threads();
        let floor = requested.min(hardware);
        let ceiling = match config.mode {
            WorkMode::Fixed => floor,
            WorkMode::Elastic => config
                .max_workers
                .unwrap_or(2 * requested)
                .min(hardware)
                .max(floor),
        };

        let core = Arc::new(PoolCore {
            queue: TaskQueue::new(),
            state: Mutex::new(PoolState {
                closing: false,
                max_queue_length: config.queue_capacity(),
                admission_timeout: config.admission_timeout,
                priority_level: config.priority_level,
                workers: HashMap::new(),
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            mode: config.mode,
            min_workers: floor,
            max_workers: ceiling,
            live_workers: AtomicUsize::new(0),
            next_worker_id: AtomicUsize::new(1),
            thread_name_prefix: config.thread_name_prefix.clone(),
            stack_size: config.stack_size,
            #[cfg(feature = "telemetry")]
            metrics: Arc::new(Metrics::new()),
        });

        {
            let mut state = core.state.lock();
            for _ in 0..floor {
                if let Err(e) = Self::spawn_worker(&core, &mut state) {
                    drop(state);
                    Self::close_core(&core);
                    return Err(e);
                }
            }
        }

        tracing::info!(
            mode = ?config.mode,
            workers = floor,
            ceiling,
            queue_capacity = config.queue_capacity(),
            timeout_ms = config.admission_timeout.as_millis() as u64,
            priority_level = config.priority_level,
            "pool started"
        );

        Ok(Self { core })
    }

    /// Submit a unit of work at the pool's configured priority level.
    ///
    /// Fails fast with [`Error::PoolClosed`] once `close()` has begun. When
    /// the queue is at capacity the call blocks up to the admission timeout;
    /// on expiry the returned handle is already resolved with
    /// [`Error::AdmissionTimeout`] and the work is dropped.
    pub fn submit<F, T>(&self, f: F) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.submit_inner(f, None)
    }

    /// Submit at an explicit priority; higher levels run first.
    pub fn submit_with_priority<F, T>(&self, f: F, priority: usize) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.submit_inner(f, Some(priority))
    }

    fn submit_inner<F, T>(&self, f: F, priority: Option<usize>) -> Result<TaskHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let core = &self.core;
        let (handle, sink) = result_channel();

        let mut state = core.state.lock();
        if state.closing {
            return Err(Error::PoolClosed);
        }

        if core.queue.len() >= state.max_queue_length {
            let timeout = state.admission_timeout;
            tracing::debug!(
                capacity = state.max_queue_length,
                "queue full, waiting for a free slot"
            );
            let timed_out = core.not_full.wait_for(&mut state, timeout).timed_out();

            // The pool may have started closing while this thread was
            // parked; admitting now would strand the task in a drained pool.
            if state.closing {
                return Err(Error::PoolClosed);
            }
            if timed_out {
                drop(state);
                tracing::warn!("admission timed out, dropping submission");
                #[cfg(feature = "telemetry")]
                core.metrics.record_rejected();
                sink.resolve(Err(Error::AdmissionTimeout));
                return Ok(handle);
            }
        }

        let level = priority.unwrap_or(state.priority_level);

        #[cfg(feature = "telemetry")]
        let metrics = Arc::clone(&core.metrics);

        let task = Task::new(move || {
            match std::panic::catch_unwind(AssertUnwindSafe(f)) {
                Ok(value) => {
                    #[cfg(feature = "telemetry")]
                    metrics.record_completed();
                    sink.resolve(Ok(value));
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::error!(%message, "task panicked");
                    #[cfg(feature = "telemetry")]
                    metrics.record_panicked();
                    sink.resolve(Err(Error::TaskPanicked(message)));
                }
            }
        });

        core.queue.enqueue(task, level);

        #[cfg(feature = "telemetry")]
        core.metrics.record_submitted();

        // Elastic growth: one extra worker when the backlog outruns the
        // current live count. The comparison is intentionally against the
        // live count, not a high-water mark.
        if core.mode == WorkMode::Elastic {
            let live = core.live_workers.load(Ordering::Acquire);
            if core.queue.len() > live && live < core.max_workers && live < num_cpus::get() {
                match Self::spawn_worker(core, &mut state) {
                    Ok(()) => {
                        tracing::debug!(
                            workers = live + 1,
                            ceiling = core.max_workers,
                            "grew worker set"
                        );
                    }
                    Err(e) => {
                        // Non-fatal: the task is already queued and will run
                        // on an existing worker.
                        tracing::warn!(error = %e, "elastic growth failed, task stays queued");
                    }
                }
            }
        }

        drop(state);
        core.not_empty.notify_one();
        Ok(handle)
    }

    /// Current live worker count (snapshot).
    pub fn worker_count(&self) -> usize {
        self.core.live_workers.load(Ordering::Acquire)
    }

    /// Current number of pending tasks (snapshot).
    pub fn queue_length(&self) -> usize {
        self.core.queue.len()
    }

    pub fn max_queue_length(&self) -> usize {
        self.core.state.lock().max_queue_length
    }

    /// Takes effect for subsequent submissions only.
    pub fn set_max_queue_length(&self, max: usize) {
        self.core.state.lock().max_queue_length = max;
    }

    pub fn admission_timeout(&self) -> Duration {
        self.core.state.lock().admission_timeout
    }

    /// Takes effect for subsequent submissions only.
    pub fn set_admission_timeout(&self, timeout: Duration) {
        self.core.state.lock().admission_timeout = timeout;
    }

    pub fn priority_level(&self) -> usize {
        self.core.state.lock().priority_level
    }

    /// Takes effect for subsequent submissions only.
    pub fn set_priority_level(&self, level: usize) {
        self.core.state.lock().priority_level = level;
    }

    #[cfg(feature = "telemetry")]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.core.metrics.snapshot()
    }

    /// Close the pool: refuse new submissions, drain the queue, join every
    /// worker. Idempotent; also runs on drop.
    pub fn close(&self) {
        Self::close_core(&self.core);
    }

    fn spawn_worker(core: &Arc<PoolCore>, state: &mut PoolState) -> Result<()> {
        let id = WorkerId(core.next_worker_id.fetch_add(1, Ordering::Relaxed));
        let worker = Worker::new(id, Arc::clone(core));

        let mut builder = thread::Builder::new().name(format!("{}-{}", core.thread_name_prefix, id.0));
        if let Some(stack_size) = core.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let thread = builder
            .spawn(move || worker.run())
            .map_err(|e| Error::spawn(e.to_string()))?;

        state.workers.insert(
            id,
            WorkerSlot {
                thread: Some(thread),
                phase: WorkerPhase::Idle,
            },
        );
        core.live_workers.fetch_add(1, Ordering::AcqRel);

        #[cfg(feature = "telemetry")]
        core.metrics.record_worker_spawned();

        Ok(())
    }

    fn close_core(core: &Arc<PoolCore>) {
        let (first_close, handles) = {
            let mut state = core.state.lock();
            let first_close = !state.closing;
            state.closing = true;
            if first_close {
                let running = state
                    .workers
                    .values()
                    .filter(|slot| slot.phase == WorkerPhase::Running)
                    .count();
                tracing::debug!(running, queued = core.queue.len(), "closing pool");
            }
            let handles: Vec<(WorkerId, thread::JoinHandle<()>)> = state
                .workers
                .iter_mut()
                .filter_map(|(id, slot)| slot.thread.take().map(|t| (*id, t)))
                .collect();
            (first_close, handles)
        };

        // Broadcast so every idle worker re-evaluates the closing flag and
        // every parked submitter fails fast.
        core.not_empty.notify_all();
        core.not_full.notify_all();

        for (id, thread) in handles {
            if thread.join().is_err() {
                tracing::error!(worker = id.0, "worker thread panicked");
            }
        }

        if first_close {
            tracing::info!("pool closed");
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("mode", &self.core.mode)
            .field("workers", &self.worker_count())
            .field("queued", &self.queue_length())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_pool_runs_tasks() {
        let pool = ThreadPool::new(2).unwrap();
        let handle = pool.submit(|| 21 * 2).unwrap();
        assert_eq!(handle.join().unwrap(), 42);
        pool.close();
    }

    #[test]
    fn test_submit_after_close_fails_fast() {
        let pool = ThreadPool::new(1).unwrap();
        pool.close();
        let result = pool.submit(|| ());
        assert!(matches!(result, Err(Error::PoolClosed)));
    }

    #[test]
    fn test_close_is_idempotent() {
        let pool = ThreadPool::new(2).unwrap();
        pool.close();
        pool.close();
        pool.close();
    }

    #[test]
    fn test_fixed_worker_count_capped_at_hardware() {
        let requested = 64;
        let pool = ThreadPool::new(requested).unwrap();
        assert_eq!(pool.worker_count(), requested.min(num_cpus::get()));
        pool.close();
    }

    #[test]
    fn test_setters_take_effect() {
        let pool = ThreadPool::new(1).unwrap();
        pool.set_max_queue_length(7);
        assert_eq!(pool.max_queue_length(), 7);
        pool.set_priority_level(9);
        assert_eq!(pool.priority_level(), 9);
        pool.set_admission_timeout(Duration::from_millis(10));
        assert_eq!(pool.admission_timeout(), Duration::from_millis(10));
        pool.close();
    }

    #[test]
    fn test_task_panic_is_isolated() {
        let pool = ThreadPool::new(1).unwrap();
        let bad = pool.submit(|| panic!("kaboom")).unwrap();
        match bad.join() {
            Err(Error::TaskPanicked(msg)) => assert!(msg.contains("kaboom")),
            other => panic!("expected TaskPanicked, got {:?}", other.map(|_: ()| ())),
        }

        // the worker survived and keeps serving
        let ok = pool.submit(|| 7).unwrap();
        assert_eq!(ok.join().unwrap(), 7);
        pool.close();
    }
}
