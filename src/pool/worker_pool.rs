//! # Worker pool executing short-lived deferred closures.
//!
//! ## Architecture
//! ```text
//! submit(job) ──► [ FIFO queue ] ──► worker 0 ─┐
//!    │               (mutex)        worker 1 ─┼─► job() under catch_unwind
//!    └─ RejectedSubmission           ...      │
//!       once stopping               worker N ─┘
//! ```
//!
//! ## Rules
//! - **States**: `Running → Stopping → Stopped`, forward-only. `submit` is
//!   only valid while `Running`.
//! - **Drain on stop**: workers finish every item queued before they observed
//!   the stop signal, then exit; `shutdown` joins them all.
//! - **Panic isolation**: a panicking job is caught, reported, and recorded
//!   as [`WorkOutcome::Panicked`]; the worker continues with the next item.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error};

use super::handle::{HandleState, WorkHandle, WorkOutcome};
use crate::error::PoolError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Running,
    Stopping,
    Stopped,
}

/// One deferred unit of work, owned by the queue until a worker claims it.
struct WorkItem {
    job: Box<dyn FnOnce() + Send + 'static>,
    state: Arc<HandleState>,
}

struct QueueState {
    items: VecDeque<WorkItem>,
    phase: Phase,
}

struct Shared {
    queue: Mutex<QueueState>,
    available: Condvar,
}

/// Fixed-size pool of worker threads consuming a shared FIFO queue.
///
/// Used by [`Bus`](crate::Bus) to invoke subscriber callbacks off the
/// sender's call path; usable standalone for any deferred closure.
pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl WorkerPool {
    /// Spawns a pool with the given number of workers.
    ///
    /// `0` is a sentinel for "available hardware parallelism".
    pub fn new(workers: usize) -> Self {
        let worker_count = match workers {
            0 => thread::available_parallelism().map_or(1, |n| n.get()),
            n => n,
        };

        let shared = Arc::new(Shared {
            queue: Mutex::new(QueueState {
                items: VecDeque::new(),
                phase: Phase::Running,
            }),
            available: Condvar::new(),
        });

        let mut handles = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let shared = Arc::clone(&shared);
            let builder = thread::Builder::new().name(format!("pool-worker-{index}"));
            match builder.spawn(move || worker_loop(index, &shared)) {
                Ok(handle) => handles.push(handle),
                Err(err) => error!(target: "pool", worker = index, error = %err, "failed to spawn worker"),
            }
        }
        debug!(target: "pool", workers = handles.len(), "worker pool started");

        Self {
            shared,
            workers: Mutex::new(handles),
            worker_count,
        }
    }

    /// Number of worker threads the pool was built with.
    #[inline]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Appends `job` to the queue and wakes one waiting worker.
    ///
    /// Returns a [`WorkHandle`] that can be used to await completion, or
    /// [`PoolError::RejectedSubmission`] if the pool has begun stopping —
    /// in that case the job was not queued and will never run.
    pub fn submit<F>(&self, job: F) -> Result<WorkHandle, PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let state = HandleState::new();
        {
            let mut queue = self.shared.queue.lock();
            if queue.phase != Phase::Running {
                return Err(PoolError::RejectedSubmission);
            }
            queue.items.push_back(WorkItem {
                job: Box::new(job),
                state: Arc::clone(&state),
            });
        }
        self.shared.available.notify_one();
        Ok(WorkHandle::new(state))
    }

    /// Stops the pool and joins every worker.
    ///
    /// Workers drain and execute all items queued before the stop signal,
    /// then exit; this call blocks until the last one has joined. Idempotent.
    ///
    /// A worker thread can itself end up here, when a job it executes drops
    /// the last handle to an owner of the pool. A thread cannot join itself,
    /// so that worker's handle is dropped instead; the thread exits on its
    /// own once it observes the stop signal.
    pub fn shutdown(&self) {
        {
            let mut queue = self.shared.queue.lock();
            if queue.phase == Phase::Running {
                queue.phase = Phase::Stopping;
            }
        }
        self.shared.available.notify_all();

        let current = thread::current().id();
        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            if handle.thread().id() == current {
                continue;
            }
            let _ = handle.join();
        }

        let mut queue = self.shared.queue.lock();
        queue.phase = Phase::Stopped;
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(index: usize, shared: &Shared) {
    loop {
        let item = {
            let mut queue = shared.queue.lock();
            loop {
                if let Some(item) = queue.items.pop_front() {
                    break item;
                }
                if queue.phase != Phase::Running {
                    debug!(target: "pool", worker = index, "worker exiting");
                    return;
                }
                shared.available.wait(&mut queue);
            }
        };

        // The job runs outside the queue lock; a panic here is the job's
        // fault, not the pool's, and must not take the worker down.
        let WorkItem { job, state } = item;
        match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(()) => state.finish(WorkOutcome::Completed),
            Err(payload) => {
                error!(
                    target: "pool",
                    worker = index,
                    panic = %panic_message(payload.as_ref()),
                    "work item panicked"
                );
                state.finish(WorkOutcome::Panicked);
            }
        }
    }
}

/// Best-effort extraction of a panic payload message.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
