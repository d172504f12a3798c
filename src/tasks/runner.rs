//! Task lifecycle driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::bus::Bus;
use crate::error::BusError;
use crate::ids::{TaskId, TaskIdAllocator};
use crate::tasks::{TaskContext, TaskRef};

/// Lifecycle of a [`TaskRunner`]. Forward-only; a stopped runner cannot be
/// restarted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    /// Identity allocated, no thread yet.
    Created,
    /// Dedicated thread looping on `tick`.
    Running,
    /// Thread joined; terminal.
    Stopped,
}

/// Drives one [`Task`](crate::Task) on its own OS thread.
///
/// Construction allocates a fresh identity but neither attaches to the bus
/// nor spawns; [`attach`](Self::attach) and [`start`](Self::start) do that
/// explicitly. [`stop`](Self::stop) clears the running flag, detaches from
/// the bus (unblocking a `tick` parked in `recv`), and joins the thread.
///
/// ### Notes
/// - Stopping is cooperative: a `tick` that never returns (other than by
///   blocking in `recv`) cannot be stopped. Keeping ticks bounded is the
///   caller's obligation.
/// - `Drop` calls `stop`, so a runner going out of scope does not leave a
///   detached thread behind.
pub struct TaskRunner {
    task: TaskRef,
    id: TaskId,
    bus: Bus,
    running: Arc<AtomicBool>,
    state: Mutex<TaskState>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl TaskRunner {
    /// Allocates a fresh identity for `task`; no thread, no bus attachment.
    pub fn new(task: TaskRef, ids: &TaskIdAllocator, bus: Bus) -> Self {
        let id = ids.allocate();
        Self {
            task,
            id,
            bus,
            running: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(TaskState::Created),
            thread: Mutex::new(None),
        }
    }

    /// The runner's bus identity.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The task's display name.
    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TaskState {
        *self.state.lock()
    }

    /// Registers this runner's identity with the bus.
    pub fn attach(&self) -> Result<(), BusError> {
        self.bus.attach(self.id, self.task.name())
    }

    /// Spawns the dedicated thread and begins ticking.
    ///
    /// If the task handles messages, its `handle` is registered as the bus
    /// callback first, so no broadcast sent after `start` returns can be
    /// missed. Starting twice (or after stop) is a logged no-op.
    ///
    /// The state lock is held from the `Created` check through the spawn:
    /// a concurrent `stop` cannot slip between the state transition and the
    /// thread coming into existence, which would leave an unjoinable thread
    /// behind a `Stopped` runner.
    pub fn start(&self) {
        let mut state = self.state.lock();
        if *state != TaskState::Created {
            warn!(target: "tasks", task = %self.id, name = self.task.name(), state = ?*state, "start ignored");
            return;
        }

        if self.task.handles_messages() {
            let task = Arc::clone(&self.task);
            self.bus
                .register_callback(self.id, Arc::new(move |msg| task.handle(msg)));
        }

        self.running.store(true, Ordering::SeqCst);
        let ctx = TaskContext::new(
            self.id,
            Arc::from(self.task.name()),
            self.bus.clone(),
            Arc::clone(&self.running),
        );
        let task = Arc::clone(&self.task);
        let spawned = thread::Builder::new()
            .name(format!("task-{}", self.task.name()))
            .spawn(move || {
                info!(target: "tasks", task = %ctx.id(), name = ctx.name(), "task started");
                while ctx.is_running() {
                    task.tick(&ctx);
                }
                info!(target: "tasks", task = %ctx.id(), name = ctx.name(), "task loop exited");
            });

        match spawned {
            Ok(handle) => {
                *self.thread.lock() = Some(handle);
                *state = TaskState::Running;
            }
            Err(err) => {
                error!(target: "tasks", task = %self.id, name = self.task.name(), error = %err, "thread spawn failed");
                self.running.store(false, Ordering::SeqCst);
                *state = TaskState::Stopped;
            }
        }
    }

    /// Stops the task: clears the flag, detaches from the bus, joins.
    /// Idempotent; also runs on drop.
    pub fn stop(&self) {
        {
            let mut state = self.state.lock();
            match *state {
                TaskState::Running => *state = TaskState::Stopped,
                TaskState::Created => {
                    *state = TaskState::Stopped;
                    self.bus.detach(self.id);
                    return;
                }
                TaskState::Stopped => return,
            }
        }

        self.running.store(false, Ordering::SeqCst);
        // Detach before joining: this is what wakes a tick blocked in recv.
        self.bus.detach(self.id);
        self.join_thread();
        info!(target: "tasks", task = %self.id, name = self.task.name(), "task stopped");
    }

    /// Waits for the task thread to exit without detaching or clearing the
    /// running flag; for tasks whose tick ends the loop on its own.
    pub fn join(&self) {
        self.join_thread();
    }

    fn join_thread(&self) {
        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!(target: "tasks", task = %self.id, name = self.task.name(), "task thread panicked");
            }
        }
    }
}

impl Drop for TaskRunner {
    fn drop(&mut self) {
        self.stop();
    }
}
