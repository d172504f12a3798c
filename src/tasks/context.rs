//! Per-task execution context.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::bus::Bus;
use crate::commands::MessageRef;
use crate::error::BusError;
use crate::ids::TaskId;

/// Everything a `tick` needs: identity, the bus, and the cooperative stop
/// flag.
///
/// Handed by reference into [`Task::tick`](crate::Task::tick). Long-running
/// ticks should check [`is_running`](Self::is_running) between work items.
#[derive(Clone)]
pub struct TaskContext {
    id: TaskId,
    name: Arc<str>,
    bus: Bus,
    running: Arc<AtomicBool>,
}

impl TaskContext {
    pub(crate) fn new(id: TaskId, name: Arc<str>, bus: Bus, running: Arc<AtomicBool>) -> Self {
        Self {
            id,
            name,
            bus,
            running,
        }
    }

    /// The task's bus identity.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The task's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// False once the runner has been asked to stop.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Broadcasts a message on behalf of this task.
    pub fn send(&self, message: MessageRef) -> Result<(), BusError> {
        self.bus.send(self.id, message)
    }

    /// Blocks until a message addressed to this task arrives.
    ///
    /// Returns `None` once the task is detached or the bus shuts down; a
    /// `tick` parked here is unblocked by
    /// [`TaskRunner::stop`](crate::TaskRunner::stop), which detaches before
    /// joining.
    pub fn recv(&self) -> Option<MessageRef> {
        self.bus.receive(self.id)
    }
}
