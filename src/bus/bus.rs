//! # The bus proper: registry, broadcast protocol, shutdown.
//!
//! ## Architecture
//! ```text
//! send(sender, msg)
//!   │  one critical section (registry mutex):
//!   │    for every record ≠ sender:
//!   │      inbox.push(msg)                      ──► receive(id) pops (condvar)
//!   │      callback? backlog.push(msg)
//!   │                └─ not draining → schedule drain job
//!   │  lock released
//!   └─► drain jobs → WorkerPool → callback(msg) in send order, per subscriber
//! ```
//!
//! ## Rules
//! - **One critical section per send**: all inbox pushes for a send happen
//!   atomically, so all sends observe a single global order and each inbox
//!   holds exactly the sub-order addressed to it.
//! - **Callbacks never run under the registry lock** and are never invoked
//!   inline on the sender's thread. Capturing them under the lock and
//!   submitting after release is what lets a callback re-enter the bus
//!   (including `send`) without deadlocking, and keeps one slow subscriber
//!   from delaying delivery to others. Do not "simplify" this into a
//!   synchronous call.
//! - **Per-subscriber serialization**: each record has a callback backlog
//!   drained by at most one pool job at a time, so a subscriber observes
//!   callbacks in send order. Ordering across different subscribers is not
//!   guaranteed.
//! - **Shutdown**: wakes every blocked receiver; an inbox drained after
//!   shutdown still yields its queued messages, then `None`. Sends after
//!   shutdown are rejected — an accepted message could never be consumed.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use super::record::{Callback, TaskRecord};
use crate::commands::MessageRef;
use crate::config::BusConfig;
use crate::error::BusError;
use crate::ids::TaskId;
use crate::pool::WorkerPool;

struct Registry {
    records: HashMap<TaskId, TaskRecord>,
    running: bool,
}

struct Inner {
    registry: Mutex<Registry>,
    /// Guards "some inbox became non-empty OR the bus stopped OR a record
    /// disappeared" for blocked receivers.
    delivered: Condvar,
    pool: WorkerPool,
}

/// In-process broadcast bus for control tasks.
///
/// Cheap to clone: clones share the registry and worker pool. The pool is
/// joined when the last clone drops; queued callbacks still execute during
/// that drain, so shutting the bus down loses no in-flight message.
///
/// # Example
/// ```rust
/// use busbar::{Bus, Command, CommandPayload, TaskIdAllocator};
///
/// let ids = TaskIdAllocator::new();
/// let bus = Bus::new();
/// let sender = ids.allocate();
/// let receiver = ids.allocate();
/// bus.attach(sender, "sender")?;
/// bus.attach(receiver, "receiver")?;
///
/// let msg = Command::new(CommandPayload::Json(serde_json::json!({"k": 1}))).into_message();
/// bus.send(sender, msg)?;
///
/// assert!(bus.receive(receiver).is_some());
/// bus.shutdown();
/// assert!(bus.receive(receiver).is_none());
/// # Ok::<(), busbar::BusError>(())
/// ```
#[derive(Clone)]
pub struct Bus {
    inner: Arc<Inner>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    /// Creates a bus with the default worker pool size (hardware
    /// parallelism).
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    /// Creates a bus with an explicit configuration.
    pub fn with_config(cfg: BusConfig) -> Self {
        let pool = WorkerPool::new(cfg.workers);
        info!(target: "bus", workers = pool.worker_count(), "bus started");
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(Registry {
                    records: HashMap::new(),
                    running: true,
                }),
                delivered: Condvar::new(),
                pool,
            }),
        }
    }

    /// Registers a new task record with an empty inbox and no callback.
    ///
    /// Fails with [`BusError::DuplicateRegistration`] if the identity is
    /// already attached; the existing record is left untouched.
    pub fn attach(&self, id: TaskId, name: &str) -> Result<(), BusError> {
        let mut registry = self.inner.registry.lock();
        if let Some(existing) = registry.records.get(&id) {
            warn!(target: "bus", task = %id, name = %existing.name, "attach rejected: id already registered");
            return Err(BusError::DuplicateRegistration {
                id,
                name: existing.name.to_string(),
            });
        }
        registry.records.insert(id, TaskRecord::new(Arc::from(name)));
        info!(target: "bus", task = %id, name, "task attached");
        Ok(())
    }

    /// Removes the task record if present; idempotent.
    ///
    /// Wakes blocked receivers so a receiver whose record vanished returns
    /// `None` instead of waiting forever.
    pub fn detach(&self, id: TaskId) {
        let removed = {
            let mut registry = self.inner.registry.lock();
            registry.records.remove(&id)
        };
        if let Some(record) = removed {
            self.inner.delivered.notify_all();
            info!(target: "bus", task = %id, name = %record.name, "task detached");
        }
    }

    /// Replaces the callback for an attached task; no-op for unknown ids.
    pub fn register_callback(&self, id: TaskId, callback: Callback) {
        let mut registry = self.inner.registry.lock();
        match registry.records.get_mut(&id) {
            Some(record) => {
                record.callback = Some(callback);
                debug!(target: "bus", task = %id, "callback registered");
            }
            None => debug!(target: "bus", task = %id, "callback ignored: id not registered"),
        }
    }

    /// Broadcasts `message` to every attached task except the sender.
    ///
    /// The sender does not need to be attached; its display name in logs
    /// then falls back to a placeholder. After [`shutdown`](Self::shutdown)
    /// the send is rejected with [`BusError::ShutDown`] and nothing is
    /// enqueued.
    pub fn send(&self, sender: TaskId, message: MessageRef) -> Result<(), BusError> {
        let mut to_drain: Vec<TaskId> = Vec::new();
        {
            let mut registry = self.inner.registry.lock();
            if !registry.running {
                warn!(target: "bus", sender = %sender, "send rejected: bus shut down");
                return Err(BusError::ShutDown);
            }

            let sender_name = registry
                .records
                .get(&sender)
                .map_or_else(|| Arc::from("unknown"), |r| Arc::clone(&r.name));
            debug!(
                target: "bus",
                sender = %sender,
                name = %sender_name,
                kind = ?message.kind(),
                "broadcasting"
            );

            for (id, record) in registry.records.iter_mut() {
                if *id == sender {
                    continue;
                }
                record.inbox.push_back(Arc::clone(&message));
                if record.callback.is_some() {
                    record.backlog.push_back(Arc::clone(&message));
                    if !record.draining {
                        record.draining = true;
                        to_drain.push(*id);
                    }
                }
            }
        }
        self.inner.delivered.notify_all();

        for id in to_drain {
            let inner = Arc::clone(&self.inner);
            if let Err(err) = self.inner.pool.submit(move || drain_backlog(&inner, id)) {
                warn!(target: "bus", task = %id, error = %err, "callback dispatch rejected by pool");
                let mut registry = self.inner.registry.lock();
                if let Some(record) = registry.records.get_mut(&id) {
                    record.draining = false;
                }
            }
        }
        Ok(())
    }

    /// Blocks until the identified task's inbox is non-empty, then pops the
    /// oldest message.
    ///
    /// Returns `None` immediately for an unknown identity, and `None` once
    /// the bus has been shut down (or the task detached) with an empty
    /// inbox. Messages already queued at shutdown are still returned.
    pub fn receive(&self, id: TaskId) -> Option<MessageRef> {
        let mut registry = self.inner.registry.lock();
        if !registry.records.contains_key(&id) {
            warn!(target: "bus", task = %id, "receive for unknown id");
            return None;
        }
        loop {
            match registry.records.get_mut(&id) {
                // Detached while waiting.
                None => return None,
                Some(record) => {
                    if let Some(message) = record.inbox.pop_front() {
                        return Some(message);
                    }
                }
            }
            if !registry.running {
                return None;
            }
            self.inner.delivered.wait(&mut registry);
        }
    }

    /// Marks the bus as stopped and wakes every blocked receiver.
    /// Idempotent.
    ///
    /// Already-scheduled callbacks still run; the worker pool is joined when
    /// the last bus clone is dropped.
    pub fn shutdown(&self) {
        {
            let mut registry = self.inner.registry.lock();
            if !registry.running {
                return;
            }
            registry.running = false;
        }
        self.inner.delivered.notify_all();
        info!(target: "bus", "bus shut down");
    }

    /// True until [`shutdown`](Self::shutdown) has been called.
    pub fn is_running(&self) -> bool {
        self.inner.registry.lock().running
    }

    /// Number of currently attached tasks.
    pub fn attached_count(&self) -> usize {
        self.inner.registry.lock().records.len()
    }
}

/// Replays one record's callback backlog in send order.
///
/// Runs on the worker pool. At most one drain job exists per record (guarded
/// by `draining`), which is what serializes a subscriber's callback
/// executions; the callback itself is always invoked with the registry lock
/// released.
fn drain_backlog(inner: &Arc<Inner>, id: TaskId) {
    loop {
        let (callback, message) = {
            let mut registry = inner.registry.lock();
            let Some(record) = registry.records.get_mut(&id) else {
                // Detached mid-drain; remaining backlog died with the record.
                return;
            };
            match (&record.callback, record.backlog.pop_front()) {
                (Some(cb), Some(msg)) => (Arc::clone(cb), msg),
                _ => {
                    record.draining = false;
                    return;
                }
            }
        };

        // A panicking subscriber must not abort delivery of the rest of its
        // backlog.
        if panic::catch_unwind(AssertUnwindSafe(|| callback(message))).is_err() {
            warn!(target: "bus", task = %id, "subscriber callback panicked");
        }
    }
}
