//! Completion handles for submitted work items.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

/// How a work item finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkOutcome {
    /// The item ran to completion.
    Completed,
    /// The item panicked; the panic was caught at the worker's execution
    /// boundary and did not affect other queued items.
    Panicked,
}

/// Shared completion slot between a [`WorkHandle`] and the executing worker.
pub(crate) struct HandleState {
    outcome: Mutex<Option<WorkOutcome>>,
    done: Condvar,
}

impl HandleState {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(None),
            done: Condvar::new(),
        })
    }

    /// Records the outcome and wakes every waiter. Called exactly once.
    pub(crate) fn finish(&self, outcome: WorkOutcome) {
        let mut slot = self.outcome.lock();
        *slot = Some(outcome);
        self.done.notify_all();
    }
}

/// Handle to a submitted work item.
///
/// Returned by [`WorkerPool::submit`](crate::WorkerPool::submit). Dropping
/// the handle does not cancel the item; it merely gives up the ability to
/// await it.
pub struct WorkHandle {
    state: Arc<HandleState>,
}

impl std::fmt::Debug for WorkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkHandle").finish_non_exhaustive()
    }
}

impl WorkHandle {
    pub(crate) fn new(state: Arc<HandleState>) -> Self {
        Self { state }
    }

    /// Blocks until the item has been executed and returns its outcome.
    ///
    /// Items already queued when the pool starts stopping are still drained,
    /// so `wait` on an accepted item always returns.
    pub fn wait(&self) -> WorkOutcome {
        let mut slot = self.state.outcome.lock();
        loop {
            if let Some(outcome) = *slot {
                return outcome;
            }
            self.state.done.wait(&mut slot);
        }
    }

    /// Returns the outcome if the item has already run, without blocking.
    pub fn try_wait(&self) -> Option<WorkOutcome> {
        *self.state.outcome.lock()
    }
}
