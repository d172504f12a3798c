//! Task abstraction.

use std::sync::Arc;

use crate::commands::MessageRef;
use crate::tasks::TaskContext;

/// Shared handle to a task implementation.
pub type TaskRef = Arc<dyn Task>;

/// A unit of periodic work driven by a [`TaskRunner`](crate::TaskRunner).
///
/// `tick` is called in a loop on the task's dedicated thread while the runner
/// is running. It should do one bounded round of work (poll the inbox, emit a
/// command, sleep an interval) and return; returning promptly is what makes
/// [`TaskRunner::stop`](crate::TaskRunner::stop) responsive.
pub trait Task: Send + Sync {
    /// Display name used in logs and bus registration.
    fn name(&self) -> &str;

    /// One bounded round of work.
    fn tick(&self, ctx: &TaskContext);

    /// Whether this task wants a bus callback registered for it.
    ///
    /// When true, the runner registers [`handle`](Self::handle) as the bus
    /// callback on start; it then runs on the bus worker pool, concurrently
    /// with `tick`.
    fn handles_messages(&self) -> bool {
        false
    }

    /// Push-delivery entry point; default does nothing.
    fn handle(&self, message: MessageRef) {
        let _ = message;
    }
}
