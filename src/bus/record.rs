//! Per-task registry records.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::commands::MessageRef;

/// Subscriber callback invoked (on the worker pool) for each delivered
/// message.
pub type Callback = Arc<dyn Fn(MessageRef) + Send + Sync + 'static>;

/// Registry entry for one attached task. Exclusively owned by the bus
/// registry; created on attach, destroyed on detach or teardown.
pub(crate) struct TaskRecord {
    /// Display name for diagnostics.
    pub(crate) name: Arc<str>,
    /// Private FIFO inbox consumed by `receive`.
    pub(crate) inbox: VecDeque<MessageRef>,
    /// Optional subscriber callback.
    pub(crate) callback: Option<Callback>,
    /// Messages awaiting callback delivery, in send order.
    ///
    /// Kept separate from `inbox` so that polling and callback consumption
    /// are independent, exactly-once each.
    pub(crate) backlog: VecDeque<MessageRef>,
    /// True while a drain job for `backlog` is queued or running; at most
    /// one exists per record, which serializes callback execution.
    pub(crate) draining: bool,
}

impl TaskRecord {
    pub(crate) fn new(name: Arc<str>) -> Self {
        Self {
            name,
            inbox: VecDeque::new(),
            callback: None,
            backlog: VecDeque::new(),
            draining: false,
        }
    }
}
