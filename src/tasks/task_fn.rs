//! Closure adapter for [`Task`].

use std::sync::Arc;

use crate::commands::MessageRef;
use crate::tasks::{Task, TaskContext, TaskRef};

type TickFn = Box<dyn Fn(&TaskContext) + Send + Sync + 'static>;
type HandlerFn = Box<dyn Fn(MessageRef) + Send + Sync + 'static>;

/// Wraps closures as a [`Task`] so small tasks don't need a struct.
///
/// # Example
/// ```rust
/// use busbar::TaskFn;
///
/// let task = TaskFn::arc("heartbeat", |ctx| {
///     let _ = ctx; // one round of work
///     std::thread::sleep(std::time::Duration::from_millis(50));
/// });
/// assert_eq!(task.name(), "heartbeat");
/// ```
pub struct TaskFn {
    name: String,
    tick: TickFn,
    handler: Option<HandlerFn>,
}

impl TaskFn {
    /// Creates a task from a tick closure.
    pub fn new<F>(name: impl Into<String>, tick: F) -> Self
    where
        F: Fn(&TaskContext) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            tick: Box::new(tick),
            handler: None,
        }
    }

    /// Shorthand for `Arc::new(TaskFn::new(..))`.
    pub fn arc<F>(name: impl Into<String>, tick: F) -> TaskRef
    where
        F: Fn(&TaskContext) + Send + Sync + 'static,
    {
        Arc::new(Self::new(name, tick))
    }

    /// Adds a push-delivery handler; the task then reports
    /// `handles_messages() == true`.
    pub fn with_handler<H>(mut self, handler: H) -> Self
    where
        H: Fn(MessageRef) + Send + Sync + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Finishes the builder into a [`TaskRef`].
    pub fn into_arc(self) -> TaskRef {
        Arc::new(self)
    }
}

impl Task for TaskFn {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&self, ctx: &TaskContext) {
        (self.tick)(ctx);
    }

    fn handles_messages(&self) -> bool {
        self.handler.is_some()
    }

    fn handle(&self, message: MessageRef) {
        if let Some(handler) = &self.handler {
            handler(message);
        }
    }
}
