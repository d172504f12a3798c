//! # Tasks: the unit of periodic work driven over the bus.
//!
//! ## Architecture
//! ```text
//! TaskRunner::new(task, &allocator, bus)      (Created: id allocated, no thread)
//!        │ attach + start
//!        ▼
//! dedicated OS thread                         (Running)
//!   loop while running flag:
//!     task.tick(&ctx)        ── ctx.send / ctx.recv ──► Bus
//!        │ stop(): clear flag → detach → join
//!        ▼
//! (Stopped: terminal, no restart)
//! ```
//!
//! ## Rules
//! - Stopping is cooperative: the flag is checked between `tick` calls, so a
//!   `tick` that blocks forever outside `ctx.recv()` cannot be stopped.
//!   Detaching from the bus is what unblocks a `tick` parked in `ctx.recv()`.
//! - A runner drives exactly one task on exactly one thread; dropping the
//!   runner stops it.

mod context;
mod runner;
mod task;
mod task_fn;

pub use context::TaskContext;
pub use runner::{TaskRunner, TaskState};
pub use task::{Task, TaskRef};
pub use task_fn::TaskFn;
