//! # Fixed-size worker pool for deferred work.
//!
//! The pool exists so that subscriber callbacks run off the sender's call
//! path and outside the bus registry lock: the bus captures bound closures
//! while holding its lock, releases it, and hands the closures here.
//!
//! See [`WorkerPool`] for the queue/worker protocol and [`WorkHandle`] for
//! awaiting completion of a submitted item.

mod handle;
mod worker_pool;

pub use handle::{WorkHandle, WorkOutcome};
pub use worker_pool::WorkerPool;
