//! Error types used by the bus and the worker pool.
//!
//! This module defines two main error enums:
//!
//! - [`BusError`] — recoverable conditions reported by [`Bus`](crate::Bus)
//!   registry operations.
//! - [`PoolError`] — recoverable conditions reported by
//!   [`WorkerPool`](crate::WorkerPool).
//!
//! Both provide `as_label()` returning a short stable snake_case label for
//! logs and metrics. Every condition here is resolved at the call that raised
//! it; nothing crosses the bus/pool boundary as a panic. Collaborator-side
//! conditions (malformed payloads, storage faults) live next to their owners:
//! [`PayloadError`](crate::PayloadError) and
//! [`StorageError`](crate::StorageError).

use thiserror::Error;

use crate::ids::TaskId;

/// # Errors produced by bus registry operations.
///
/// These are recoverable: the registry is left unchanged and the caller
/// decides how to proceed (pick another identity, stop sending, ...).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// `attach` was called with an identity that is already registered.
    ///
    /// The existing record is left untouched; `name` is the display name it
    /// was registered under.
    #[error("task id {id} is already attached as {name:?}")]
    DuplicateRegistration {
        /// The identity that was already present.
        id: TaskId,
        /// Display name of the existing registration.
        name: String,
    },

    /// `send` was called after [`Bus::shutdown`](crate::Bus::shutdown).
    ///
    /// Nothing was enqueued — a message accepted here could never be
    /// consumed, since no receiver will be woken again.
    #[error("bus has been shut down")]
    ShutDown,
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::DuplicateRegistration { .. } => "bus_duplicate_registration",
            BusError::ShutDown => "bus_shut_down",
        }
    }
}

/// # Errors produced by the worker pool.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// `submit` was called after the pool began stopping.
    ///
    /// The work item was not queued and will never execute.
    #[error("submission rejected: worker pool is stopping")]
    RejectedSubmission,
}

impl PoolError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolError::RejectedSubmission => "pool_rejected_submission",
        }
    }
}
