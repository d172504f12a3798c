//! # Configuration: bus tuning and a persistent key-value store.
//!
//! Two independent pieces live here:
//!
//! - [`BusConfig`] — the explicit construction-time tuning handed to
//!   [`Bus::with_config`](crate::Bus::with_config). The core never reads
//!   configuration on its own; whoever wires the system decides where the
//!   values come from.
//! - [`ConfigStore`] over a [`Storage`] backend — a flat string-keyed store
//!   with JSON file persistence ([`JsonStorage`]), for the application-level
//!   settings around the bus.

mod json;
mod store;

pub use json::JsonStorage;
pub use store::{ConfigStore, Storage, StorageError};

/// Construction-time tuning for [`Bus`](crate::Bus).
///
/// ### Notes
/// - `workers == 0` is a sentinel: size the pool to the available hardware
///   parallelism.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusConfig {
    /// Worker pool size; `0` means hardware parallelism.
    pub workers: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { workers: 0 }
    }
}

impl BusConfig {
    /// Sets an explicit worker pool size.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}
