//! # Broadcast bus: task registry, fan-out delivery, blocking receive.
//!
//! [`Bus`] mediates message exchange between attached tasks without the
//! tasks holding references to one another. A send fans out to every other
//! attached task's private inbox; tasks consume either by blocking on
//! [`Bus::receive`] or through a registered [`Callback`] executed on the
//! bus's worker pool.

mod bus;
mod record;

pub use bus::Bus;
pub use record::Callback;
