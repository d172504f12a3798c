//! # Fail-stop escalation for safety-relevant faults.
//!
//! In a safety-oriented control system some failures (repeated protocol
//! violations, corrupted shared state) must not be "handled": continuing to
//! run with them is worse than not running at all. [`critical`] is that
//! escalation path — it reports the fault and terminates the process.
//!
//! ## Rules
//! - Never call this for routine, recoverable conditions; those are returned
//!   as `Result`s ([`BusError`](crate::BusError), [`PoolError`](crate::PoolError), ...).
//! - The core itself never calls this; it is the documented hook for
//!   application code supervising the bus.

use std::process;

use tracing::error;

/// Reports a critical fault and aborts the process.
///
/// The fault is logged at `error` level under the `fault` target before
/// `abort` — but logging is best-effort; termination does not depend on a
/// subscriber being installed.
pub fn critical(module: &str, message: &str) -> ! {
    error!(target: "fault", module, message, "critical fault, terminating process");
    process::abort();
}
