//! # Task identities and their allocator.
//!
//! [`TaskId`] is an opaque integer identifying a task for the lifetime of the
//! process. Identities are handed out by a [`TaskIdAllocator`] — an explicit,
//! injectable atomic counter owned by whichever context constructs tasks.
//! An allocator never reissues an identity, even after the task it was given
//! to has been dropped, so a stale id can never alias a live registration.
//!
//! # Example
//! ```rust
//! use busbar::TaskIdAllocator;
//!
//! let ids = TaskIdAllocator::new();
//! let a = ids.allocate();
//! let b = ids.allocate();
//! assert_ne!(a, b);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque, process-unique task identity.
///
/// `TaskId`s are only created by [`TaskIdAllocator::allocate`]; the inner
/// value is exposed read-only for logging and diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Returns the raw numeric identity.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic identity source for tasks.
///
/// Replaces a process-wide singleton counter with an object the caller owns
/// and passes to task construction. Identities are monotonically increasing
/// and never reused for the allocator's lifetime.
#[derive(Debug, Default)]
pub struct TaskIdAllocator {
    next: AtomicU64,
}

impl TaskIdAllocator {
    /// Creates an allocator starting at identity `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out the next identity.
    ///
    /// Safe to call from any thread; each call returns a distinct id.
    pub fn allocate(&self) -> TaskId {
        TaskId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_ids_are_monotonic() {
        let ids = TaskIdAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        let c = ids.allocate();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_ids_are_unique_across_threads() {
        let ids = Arc::new(TaskIdAllocator::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let ids = Arc::clone(&ids);
            handles.push(std::thread::spawn(move || {
                (0..100).map(|_| ids.allocate()).collect::<Vec<_>>()
            }));
        }

        let mut seen = HashSet::new();
        for h in handles {
            for id in h.join().expect("allocator thread panicked") {
                assert!(seen.insert(id), "id {id} was issued twice");
            }
        }
        assert_eq!(seen.len(), 800);
    }
}
