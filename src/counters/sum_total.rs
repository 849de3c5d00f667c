//! Running sum counter.
//!
//! This module provides [`SumTotal`], the basic building block of most
//! counter compositions: a signed 64-bit sum mutated under a (possibly
//! shared) lock.

use crossbeam_utils::CachePadded;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::counters::{Counter, Decrement, Increment, Reset, SyncRoot};

/// A signed running sum.
///
/// Increments and decrements are applied while holding the counter's
/// [`SyncRoot`], so a `SumTotal` built with a shared lock stays consistent
/// with the other counters of its group. Reads never block.
///
/// The value is cache-line padded so that the many totals of a category
/// laid out next to each other do not false-share.
///
/// # Examples
///
/// ```rust
/// use categorie::counters::sum_total::SumTotal;
/// use categorie::counters::{Counter, Decrement, Increment};
///
/// let pending = SumTotal::new();
/// pending.increment(10);
/// pending.decrement(3);
/// assert_eq!(pending.value(), 7);
/// ```
///
/// Multi-threaded usage:
///
/// ```rust
/// use categorie::counters::sum_total::SumTotal;
/// use categorie::counters::{Counter, Increment};
/// use std::sync::Arc;
/// use std::thread;
///
/// let total = Arc::new(SumTotal::new());
/// let mut handles = vec![];
///
/// for _ in 0..4 {
///     let t = Arc::clone(&total);
///     handles.push(thread::spawn(move || {
///         for _ in 0..1000 {
///             t.increment(1);
///         }
///     }));
/// }
///
/// for h in handles {
///     h.join().unwrap();
/// }
///
/// assert_eq!(total.value(), 4000);
/// ```
pub struct SumTotal {
    lock: SyncRoot,
    value: CachePadded<AtomicI64>,
}

impl SumTotal {
    /// Creates a new sum initialized to zero, with its own lock.
    pub fn new() -> Self {
        Self::with_lock(SyncRoot::new())
    }

    /// Creates a new sum initialized to zero, guarded by `lock`.
    pub fn with_lock(lock: SyncRoot) -> Self {
        SumTotal {
            lock,
            value: CachePadded::new(AtomicI64::new(0)),
        }
    }

    /// Returns the lock guarding this counter.
    pub fn sync_root(&self) -> &SyncRoot {
        &self.lock
    }
}

impl Counter for SumTotal {
    #[inline]
    fn value(&self) -> i64 {
        self.value.load(Ordering::Acquire)
    }

    fn as_increment(&self) -> Option<&dyn Increment> {
        Some(self)
    }

    fn as_decrement(&self) -> Option<&dyn Decrement> {
        Some(self)
    }

    fn as_reset(&self) -> Option<&dyn Reset> {
        Some(self)
    }
}

impl Increment for SumTotal {
    #[inline]
    fn increment(&self, value: i64) -> i64 {
        let _guard = self.lock.lock();
        self.value.fetch_add(value, Ordering::AcqRel).wrapping_add(value)
    }
}

impl Decrement for SumTotal {
    #[inline]
    fn decrement(&self, value: i64) -> i64 {
        let _guard = self.lock.lock();
        self.value.fetch_sub(value, Ordering::AcqRel).wrapping_sub(value)
    }
}

impl Reset for SumTotal {
    fn reset(&self) {
        let _guard = self.lock.lock();
        self.value.store(0, Ordering::Release);
    }
}

impl Default for SumTotal {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for SumTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SumTotal{{ {} }}", self.value())
    }
}
