//! Difference of two counters.
//!
//! This module provides [`Delta`], which reports `minuend - subtrahend`.
//! The typical use is a "pending" count derived from an in-total and an
//! out-total that are incremented elsewhere.

use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::counters::sum_total::SumTotal;
use crate::counters::{Counter, Decrement, Increment, Reset, SyncRoot};

/// Reports the difference `minuend - subtrahend` of two counters.
///
/// Every increment or decrement applied to a `Delta` is applied to its
/// minuend only, so a `Delta` can stand in for its minuend anywhere in the
/// code and returns what the minuend returns. The subtrahend is never
/// mutated through the `Delta`; callers share it and mutate it directly.
///
/// [`Reset`] resets both sides.
///
/// # Examples
///
/// ```rust
/// use categorie::counters::delta::Delta;
/// use categorie::counters::sum_total::SumTotal;
/// use categorie::counters::{Counter, Increment, SyncRoot};
/// use std::sync::Arc;
///
/// let lock = SyncRoot::new();
/// let in_total = Arc::new(SumTotal::with_lock(lock.clone()));
/// let out_total = Arc::new(SumTotal::with_lock(lock.clone()));
/// let pending = Delta::from_counters(in_total.clone(), out_total.clone(), lock);
///
/// in_total.increment(5);
/// out_total.increment(2);
/// assert_eq!(pending.value(), 3);
/// ```
pub struct Delta {
    lock: SyncRoot,
    minuend: Arc<dyn Counter>,
    subtrahend: Arc<dyn Counter>,
}

impl Delta {
    /// Creates a delta of two fresh [`SumTotal`] counters.
    pub fn new() -> Self {
        Self::with_lock(SyncRoot::new())
    }

    /// Creates a delta of two fresh [`SumTotal`] counters sharing `lock`.
    pub fn with_lock(lock: SyncRoot) -> Self {
        let subtrahend = Arc::new(SumTotal::with_lock(lock.clone()));
        Self::with_subtrahend(subtrahend, lock)
    }

    /// Creates a delta of a fresh [`SumTotal`] minuend and the given subtrahend.
    pub fn with_subtrahend(subtrahend: Arc<dyn Counter>, lock: SyncRoot) -> Self {
        let minuend = Arc::new(SumTotal::with_lock(lock.clone()));
        Self::from_counters(minuend, subtrahend, lock)
    }

    /// Creates a delta of the given minuend and subtrahend.
    pub fn from_counters(
        minuend: Arc<dyn Counter>,
        subtrahend: Arc<dyn Counter>,
        lock: SyncRoot,
    ) -> Self {
        Delta {
            lock,
            minuend,
            subtrahend,
        }
    }

    /// Returns the minuend.
    pub fn minuend(&self) -> &Arc<dyn Counter> {
        &self.minuend
    }

    /// Returns the subtrahend.
    pub fn subtrahend(&self) -> &Arc<dyn Counter> {
        &self.subtrahend
    }
}

impl Counter for Delta {
    fn value(&self) -> i64 {
        let _guard = self.lock.lock();
        self.minuend.value().wrapping_sub(self.subtrahend.value())
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

impl Increment for Delta {
    /// Increments the minuend, returning the minuend's resulting value.
    fn increment(&self, value: i64) -> i64 {
        match self.minuend.as_increment() {
            Some(minuend) => minuend.increment(value),
            None => self.minuend.value(),
        }
    }
}

impl Decrement for Delta {
    /// Decrements the minuend, returning the minuend's resulting value.
    fn decrement(&self, value: i64) -> i64 {
        match self.minuend.as_decrement() {
            Some(minuend) => minuend.decrement(value),
            None => self.minuend.value(),
        }
    }
}

impl Reset for Delta {
    fn reset(&self) {
        let _guard = self.lock.lock();
        if let Some(minuend) = self.minuend.as_reset() {
            minuend.reset();
        }
        if let Some(subtrahend) = self.subtrahend.as_reset() {
            subtrahend.reset();
        }
    }
}

impl Default for Delta {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delta")
            .field("minuend", &self.minuend)
            .field("subtrahend", &self.subtrahend)
            .finish()
    }
}
