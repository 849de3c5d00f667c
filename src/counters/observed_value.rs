//! Observed value tracker.
//!
//! This module provides [`ObservedValue`], which records either the last,
//! the smallest or the largest value it has been shown.

use crossbeam_utils::CachePadded;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::counters::{Counter, Decrement, Increment, Reset, SyncRoot};

/// How an [`ObservedValue`] combines new observations with its state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ObservationType {
    /// Keeps the last observed value.
    #[default]
    Last,
    /// Keeps the smallest observed value.
    Minimum,
    /// Keeps the largest observed value.
    Maximum,
}

/// Tracks an observed value according to an [`ObservationType`].
///
/// Increments and decrements are both treated as "observe this value", so an
/// `ObservedValue` can sit inside a
/// [`CompositeCounter`](crate::counters::composite::CompositeCounter) next to
/// ordinary sums and still see every value passed through it.
///
/// # Initial State
///
/// The counter starts at `0` and `0` is also what it returns before any
/// observation. A `Minimum` tracker that only ever sees positive values
/// therefore keeps reporting `0`, and a `Maximum` tracker that only ever sees
/// negative values does the same: an explicit observation of `0` and "nothing
/// observed yet" are indistinguishable.
///
/// # Examples
///
/// ```rust
/// use categorie::counters::observed_value::{ObservationType, ObservedValue};
/// use categorie::counters::Counter;
///
/// let worst = ObservedValue::new(ObservationType::Maximum);
/// worst.observe(120);
/// worst.observe(85);
/// worst.observe(310);
/// assert_eq!(worst.value(), 310);
/// ```
pub struct ObservedValue {
    lock: SyncRoot,
    observation: ObservationType,
    value: CachePadded<AtomicI64>,
}

impl ObservedValue {
    /// Creates a new tracker with its own lock.
    pub fn new(observation: ObservationType) -> Self {
        Self::with_lock(observation, SyncRoot::new())
    }

    /// Creates a new tracker guarded by `lock`.
    pub fn with_lock(observation: ObservationType, lock: SyncRoot) -> Self {
        ObservedValue {
            lock,
            observation,
            value: CachePadded::new(AtomicI64::new(0)),
        }
    }

    /// Returns the configured observation policy.
    pub fn observation(&self) -> ObservationType {
        self.observation
    }

    /// Observes `value`, returning the resulting tracked value.
    pub fn observe(&self, value: i64) -> i64 {
        let _guard = self.lock.lock();
        let current = self.value.load(Ordering::Acquire);
        let next = match self.observation {
            ObservationType::Last => value,
            ObservationType::Minimum => current.min(value),
            ObservationType::Maximum => current.max(value),
        };
        self.value.store(next, Ordering::Release);
        next
    }
}

impl Counter for ObservedValue {
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

impl Increment for ObservedValue {
    fn increment(&self, value: i64) -> i64 {
        self.observe(value)
    }
}

impl Decrement for ObservedValue {
    fn decrement(&self, value: i64) -> i64 {
        self.observe(value)
    }
}

impl Reset for ObservedValue {
    /// Resets the tracked value to `0`, regardless of the observation policy.
    fn reset(&self) {
        let _guard = self.lock.lock();
        self.value.store(0, Ordering::Release);
    }
}

impl Debug for ObservedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObservedValue{{ {:?}:{} }}", self.observation, self.value())
    }
}
