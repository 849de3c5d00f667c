//! Counter capability model and shared locking infrastructure.
//!
//! Every counter in this crate exposes a readable `i64` value through the
//! [`Counter`] trait. On top of that, a counter may support some of the
//! optional capabilities:
//!
//! | Capability | Trait | Meaning |
//! |------------|-------|---------|
//! | Incrementable | [`Increment`] | `increment(v)` mutates the counter and returns the resulting value |
//! | Decrementable | [`Decrement`] | `decrement(v)` mutates the counter and returns the resulting value |
//! | Resettable | [`Reset`] | `reset()` restores the initial state |
//!
//! Not every counter supports every capability. [`ElapsedTime`](elapsed_time::ElapsedTime)
//! can only be read and reset, [`MedianAverage`](median_average::MedianAverage) cannot be
//! decremented. Code that handles counters generically asks for a capability via
//! [`Counter::as_increment`], [`Counter::as_decrement`] or [`Counter::as_reset`] and
//! treats `None` as a legal no-op.
//!
//! # Locking
//!
//! ```text
//!              SyncRoot (shared, reentrant)
//!            ┌──────────────┴──────────────┐
//!            ▼                             ▼
//!   ┌─────────────────┐          ┌───────────────────────┐
//!   │ SumTotal (in)   │◄─────────│ RatePerSecond (in/s)  │
//!   └─────────────────┘ numerator└───────────────────────┘
//! ```
//!
//! Each primitive counter owns a [`SyncRoot`]. Counters that must be read and
//! written consistently as a group are built with a clone of the same
//! `SyncRoot`; sharing is always explicit, never implied. The lock is
//! reentrant because a derived counter holding the group lock forwards to a
//! base counter that takes the very same lock.

pub mod composite;
pub mod delta;
pub mod elapsed_time;
pub mod mean_average;
pub mod median_average;
pub mod moving_average;
pub mod observed_value;
pub mod rate_per_second;
pub mod sum_total;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::fmt::{self, Debug};
use std::sync::Arc;
use std::time::Instant;

/// A readable `i64` counter.
///
/// The capability accessors default to `None`. Implementors override the
/// ones they support, returning `Some(self)`.
///
/// # Examples
///
/// ```rust
/// use categorie::counters::sum_total::SumTotal;
/// use categorie::counters::{Counter, Increment};
///
/// let total = SumTotal::new();
/// total.increment(5);
///
/// let counter: &dyn Counter = &total;
/// assert_eq!(counter.value(), 5);
/// assert!(counter.as_increment().is_some());
/// ```
pub trait Counter: Send + Sync + Debug {
    /// Returns the current value of the counter.
    fn value(&self) -> i64;

    /// Returns the incrementable view of this counter, if supported.
    fn as_increment(&self) -> Option<&dyn Increment> {
        None
    }

    /// Returns the decrementable view of this counter, if supported.
    fn as_decrement(&self) -> Option<&dyn Decrement> {
        None
    }

    /// Returns the resettable view of this counter, if supported.
    fn as_reset(&self) -> Option<&dyn Reset> {
        None
    }
}

/// A counter that can be incremented.
pub trait Increment: Counter {
    /// Increments the counter by `value`, returning the resulting value.
    fn increment(&self, value: i64) -> i64;

    /// Increments the counter by one unit.
    fn increment_one(&self) -> i64 {
        self.increment(1)
    }

    /// Increments the counter by the milliseconds elapsed since `since`.
    ///
    /// Handy when collecting execution times:
    ///
    /// ```rust
    /// use categorie::counters::sum_total::SumTotal;
    /// use categorie::counters::Increment;
    /// use std::time::Instant;
    ///
    /// let busy_ms = SumTotal::new();
    /// let started = Instant::now();
    /// // ... do some work ...
    /// busy_ms.increment_elapsed(started);
    /// ```
    fn increment_elapsed(&self, since: Instant) -> i64 {
        self.increment(elapsed_millis(since))
    }
}

/// A counter that can be decremented.
pub trait Decrement: Counter {
    /// Decrements the counter by `value`, returning the resulting value.
    fn decrement(&self, value: i64) -> i64;

    /// Decrements the counter by one unit.
    fn decrement_one(&self) -> i64 {
        self.decrement(1)
    }

    /// Decrements the counter by the milliseconds elapsed since `since`.
    fn decrement_elapsed(&self, since: Instant) -> i64 {
        self.decrement(elapsed_millis(since))
    }
}

/// An object whose state can be reset.
///
/// What is reset depends on the implementation. Derived counters typically
/// reset their own state and every base counter they wrap.
pub trait Reset {
    /// Resets the counter state.
    fn reset(&self);
}

fn elapsed_millis(since: Instant) -> i64 {
    i64::try_from(since.elapsed().as_millis()).unwrap_or(i64::MAX)
}

/// Returns `true` if both handles point at the same counter instance.
///
/// Only the data address is compared, so two handles to one counter obtained
/// through different trait-object coercions are still considered equal.
#[inline]
pub fn same_counter(a: &Arc<dyn Counter>, b: &Arc<dyn Counter>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// A shareable, reentrant lock used to keep a group of counters consistent.
///
/// Cloning a `SyncRoot` yields another handle to the *same* lock.
///
/// # Examples
///
/// ```rust
/// use categorie::counters::SyncRoot;
/// use categorie::counters::sum_total::SumTotal;
/// use categorie::counters::rate_per_second::RatePerSecond;
/// use std::sync::Arc;
///
/// let lock = SyncRoot::new();
/// let in_total = Arc::new(SumTotal::with_lock(lock.clone()));
/// let in_per_sec = RatePerSecond::with_numerator(in_total.clone(), lock);
/// ```
#[derive(Clone, Default)]
pub struct SyncRoot {
    inner: Arc<ReentrantMutex<()>>,
}

impl SyncRoot {
    /// Creates a new, unshared lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock, blocking until it is available.
    ///
    /// The calling thread may acquire the lock again while already holding it.
    #[inline]
    pub fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.inner.lock()
    }

    /// Returns `true` if both handles refer to the same lock.
    pub fn is_shared_with(&self, other: &SyncRoot) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Debug for SyncRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SyncRoot({:p})", Arc::as_ptr(&self.inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::elapsed_time::ElapsedTime;
    use crate::counters::sum_total::SumTotal;

    #[test]
    fn test_sync_root_clone_shares_lock() {
        let a = SyncRoot::new();
        let b = a.clone();
        let c = SyncRoot::new();
        assert!(a.is_shared_with(&b));
        assert!(!a.is_shared_with(&c));
    }

    #[test]
    fn test_sync_root_is_reentrant() {
        let lock = SyncRoot::new();
        let _outer = lock.lock();
        let _inner = lock.lock();
    }

    #[test]
    fn test_same_counter() {
        let a: Arc<dyn Counter> = Arc::new(SumTotal::new());
        let b = a.clone();
        let c: Arc<dyn Counter> = Arc::new(SumTotal::new());
        assert!(same_counter(&a, &b));
        assert!(!same_counter(&a, &c));
    }

    #[test]
    fn test_capabilities_absent_by_default() {
        let elapsed = ElapsedTime::new();
        let counter: &dyn Counter = &elapsed;
        assert!(counter.as_increment().is_none());
        assert!(counter.as_decrement().is_none());
        assert!(counter.as_reset().is_some());
    }

    #[test]
    fn test_one_unit_helpers() {
        let total = SumTotal::new();
        assert_eq!(total.increment_one(), 1);
        assert_eq!(total.increment_one(), 2);
        assert_eq!(total.decrement_one(), 1);
    }

    #[test]
    fn test_elapsed_helpers() {
        let total = SumTotal::new();
        let started = Instant::now();
        std::thread::sleep(std::time::Duration::from_millis(20));
        let after = total.increment_elapsed(started);
        assert!(after >= 20, "expected at least 20ms, got {}", after);
        let back = total.decrement_elapsed(Instant::now());
        assert!(back <= after);
    }

    #[test]
    fn test_dyn_debug() {
        let total = SumTotal::new();
        total.increment(3);
        let debug_str = format!("{:?}", &total as &dyn Counter);
        assert!(debug_str.contains("SumTotal"));
        assert!(debug_str.contains('3'));
    }
}
