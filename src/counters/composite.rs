//! Fan-out of one update to many counters.
//!
//! A [`CompositeCounter`] lets hot-path code update several related counters
//! (a total, its rate, a moving average) with one call.
//!
//! # Design
//!
//! The member list is an immutable `Vec` published through an `ArcSwap`.
//! Writers (`add_counter`, `remove_counter`) build a new list under the lock
//! and swap it in. Increments load the current list without locking and
//! iterate that point-in-time copy, so a concurrent add or remove may or may
//! not be seen by an in-flight increment, but never corrupts it.

use arc_swap::ArcSwap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::counters::{same_counter, Counter, Decrement, Increment, SyncRoot};

/// Applies every increment and decrement to all of its member counters.
///
/// Members lacking the relevant capability are skipped. The reported value
/// is the value of the first member, in insertion order, or `0` when empty.
/// A counter appears at most once: adding it again moves it to the end.
///
/// # Examples
///
/// ```rust
/// use categorie::counters::composite::CompositeCounter;
/// use categorie::counters::moving_average::MovingAverage;
/// use categorie::counters::sum_total::SumTotal;
/// use categorie::counters::{Counter, Increment};
/// use std::sync::Arc;
///
/// let total = Arc::new(SumTotal::new());
/// let recent = Arc::new(MovingAverage::with_capacity(2));
///
/// let latency = CompositeCounter::new();
/// latency.add_counter(total.clone()).add_counter(recent.clone());
///
/// latency.increment(40);
/// latency.increment(20);
/// assert_eq!(total.value(), 60);
/// assert_eq!(recent.value(), 30);
/// assert_eq!(latency.value(), 60);
/// ```
pub struct CompositeCounter {
    lock: SyncRoot,
    counters: ArcSwap<Vec<Arc<dyn Counter>>>,
}

impl CompositeCounter {
    /// Creates an empty composite.
    pub fn new() -> Self {
        Self::with_lock(SyncRoot::new())
    }

    /// Creates an empty composite whose membership changes are guarded by `lock`.
    pub fn with_lock(lock: SyncRoot) -> Self {
        CompositeCounter {
            lock,
            counters: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Creates a composite from an initial set of counters.
    ///
    /// Duplicates are collapsed as if each counter had been added in turn.
    pub fn with_counters<I>(counters: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Counter>>,
    {
        let composite = Self::new();
        for counter in counters {
            composite.add_counter(counter);
        }
        composite
    }

    /// Adds `counter`, or moves it to the end if already present.
    pub fn add_counter(&self, counter: Arc<dyn Counter>) -> &Self {
        let _guard = self.lock.lock();
        let current = self.counters.load();
        let mut next: Vec<Arc<dyn Counter>> = current
            .iter()
            .filter(|c| !same_counter(c, &counter))
            .cloned()
            .collect();
        next.push(counter);
        self.counters.store(Arc::new(next));
        self
    }

    /// Removes `counter` if present.
    ///
    /// The lock is only taken when the counter is found in the current list.
    pub fn remove_counter(&self, counter: &Arc<dyn Counter>) -> &Self {
        if !self.contains(counter) {
            return self;
        }
        let _guard = self.lock.lock();
        let current = self.counters.load();
        if current.iter().any(|c| same_counter(c, counter)) {
            let next: Vec<Arc<dyn Counter>> = current
                .iter()
                .filter(|c| !same_counter(c, counter))
                .cloned()
                .collect();
            self.counters.store(Arc::new(next));
        }
        self
    }

    /// Returns `true` if `counter` is a member.
    pub fn contains(&self, counter: &Arc<dyn Counter>) -> bool {
        self.counters.load().iter().any(|c| same_counter(c, counter))
    }

    /// Returns a point-in-time copy of the member list.
    pub fn counters(&self) -> Arc<Vec<Arc<dyn Counter>>> {
        self.counters.load_full()
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.counters.load().len()
    }

    /// Returns `true` if there are no members.
    pub fn is_empty(&self) -> bool {
        self.counters.load().is_empty()
    }
}

fn first_value(counters: &[Arc<dyn Counter>]) -> i64 {
    counters.first().map(|c| c.value()).unwrap_or(0)
}

impl Counter for CompositeCounter {
    fn value(&self) -> i64 {
        first_value(&self.counters.load())
    }

    fn as_increment(&self) -> Option<&dyn Increment> {
        Some(self)
    }

    fn as_decrement(&self) -> Option<&dyn Decrement> {
        Some(self)
    }
}

impl Increment for CompositeCounter {
    fn increment(&self, value: i64) -> i64 {
        let counters = self.counters.load();
        for counter in counters.iter() {
            if let Some(c) = counter.as_increment() {
                c.increment(value);
            }
        }
        first_value(&counters)
    }
}

impl Decrement for CompositeCounter {
    fn decrement(&self, value: i64) -> i64 {
        let counters = self.counters.load();
        for counter in counters.iter() {
            if let Some(c) = counter.as_decrement() {
                c.decrement(value);
            }
        }
        first_value(&counters)
    }
}

impl Default for CompositeCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for CompositeCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.counters.load().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::median_average::MedianAverage;
    use crate::counters::sum_total::SumTotal;
    use std::thread;

    fn sum() -> Arc<dyn Counter> {
        Arc::new(SumTotal::new())
    }

    #[test]
    fn test_empty() {
        let composite = CompositeCounter::new();
        assert!(composite.is_empty());
        assert_eq!(composite.value(), 0);
        assert_eq!(composite.increment(5), 0);
        assert_eq!(composite.decrement(5), 0);
    }

    #[test]
    fn test_fan_out_and_first_member_value() {
        let a = sum();
        let b = sum();
        let c = sum();
        b.as_increment().unwrap().increment(100);

        let composite = CompositeCounter::new();
        composite
            .add_counter(a.clone())
            .add_counter(b.clone())
            .add_counter(c.clone());

        assert_eq!(composite.increment(5), 5);
        assert_eq!(a.value(), 5);
        assert_eq!(b.value(), 105);
        assert_eq!(c.value(), 5);
        assert_eq!(composite.value(), a.value());
    }

    #[test]
    fn test_remove_stops_updates() {
        let a = sum();
        let b = sum();
        let composite = CompositeCounter::with_counters([a.clone(), b.clone()]);

        composite.increment(1);
        composite.remove_counter(&b);
        composite.increment(1);

        assert_eq!(a.value(), 2);
        assert_eq!(b.value(), 1);
        assert!(!composite.contains(&b));
        assert_eq!(composite.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let a = sum();
        let composite = CompositeCounter::with_counters([a.clone()]);
        composite.remove_counter(&sum());
        assert_eq!(composite.len(), 1);
    }

    #[test]
    fn test_re_add_moves_to_end() {
        let a = sum();
        let b = sum();
        a.as_increment().unwrap().increment(1);
        b.as_increment().unwrap().increment(2);

        let composite = CompositeCounter::with_counters([a.clone(), b.clone()]);
        assert_eq!(composite.value(), 1);

        composite.add_counter(a.clone());
        assert_eq!(composite.len(), 2);
        assert_eq!(composite.value(), 2);
    }

    #[test]
    fn test_skips_missing_capabilities() {
        let total = sum();
        let median: Arc<dyn Counter> = Arc::new(MedianAverage::new());
        let composite = CompositeCounter::with_counters([total.clone(), median.clone()]);

        composite.increment(10);
        composite.decrement(4);

        assert_eq!(total.value(), 6);
        // median saw the increment, decrement was skipped
        assert_eq!(median.value(), 10);
    }

    #[test]
    fn test_concurrent_add_and_increment() {
        let composite = Arc::new(CompositeCounter::new());
        let base = sum();
        composite.add_counter(base.clone());

        let writer = {
            let composite = Arc::clone(&composite);
            thread::spawn(move || {
                for _ in 0..100 {
                    let extra = sum();
                    composite.add_counter(extra.clone());
                    composite.remove_counter(&extra);
                }
            })
        };
        let incrementer = {
            let composite = Arc::clone(&composite);
            thread::spawn(move || {
                for _ in 0..1000 {
                    composite.increment(1);
                }
            })
        };

        writer.join().unwrap();
        incrementer.join().unwrap();

        assert_eq!(base.value(), 1000);
        assert_eq!(composite.len(), 1);
    }
}
