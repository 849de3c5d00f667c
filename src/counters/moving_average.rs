//! Moving average over a fixed window.

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::counters::{Counter, Increment, Reset, SyncRoot};

/// Default number of slots in a [`MovingAverage`] window.
pub const DEFAULT_CAPACITY: usize = 7;

/// Smallest accepted window; smaller capacities are clamped up to it.
pub const MIN_CAPACITY: usize = 2;

struct Window {
    slots: Vec<i64>,
    cursor: usize,
}

/// Mean of the last `capacity` observed values.
///
/// Each increment writes its value into a ring buffer, evicting the oldest
/// slot once the window is full. The value is the sum of every slot divided
/// by the *capacity*, not by the number of observations: slots start at `0`,
/// so readings taken before the window fills are biased toward zero.
///
/// `MovingAverage` is incrementable and resettable but not decrementable.
///
/// # Examples
///
/// ```rust
/// use categorie::counters::moving_average::MovingAverage;
/// use categorie::counters::{Counter, Increment};
///
/// let latency = MovingAverage::with_capacity(3);
/// latency.increment(30);
/// assert_eq!(latency.value(), 10); // (30 + 0 + 0) / 3
///
/// latency.increment(60);
/// latency.increment(90);
/// latency.increment(120); // evicts 30
/// assert_eq!(latency.value(), 90);
/// ```
pub struct MovingAverage {
    lock: SyncRoot,
    window: Mutex<Window>,
    sum: CachePadded<AtomicI64>,
    capacity: usize,
}

impl MovingAverage {
    /// Creates a moving average over [`DEFAULT_CAPACITY`] slots.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a moving average over `capacity` slots, clamped to at least [`MIN_CAPACITY`].
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_lock(capacity, SyncRoot::new())
    }

    /// Creates a moving average over [`DEFAULT_CAPACITY`] slots guarded by `lock`.
    pub fn with_lock(lock: SyncRoot) -> Self {
        Self::with_capacity_and_lock(DEFAULT_CAPACITY, lock)
    }

    /// Creates a moving average over `capacity` slots guarded by `lock`.
    pub fn with_capacity_and_lock(capacity: usize, lock: SyncRoot) -> Self {
        let capacity = capacity.max(MIN_CAPACITY);
        MovingAverage {
            lock,
            window: Mutex::new(Window {
                slots: vec![0; capacity],
                cursor: 0,
            }),
            sum: CachePadded::new(AtomicI64::new(0)),
            capacity,
        }
    }

    /// Returns the window length.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Counter for MovingAverage {
    #[inline]
    fn value(&self) -> i64 {
        // capacity is at least MIN_CAPACITY, the cast cannot reach zero
        self.sum.load(Ordering::Acquire) / self.capacity as i64
    }

    fn as_increment(&self) -> Option<&dyn Increment> {
        Some(self)
    }

    fn as_reset(&self) -> Option<&dyn Reset> {
        Some(self)
    }
}

impl Increment for MovingAverage {
    /// Writes `value` into the window, returning the resulting average.
    fn increment(&self, value: i64) -> i64 {
        let _guard = self.lock.lock();
        let mut window = self.window.lock();
        let cursor = window.cursor;
        let evicted = std::mem::replace(&mut window.slots[cursor], value);
        window.cursor = (cursor + 1) % self.capacity;

        let sum = self.sum.load(Ordering::Acquire);
        self.sum
            .store(sum.wrapping_sub(evicted).wrapping_add(value), Ordering::Release);
        self.value()
    }
}

impl Reset for MovingAverage {
    fn reset(&self) {
        let _guard = self.lock.lock();
        let mut window = self.window.lock();
        window.slots.iter_mut().for_each(|slot| *slot = 0);
        window.cursor = 0;
        self.sum.store(0, Ordering::Release);
    }
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for MovingAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MovingAverage{{ {} over {} }}",
            self.value(),
            self.capacity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_default_capacity() {
        assert_eq!(MovingAverage::new().capacity(), 7);
    }

    #[test]
    fn test_capacity_clamped() {
        assert_eq!(MovingAverage::with_capacity(0).capacity(), 2);
        assert_eq!(MovingAverage::with_capacity(1).capacity(), 2);
        assert_eq!(MovingAverage::with_capacity(5).capacity(), 5);
    }

    #[test]
    fn test_biased_toward_zero_until_full() {
        let avg = MovingAverage::with_capacity(4);
        assert_eq!(avg.increment(8), 2);
        assert_eq!(avg.increment(8), 4);
        assert_eq!(avg.increment(8), 6);
        assert_eq!(avg.increment(8), 8);
    }

    #[test]
    fn test_eviction() {
        let avg = MovingAverage::with_capacity(2);
        avg.increment(10);
        avg.increment(20);
        assert_eq!(avg.value(), 15);
        avg.increment(40);
        assert_eq!(avg.value(), 30);
    }

    #[test]
    fn test_zero_values_still_evict() {
        let avg = MovingAverage::with_capacity(2);
        avg.increment(100);
        avg.increment(0);
        avg.increment(0);
        assert_eq!(avg.value(), 0);
    }

    #[test]
    fn test_reset() {
        let avg = MovingAverage::with_capacity(3);
        avg.increment(9);
        avg.increment(9);
        avg.reset();
        assert_eq!(avg.value(), 0);
        avg.increment(3);
        assert_eq!(avg.value(), 1);
    }

    #[test]
    fn test_not_decrementable() {
        assert!(MovingAverage::new().as_decrement().is_none());
    }

    #[test]
    fn test_multiple_threads_constant_value() {
        let avg = Arc::new(MovingAverage::with_capacity(16));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let a = Arc::clone(&avg);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        a.increment(50);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(avg.value(), 50);
    }

    proptest! {
        #[test]
        fn prop_full_window_is_mean_of_last_values(
            capacity in 2usize..16,
            extra in 0usize..40,
            start in -1000i64..1000,
        ) {
            let avg = MovingAverage::with_capacity(capacity);
            let values: Vec<i64> = (0..(capacity + extra) as i64).map(|i| start + i).collect();
            for &v in &values {
                avg.increment(v);
            }
            let tail = &values[values.len() - capacity..];
            let expected = tail.iter().sum::<i64>() / capacity as i64;
            prop_assert_eq!(avg.value(), expected);
        }
    }
}
