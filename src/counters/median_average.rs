//! Median of every observed value.
//!
//! [`MedianAverage`] keeps a frequency map ordered by value. Recording an
//! observation costs `O(log distinct)`; reading the median walks the map.
//! Memory grows with the number of *distinct* values observed, so call
//! [`Reset::reset`] periodically when observing unbounded domains.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt::{self, Debug};

use crate::counters::{Counter, Increment, Reset, SyncRoot};

#[derive(Default)]
struct Frequencies {
    counts: BTreeMap<i64, u64>,
    total: u64,
}

impl Frequencies {
    fn observe(&mut self, value: i64) {
        *self.counts.entry(value).or_insert(0) += 1;
        self.total += 1;
    }

    // Walks the ordered counts until the cumulative count passes the midpoint.
    // With an even total, landing exactly on the midpoint means the median sits
    // between this key and the next one.
    fn median(&self) -> i64 {
        let midpoint = self.total / 2;
        let even = self.total % 2 == 0;
        let mut cumulative = 0u64;
        let mut entries = self.counts.iter().peekable();

        while let Some((&key, &count)) = entries.next() {
            cumulative += count;
            if even && cumulative == midpoint {
                return match entries.peek() {
                    Some((&next, _)) => tween(key, next),
                    None => key,
                };
            }
            if cumulative > midpoint {
                return key;
            }
        }
        0
    }
}

fn tween(low: i64, high: i64) -> i64 {
    let mid = low as i128 + (high as i128 - low as i128) / 2;
    mid as i64
}

/// Reports the median of every value it has been incremented with.
///
/// `MedianAverage` is incrementable and resettable but not decrementable:
/// an observation cannot be taken back. Before the first observation the
/// value is `0`.
///
/// # Examples
///
/// ```rust
/// use categorie::counters::median_average::MedianAverage;
/// use categorie::counters::{Counter, Increment};
///
/// let latency = MedianAverage::new();
/// for ms in [12, 15, 11, 900, 14] {
///     latency.increment(ms);
/// }
/// // a single outlier does not drag the median
/// assert_eq!(latency.value(), 14);
/// ```
pub struct MedianAverage {
    lock: SyncRoot,
    frequencies: Mutex<Frequencies>,
}

impl MedianAverage {
    /// Creates an empty median with its own lock.
    pub fn new() -> Self {
        Self::with_lock(SyncRoot::new())
    }

    /// Creates an empty median guarded by `lock`.
    pub fn with_lock(lock: SyncRoot) -> Self {
        MedianAverage {
            lock,
            frequencies: Mutex::new(Frequencies::default()),
        }
    }

    /// Returns the number of observations.
    pub fn observations(&self) -> u64 {
        let _guard = self.lock.lock();
        self.frequencies.lock().total
    }

    /// Returns the number of distinct observed values.
    pub fn distinct(&self) -> usize {
        let _guard = self.lock.lock();
        self.frequencies.lock().counts.len()
    }
}

impl Counter for MedianAverage {
    fn value(&self) -> i64 {
        let _guard = self.lock.lock();
        self.frequencies.lock().median()
    }

    fn as_increment(&self) -> Option<&dyn Increment> {
        Some(self)
    }

    fn as_reset(&self) -> Option<&dyn Reset> {
        Some(self)
    }
}

impl Increment for MedianAverage {
    /// Records one observation of `value`, returning the number of
    /// observations so far. Read the median with [`Counter::value`].
    fn increment(&self, value: i64) -> i64 {
        let _guard = self.lock.lock();
        let mut frequencies = self.frequencies.lock();
        frequencies.observe(value);
        i64::try_from(frequencies.total).unwrap_or(i64::MAX)
    }
}

impl Reset for MedianAverage {
    fn reset(&self) {
        let _guard = self.lock.lock();
        let mut frequencies = self.frequencies.lock();
        frequencies.counts.clear();
        frequencies.total = 0;
    }
}

impl Default for MedianAverage {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for MedianAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MedianAverage{{ {} of {} }}",
            self.value(),
            self.observations()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fibonacci(from: usize, to: usize) -> Vec<i64> {
        let mut seq = vec![0i64, 1];
        while seq.len() <= to {
            let next = seq[seq.len() - 1] + seq[seq.len() - 2];
            seq.push(next);
        }
        seq[from..=to].to_vec()
    }

    fn median_of(values: &[i64]) -> i64 {
        let median = MedianAverage::new();
        for &v in values {
            median.increment(v);
        }
        median.value()
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(MedianAverage::new().value(), 0);
    }

    #[test]
    fn test_odd_count_is_middle_element() {
        assert_eq!(median_of(&[1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89]), 8);
        assert_eq!(median_of(&[42]), 42);
        assert_eq!(median_of(&[3, 1, 2]), 2);
    }

    #[test]
    fn test_even_count_tweens_on_boundary() {
        assert_eq!(median_of(&[3, 7]), 5);
        // 0,1,1,2,...,55 | 89,... -> 55 + (89 - 55) / 2
        assert_eq!(median_of(&fibonacci(0, 21)), 72);
    }

    #[test]
    fn test_even_count_inside_duplicate_run() {
        assert_eq!(median_of(&[3, 3]), 3);
        assert_eq!(median_of(&[1, 1, 1, i64::MAX]), 1);
    }

    #[test]
    fn test_overlapping_sequences() {
        let mut values = fibonacci(0, 21);
        values.extend(fibonacci(8, 27));
        assert_eq!(values.len(), 42);
        assert_eq!(median_of(&values), 377);
    }

    #[test]
    fn test_tween_does_not_overflow() {
        assert_eq!(median_of(&[i64::MIN, i64::MAX]), -1);
    }

    #[test]
    fn test_increment_returns_observation_count() {
        let median = MedianAverage::new();
        assert_eq!(median.increment(10), 1);
        assert_eq!(median.increment(20), 2);
        assert_eq!(median.increment(30), 3);
        assert_eq!(median.value(), 20);
        assert_eq!(median.observations(), 3);
        assert_eq!(median.distinct(), 3);
    }

    #[test]
    fn test_increment_does_not_read_median() {
        let median = MedianAverage::new();
        for v in 0..10_000 {
            median.increment(v);
        }
        assert_eq!(median.increment(-1), 10_001);
        assert_eq!(median.distinct(), 10_001);
        assert_eq!(median.value(), 4999);
    }

    #[test]
    fn test_not_decrementable() {
        let median = MedianAverage::new();
        assert!(median.as_decrement().is_none());
    }

    #[test]
    fn test_reset() {
        let median = MedianAverage::new();
        median.increment(5);
        median.increment(9);
        median.reset();
        assert_eq!(median.value(), 0);
        assert_eq!(median.observations(), 0);
        median.increment(4);
        assert_eq!(median.value(), 4);
    }

    proptest! {
        #[test]
        fn prop_odd_counts_match_sorted_middle(
            mut values in proptest::collection::vec(-10_000i64..10_000, 1..200)
        ) {
            if values.len() % 2 == 0 {
                values.pop();
            }
            let measured = median_of(&values);
            values.sort_unstable();
            prop_assert_eq!(measured, values[values.len() / 2]);
        }

        #[test]
        fn prop_even_counts_between_middle_pair(
            mut values in proptest::collection::vec(-10_000i64..10_000, 1..100)
        ) {
            if values.len() % 2 == 1 {
                values.push(0);
            }
            let measured = median_of(&values);
            values.sort_unstable();
            let low = values[values.len() / 2 - 1];
            let high = values[values.len() / 2];
            prop_assert!(low <= measured && measured <= high);
        }
    }
}
