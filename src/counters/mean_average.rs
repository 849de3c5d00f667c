//! Mean average of two counters.

use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::counters::sum_total::SumTotal;
use crate::counters::{Counter, Decrement, Increment, Reset, SyncRoot};

/// Reports `numerator / denominator` using integer division.
///
/// While the denominator is not positive the numerator is reported
/// unmodified, which gives a defined value before the denominator has been
/// incremented even once.
///
/// Increments and decrements are applied to the numerator only, so a
/// `MeanAverage` can be substituted for its numerator elsewhere in the code.
/// Unlike [`Delta`](crate::counters::delta::Delta), the mutating calls return
/// the *average* after the update. The denominator is never touched except
/// by [`Reset`], which resets both sides under the shared lock.
///
/// # Examples
///
/// An error ratio built from two totals that are incremented elsewhere:
///
/// ```rust
/// use categorie::counters::mean_average::MeanAverage;
/// use categorie::counters::sum_total::SumTotal;
/// use categorie::counters::{Counter, Increment, SyncRoot};
/// use std::sync::Arc;
///
/// let lock = SyncRoot::new();
/// let requests = Arc::new(SumTotal::with_lock(lock.clone()));
/// let errors = Arc::new(SumTotal::with_lock(lock.clone()));
/// let requests_per_error =
///     MeanAverage::from_counters(requests.clone(), errors.clone(), lock);
///
/// requests.increment(100);
/// assert_eq!(requests_per_error.value(), 100);
///
/// errors.increment(4);
/// assert_eq!(requests_per_error.value(), 25);
/// ```
pub struct MeanAverage {
    lock: SyncRoot,
    numerator: Arc<dyn Counter>,
    denominator: Arc<dyn Counter>,
}

impl MeanAverage {
    /// Creates an average of two fresh [`SumTotal`] counters.
    pub fn new() -> Self {
        Self::with_lock(SyncRoot::new())
    }

    /// Creates an average of two fresh [`SumTotal`] counters sharing `lock`.
    pub fn with_lock(lock: SyncRoot) -> Self {
        let denominator = Arc::new(SumTotal::with_lock(lock.clone()));
        Self::with_denominator(denominator, lock)
    }

    /// Creates an average of a fresh [`SumTotal`] numerator over `denominator`.
    pub fn with_denominator(denominator: Arc<dyn Counter>, lock: SyncRoot) -> Self {
        let numerator = Arc::new(SumTotal::with_lock(lock.clone()));
        Self::from_counters(numerator, denominator, lock)
    }

    /// Creates an average of `numerator` over `denominator`.
    pub fn from_counters(
        numerator: Arc<dyn Counter>,
        denominator: Arc<dyn Counter>,
        lock: SyncRoot,
    ) -> Self {
        MeanAverage {
            lock,
            numerator,
            denominator,
        }
    }

    /// Returns the numerator.
    pub fn numerator(&self) -> &Arc<dyn Counter> {
        &self.numerator
    }

    /// Returns the denominator.
    pub fn denominator(&self) -> &Arc<dyn Counter> {
        &self.denominator
    }
}

impl Counter for MeanAverage {
    fn value(&self) -> i64 {
        let _guard = self.lock.lock();
        let denominator = self.denominator.value();
        let numerator = self.numerator.value();
        if denominator > 0 {
            numerator / denominator
        } else {
            numerator
        }
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

impl Increment for MeanAverage {
    fn increment(&self, value: i64) -> i64 {
        if let Some(numerator) = self.numerator.as_increment() {
            numerator.increment(value);
        }
        self.value()
    }
}

impl Decrement for MeanAverage {
    fn decrement(&self, value: i64) -> i64 {
        if let Some(numerator) = self.numerator.as_decrement() {
            numerator.decrement(value);
        }
        self.value()
    }
}

impl Reset for MeanAverage {
    fn reset(&self) {
        let _guard = self.lock.lock();
        if let Some(numerator) = self.numerator.as_reset() {
            numerator.reset();
        }
        if let Some(denominator) = self.denominator.as_reset() {
            denominator.reset();
        }
    }
}

impl Default for MeanAverage {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for MeanAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeanAverage")
            .field("numerator", &self.numerator)
            .field("denominator", &self.denominator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::thread;

    #[test]
    fn test_zero_denominator_reports_numerator() {
        let mean = MeanAverage::new();
        assert_eq!(mean.increment(7), 7);
        assert_eq!(mean.value(), 7);
    }

    #[test]
    fn test_negative_denominator_reports_numerator() {
        let denominator = Arc::new(SumTotal::new());
        let mean = MeanAverage::with_denominator(denominator.clone(), SyncRoot::new());
        denominator.decrement(3);
        mean.increment(9);
        assert_eq!(mean.value(), 9);
    }

    #[test]
    fn test_integer_division() {
        let denominator = Arc::new(SumTotal::new());
        let mean = MeanAverage::with_denominator(denominator.clone(), SyncRoot::new());
        denominator.increment(3);
        assert_eq!(mean.increment(10), 3);
        assert_eq!(mean.decrement(1), 3);
        assert_eq!(mean.decrement(1), 2);
        assert_eq!(mean.numerator().value(), 8);
        assert_eq!(denominator.value(), 3);
    }

    #[test]
    fn test_reset_resets_both_sides_reentrantly() {
        let lock = SyncRoot::new();
        let numerator = Arc::new(SumTotal::with_lock(lock.clone()));
        let denominator = Arc::new(SumTotal::with_lock(lock.clone()));
        let mean = MeanAverage::from_counters(numerator.clone(), denominator.clone(), lock);

        numerator.increment(40);
        denominator.increment(4);
        assert_eq!(mean.value(), 10);

        // reset takes the group lock, then each side takes it again
        mean.reset();
        assert_eq!(numerator.value(), 0);
        assert_eq!(denominator.value(), 0);
        assert_eq!(mean.value(), 0);
    }

    #[test]
    fn test_concurrent_increments() {
        let denominator = Arc::new(SumTotal::new());
        denominator.increment(2);
        let mean = Arc::new(MeanAverage::with_denominator(
            denominator.clone(),
            SyncRoot::new(),
        ));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = Arc::clone(&mean);
                thread::spawn(move || {
                    for _ in 0..500 {
                        m.increment(1);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(mean.numerator().value(), 2000);
        assert_eq!(mean.value(), 1000);
    }

    proptest! {
        #[test]
        fn prop_value_matches_division(numerator in -100_000i64..100_000, denominator in -50i64..50) {
            let lock = SyncRoot::new();
            let n = Arc::new(SumTotal::with_lock(lock.clone()));
            let d = Arc::new(SumTotal::with_lock(lock.clone()));
            let mean = MeanAverage::from_counters(n.clone(), d.clone(), lock);

            n.increment(numerator);
            d.increment(denominator);

            let expected = if denominator > 0 { numerator / denominator } else { numerator };
            prop_assert_eq!(mean.value(), expected);
        }
    }
}
