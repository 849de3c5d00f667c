//! Rate of values per second.

use std::fmt::{self, Debug};
use std::ops::Deref;
use std::sync::Arc;

use crate::counters::elapsed_time::{ElapsedTime, ElapsedTimeUnit};
use crate::counters::mean_average::MeanAverage;
use crate::counters::sum_total::SumTotal;
use crate::counters::{Counter, Decrement, Increment, Reset, SyncRoot};

/// A [`MeanAverage`] of a numerator over the seconds elapsed since creation.
///
/// The denominator is an [`ElapsedTime`] in seconds owned by the rate. It is
/// never advanced by increments, only restarted by [`Reset`]. During the first
/// second the denominator reads `0` and the rate therefore reports the raw
/// numerator.
///
/// Every other behavior, including the return value of increments, is the one
/// of [`MeanAverage`], which is reachable through `Deref`.
///
/// # Examples
///
/// ```rust
/// use categorie::counters::rate_per_second::RatePerSecond;
/// use categorie::counters::sum_total::SumTotal;
/// use categorie::counters::{Counter, Increment, SyncRoot};
/// use std::sync::Arc;
///
/// let lock = SyncRoot::new();
/// let in_total = Arc::new(SumTotal::with_lock(lock.clone()));
/// let in_per_sec = RatePerSecond::with_numerator(in_total.clone(), lock);
///
/// in_total.increment(12);
/// // still inside the first second
/// assert_eq!(in_per_sec.value(), 12);
/// ```
pub struct RatePerSecond {
    mean: MeanAverage,
}

impl RatePerSecond {
    /// Creates a rate over a fresh [`SumTotal`] numerator.
    pub fn new() -> Self {
        Self::with_lock(SyncRoot::new())
    }

    /// Creates a rate over a fresh [`SumTotal`] numerator sharing `lock`.
    pub fn with_lock(lock: SyncRoot) -> Self {
        let numerator = Arc::new(SumTotal::with_lock(lock.clone()));
        Self::with_numerator(numerator, lock)
    }

    /// Creates a rate over the given numerator.
    pub fn with_numerator(numerator: Arc<dyn Counter>, lock: SyncRoot) -> Self {
        let seconds = Arc::new(ElapsedTime::with_unit(ElapsedTimeUnit::Seconds));
        RatePerSecond {
            mean: MeanAverage::from_counters(numerator, seconds, lock),
        }
    }
}

impl Deref for RatePerSecond {
    type Target = MeanAverage;

    fn deref(&self) -> &Self::Target {
        &self.mean
    }
}

impl Counter for RatePerSecond {
    #[inline]
    fn value(&self) -> i64 {
        self.mean.value()
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

impl Increment for RatePerSecond {
    #[inline]
    fn increment(&self, value: i64) -> i64 {
        self.mean.increment(value)
    }
}

impl Decrement for RatePerSecond {
    #[inline]
    fn decrement(&self, value: i64) -> i64 {
        self.mean.decrement(value)
    }
}

impl Reset for RatePerSecond {
    fn reset(&self) {
        self.mean.reset();
    }
}

impl Default for RatePerSecond {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for RatePerSecond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RatePerSecond{{ {}/s }}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_denominator_is_seconds() {
        let rate = RatePerSecond::new();
        assert_eq!(rate.denominator().value(), 0);
        assert!(rate.numerator().as_increment().is_some());
    }

    #[test]
    fn test_first_second_reports_numerator() {
        let rate = RatePerSecond::new();
        assert_eq!(rate.increment(5), 5);
        assert_eq!(rate.decrement(1), 4);
    }

    #[test]
    fn test_rate_after_elapsed_seconds() {
        let rate = RatePerSecond::new();
        rate.increment(100);
        thread::sleep(Duration::from_millis(2_100));
        // two whole seconds have elapsed
        assert_eq!(rate.value(), 50);
    }

    #[test]
    fn test_reset_restarts_denominator() {
        let rate = RatePerSecond::new();
        rate.increment(30);
        thread::sleep(Duration::from_millis(1_100));
        assert_eq!(rate.value(), 30);
        rate.reset();
        assert_eq!(rate.numerator().value(), 0);
        assert_eq!(rate.denominator().value(), 0);
    }

    #[test]
    fn test_shared_numerator() {
        let lock = SyncRoot::new();
        let total = Arc::new(SumTotal::with_lock(lock.clone()));
        let rate = RatePerSecond::with_numerator(total.clone(), lock);
        total.increment(3);
        assert_eq!(rate.value(), 3);
        rate.increment(2);
        assert_eq!(total.value(), 5);
    }
}
