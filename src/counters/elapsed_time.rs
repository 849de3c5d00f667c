//! Elapsed time counter.
//!
//! This module provides [`ElapsedTime`], a read-only counter reporting the
//! time elapsed since its creation (or last reset) in a configurable unit.
//!
//! # Design
//!
//! The start instant is kept in an `AtomicOptionInstant` (from the
//! `atomic-time` crate) so that a reset can restart the clock without
//! taking a lock and without racing concurrent readers.

use atomic_time::AtomicOptionInstant;
use std::fmt::{self, Debug};
use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::counters::{Counter, Reset};

/// Unit of measure for [`ElapsedTime`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ElapsedTimeUnit {
    /// 100-nanosecond ticks.
    Ticks,
    /// Milliseconds (default).
    #[default]
    Milliseconds,
    /// Seconds.
    Seconds,
    /// Minutes.
    Minutes,
    /// Hours.
    Hours,
    /// Days.
    Days,
}

impl ElapsedTimeUnit {
    /// Returns the length of one unit in nanoseconds.
    pub const fn as_nanos(self) -> u128 {
        const MILLI: u128 = 1_000_000;
        match self {
            ElapsedTimeUnit::Ticks => 100,
            ElapsedTimeUnit::Milliseconds => MILLI,
            ElapsedTimeUnit::Seconds => MILLI * 1_000,
            ElapsedTimeUnit::Minutes => MILLI * 1_000 * 60,
            ElapsedTimeUnit::Hours => MILLI * 1_000 * 60 * 60,
            ElapsedTimeUnit::Days => MILLI * 1_000 * 60 * 60 * 24,
        }
    }
}

/// Reports elapsed time since creation or last reset.
///
/// The value is truncated to whole units by integer division, so an
/// `ElapsedTime` in seconds reads `0` during its first second.
///
/// `ElapsedTime` is readable and resettable but neither incrementable nor
/// decrementable. It is the denominator of
/// [`RatePerSecond`](crate::counters::rate_per_second::RatePerSecond).
///
/// # Examples
///
/// ```rust
/// use categorie::counters::elapsed_time::{ElapsedTime, ElapsedTimeUnit};
/// use categorie::counters::{Counter, Reset};
/// use std::thread;
/// use std::time::Duration;
///
/// let uptime = ElapsedTime::with_unit(ElapsedTimeUnit::Milliseconds);
/// thread::sleep(Duration::from_millis(20));
/// assert!(uptime.value() >= 20);
///
/// uptime.reset();
/// assert!(uptime.value() < 20);
/// ```
pub struct ElapsedTime {
    unit: ElapsedTimeUnit,
    started: AtomicOptionInstant,
}

impl ElapsedTime {
    /// Creates a new counter measuring milliseconds, starting now.
    pub fn new() -> Self {
        Self::with_unit(ElapsedTimeUnit::default())
    }

    /// Creates a new counter measuring `unit`, starting now.
    pub fn with_unit(unit: ElapsedTimeUnit) -> Self {
        let started = AtomicOptionInstant::none();
        started.store(Some(Instant::now()), Ordering::Release);
        ElapsedTime { unit, started }
    }

    /// Returns the configured unit of measure.
    pub fn unit(&self) -> ElapsedTimeUnit {
        self.unit
    }

    /// Returns the instant the clock was last (re)started.
    pub fn started_at(&self) -> Option<Instant> {
        self.started.load(Ordering::Acquire)
    }
}

impl Counter for ElapsedTime {
    fn value(&self) -> i64 {
        let Some(started) = self.started_at() else {
            return 0;
        };
        let units = started.elapsed().as_nanos() / self.unit.as_nanos();
        i64::try_from(units).unwrap_or(i64::MAX)
    }

    fn as_reset(&self) -> Option<&dyn Reset> {
        Some(self)
    }
}

impl Reset for ElapsedTime {
    /// Restarts the clock.
    fn reset(&self) {
        self.started.store(Some(Instant::now()), Ordering::Release);
    }
}

impl Default for ElapsedTime {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ElapsedTime{{ {} {:?} }}", self.value(), self.unit)
    }
}
