//! Point-in-time captures of a category's counters.
//!
//! A [`Snapshot`] is what every observer receives: the category name, the
//! capture time, and one [`CounterSnapshot`] per declared counter in
//! declaration order.
//!
//! # Feature Flag
//!
//! Both types derive `Serialize`/`Deserialize` when the `serde` feature is
//! enabled:
//!
//! ```toml
//! [dependencies]
//! categorie = { version = "0.1", features = ["serde"] }
//! ```
//!
//! # Examples
//!
//! ```rust
//! use categorie::snapshot::{CounterSnapshot, Snapshot};
//!
//! let snapshot = Snapshot::with_timestamp(
//!     "Ingress.Gateway",
//!     vec![
//!         CounterSnapshot::new("InTotal", 1000),
//!         CounterSnapshot::new("ErrorsTotal", 5),
//!     ],
//!     1_700_000_000_000,
//! );
//!
//! assert_eq!(snapshot.get("InTotal"), Some(1000));
//! assert_eq!(snapshot.get("intotal"), None);
//! ```

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The value of a single counter at capture time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CounterSnapshot {
    /// The declared name of the counter.
    pub name: String,
    /// The value of the counter.
    pub value: i64,
}

impl CounterSnapshot {
    /// Creates a new counter snapshot.
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// The values of every counter of one category, captured together.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Snapshot {
    /// The instance name of the category.
    pub category: String,
    /// Capture time in milliseconds since Unix epoch.
    pub timestamp_ms: u64,
    /// The counter values, in declaration order.
    pub counters: Vec<CounterSnapshot>,
}

impl Snapshot {
    /// Creates a snapshot stamped with the current time.
    pub fn new(category: impl Into<String>, counters: Vec<CounterSnapshot>) -> Self {
        Self::with_timestamp(category, counters, current_timestamp_ms())
    }

    /// Creates a snapshot with an explicit timestamp.
    pub fn with_timestamp(
        category: impl Into<String>,
        counters: Vec<CounterSnapshot>,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            category: category.into(),
            timestamp_ms,
            counters,
        }
    }

    /// Returns the value of the counter named `name` (exact match).
    pub fn get(&self, name: &str) -> Option<i64> {
        self.counters
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value)
    }

    /// Iterates over the counter snapshots in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, CounterSnapshot> {
        self.counters.iter()
    }

    /// Returns the number of counters captured.
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Returns `true` if no counter was captured.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Returns the counters as a name-ordered map.
    pub fn to_map(&self) -> BTreeMap<String, i64> {
        self.counters
            .iter()
            .map(|c| (c.name.clone(), c.value))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a CounterSnapshot;
    type IntoIter = std::slice::Iter<'a, CounterSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Returns the current timestamp in milliseconds since Unix epoch.
pub(crate) fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
