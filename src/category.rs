//! Named bundles of counters.
//!
//! A category is an application type holding counters, declared once and
//! monitored as a unit. The type implements [`CounterSet`] to say how it is
//! built and which of its counters are published; [`Category`] wraps it with
//! an instance name and a [`Monitor`].
//!
//! # Declaring a category
//!
//! ```rust
//! use categorie::category::{Category, CounterDescriptor, CounterSet};
//! use categorie::counters::delta::Delta;
//! use categorie::counters::rate_per_second::RatePerSecond;
//! use categorie::counters::sum_total::SumTotal;
//! use categorie::counters::{Counter, Increment, SyncRoot};
//! use std::sync::Arc;
//!
//! pub struct Ingress {
//!     pub in_total: Arc<SumTotal>,
//!     pub in_per_sec: RatePerSecond,
//!     pub out_total: Arc<SumTotal>,
//!     pub pending: Delta,
//! }
//!
//! impl CounterSet for Ingress {
//!     fn create(_name: &str) -> Self {
//!         let lock = SyncRoot::new();
//!         let in_total = Arc::new(SumTotal::with_lock(lock.clone()));
//!         let out_total = Arc::new(SumTotal::with_lock(lock.clone()));
//!         Ingress {
//!             in_per_sec: RatePerSecond::with_numerator(in_total.clone(), lock.clone()),
//!             pending: Delta::from_counters(in_total.clone(), out_total.clone(), lock),
//!             in_total,
//!             out_total,
//!         }
//!     }
//!
//!     fn descriptors() -> Vec<CounterDescriptor<Self>> {
//!         vec![
//!             CounterDescriptor::new("InTotal", |c| &*c.in_total),
//!             CounterDescriptor::new("InPerSec", |c| &c.in_per_sec),
//!             CounterDescriptor::new("OutTotal", |c| &*c.out_total),
//!             CounterDescriptor::new("PendingCount", |c| &c.pending),
//!         ]
//!     }
//! }
//!
//! let ingress = Category::<Ingress>::new("Gateway.Ingress").unwrap();
//! ingress.in_total.increment(3);
//! ingress.out_total.increment(1);
//!
//! let snapshot = ingress.monitor().try_get_snapshot().unwrap();
//! assert_eq!(snapshot.get("PendingCount"), Some(2));
//! ```
//!
//! # Validation
//!
//! The shape of a category is checked when it is built: it must publish at
//! least one counter, every counter must be named, and names must be unique
//! ignoring case. A category that breaks these rules is a programming error
//! and fails construction with a [`CategoryError`].

use std::collections::HashSet;
use std::fmt::{self, Debug};
use std::ops::Deref;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::counters::Counter;
use crate::monitor::{Monitor, MonitorConfig};

/// Construction-time errors of a [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CategoryError {
    /// The category publishes no counter.
    #[error("category type `{category}` does not publish any counters")]
    EmptyCategory {
        /// Type name of the category.
        category: &'static str,
    },

    /// A published counter has an empty name.
    #[error("category type `{category}` publishes a counter without a name")]
    UnnamedCounter {
        /// Type name of the category.
        category: &'static str,
    },

    /// Two published counters share a name, ignoring case.
    #[error("category type `{category}` publishes counter `{counter}` more than once")]
    DuplicateCounter {
        /// Type name of the category.
        category: &'static str,
        /// The repeated counter name.
        counter: &'static str,
    },
}

/// A type whose counters are published as a category.
pub trait CounterSet: Send + Sync + Sized + 'static {
    /// Builds the counters of the instance named `name`.
    fn create(name: &str) -> Self;

    /// Lists the published counters in snapshot order.
    fn descriptors() -> Vec<CounterDescriptor<Self>>;
}

/// A published counter: its name and how to reach it.
pub struct CounterDescriptor<T> {
    name: &'static str,
    accessor: fn(&T) -> &dyn Counter,
}

impl<T> CounterDescriptor<T> {
    /// Creates a descriptor.
    pub const fn new(name: &'static str, accessor: fn(&T) -> &dyn Counter) -> Self {
        Self { name, accessor }
    }

    /// Returns the published name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Resolves the counter within `set`.
    pub fn counter<'a>(&self, set: &'a T) -> &'a dyn Counter {
        (self.accessor)(set)
    }
}

impl<T> Clone for CounterDescriptor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for CounterDescriptor<T> {}

impl<T> Debug for CounterDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CounterDescriptor({})", self.name)
    }
}

fn validate<T: CounterSet>(
    descriptors: &[CounterDescriptor<T>],
) -> Result<(), CategoryError> {
    let category = std::any::type_name::<T>();
    if descriptors.is_empty() {
        return Err(CategoryError::EmptyCategory { category });
    }
    let mut seen = HashSet::with_capacity(descriptors.len());
    for descriptor in descriptors {
        if descriptor.name.trim().is_empty() {
            return Err(CategoryError::UnnamedCounter { category });
        }
        if !seen.insert(descriptor.name.to_lowercase()) {
            return Err(CategoryError::DuplicateCounter {
                category,
                counter: descriptor.name,
            });
        }
    }
    Ok(())
}

/// A named instance of a [`CounterSet`], together with its [`Monitor`].
///
/// Categories are always handled through `Arc`: the monitor holds a weak
/// back-reference, so dropping the last `Arc` stops sampling and releases
/// every observer.
///
/// `Category<T>` dereferences to `T`, so counters are reached directly:
/// `category.in_total.increment(1)`.
pub struct Category<T: CounterSet> {
    name: String,
    set: T,
    monitor: Monitor<T>,
}

impl<T: CounterSet> Category<T> {
    /// Builds the instance `name` with the default monitor configuration.
    pub fn new(name: &str) -> Result<Arc<Self>, CategoryError> {
        Self::with_config(name, MonitorConfig::default())
    }

    /// Builds the instance `name` with the given monitor configuration.
    pub fn with_config(name: &str, config: MonitorConfig) -> Result<Arc<Self>, CategoryError> {
        let descriptors = T::descriptors();
        validate(&descriptors)?;

        let category = Arc::new_cyclic(|weak| Category {
            name: name.to_string(),
            set: T::create(name),
            monitor: Monitor::new(weak.clone(), name.to_string(), descriptors, config),
        });
        debug!(
            category = %name,
            kind = std::any::type_name::<T>(),
            "category created"
        );
        Ok(category)
    }

    /// Returns the instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the monitor of this instance.
    pub fn monitor(&self) -> &Monitor<T> {
        &self.monitor
    }

    /// Returns the published counters in snapshot order.
    pub fn counters(&self) -> Vec<(&'static str, &dyn Counter)> {
        T::descriptors()
            .into_iter()
            .map(|d| (d.name(), d.counter(&self.set)))
            .collect()
    }

    /// Resets every published counter that supports it.
    ///
    /// Counters shared by several published counters may be reset more than
    /// once; resetting is idempotent.
    pub fn reset(&self) {
        for (_, counter) in self.counters() {
            if let Some(counter) = counter.as_reset() {
                counter.reset();
            }
        }
    }
}

impl<T: CounterSet> Deref for Category<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.set
    }
}

impl<T: CounterSet> Debug for Category<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, counter) in self.counters() {
            map.entry(&name, &counter.value());
        }
        map.finish()?;
        write!(f, " @ {}", self.name)
    }
}
