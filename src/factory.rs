//! Lookup-or-create cache of category instances.
//!
//! The factory maps a category type and an instance name to a shared
//! [`Category`]. It only *finds* categories, it never keeps them alive:
//! entries are weak, so once the application drops its last `Arc` the
//! instance is reclaimed, and the next lookup builds a fresh one.
//!
//! ```text
//!   (TypeId, "gateway.ingress") ──► Weak<Category<Ingress>>
//!   (TypeId, "gateway.egress")  ──► Weak<Category<Ingress>>
//!   (TypeId, "gateway.ingress") ──► Weak<Category<Storage>>   (other type, same name)
//! ```
//!
//! Names are compared ignoring case. Lookups take a read lock; only a miss
//! takes the write lock, and re-checks before creating, so concurrent callers
//! asking for the same instance all receive the same `Arc`.

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::{Arc, OnceLock, Weak};
use tracing::debug;

use crate::category::{Category, CategoryError, CounterSet};

type Key = (TypeId, String);
type Entry = Weak<dyn Any + Send + Sync>;

static GLOBAL: OnceLock<CategoryFactory> = OnceLock::new();

/// A cache of category instances keyed by type and name.
///
/// # Examples
///
/// ```rust
/// use categorie::category::{CounterDescriptor, CounterSet};
/// use categorie::counters::sum_total::SumTotal;
/// use categorie::factory::CategoryFactory;
/// use std::sync::Arc;
///
/// struct Jobs {
///     done: SumTotal,
/// }
///
/// impl CounterSet for Jobs {
///     fn create(_name: &str) -> Self {
///         Jobs { done: SumTotal::new() }
///     }
///
///     fn descriptors() -> Vec<CounterDescriptor<Self>> {
///         vec![CounterDescriptor::new("DoneTotal", |j| &j.done)]
///     }
/// }
///
/// let factory = CategoryFactory::new();
/// let a = factory.get_instance::<Jobs>("Scheduler.Jobs").unwrap();
/// let b = factory.get_instance::<Jobs>("scheduler.jobs").unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Default)]
pub struct CategoryFactory {
    entries: RwLock<HashMap<Key, Entry>>,
}

impl CategoryFactory {
    /// Creates an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide factory.
    pub fn global() -> &'static CategoryFactory {
        GLOBAL.get_or_init(CategoryFactory::new)
    }

    /// Returns the live instance `name` of `T`, creating it if needed.
    pub fn get_instance<T: CounterSet>(&self, name: &str) -> Result<Arc<Category<T>>, CategoryError> {
        let key = (TypeId::of::<T>(), name.to_lowercase());

        if let Some(category) = lookup::<T>(&self.entries.read(), &key) {
            return Ok(category);
        }

        let mut entries = self.entries.write();
        if let Some(category) = lookup::<T>(&entries, &key) {
            return Ok(category);
        }

        let category = Category::<T>::new(name)?;
        entries.retain(|_, entry| entry.strong_count() > 0);
        let erased: Arc<dyn Any + Send + Sync> = category.clone();
        entries.insert(key, Arc::downgrade(&erased));
        debug!(
            category = %name,
            kind = std::any::type_name::<T>(),
            cached = entries.len(),
            "category instance cached"
        );
        Ok(category)
    }

    /// Returns the instance of `T` named after `Owner`.
    ///
    /// See [`instance_name_for`].
    pub fn get_instance_for<T: CounterSet, Owner: ?Sized>(
        &self,
    ) -> Result<Arc<Category<T>>, CategoryError> {
        self.get_instance::<T>(&instance_name_for::<Owner>())
    }

    /// Returns the number of live cached instances.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    /// Returns `true` if no cached instance is alive.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Debug for CategoryFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CategoryFactory{{ {} live }}", self.len())
    }
}

fn lookup<T: CounterSet>(entries: &HashMap<Key, Entry>, key: &Key) -> Option<Arc<Category<T>>> {
    entries
        .get(key)
        .and_then(Weak::upgrade)
        .and_then(|any| any.downcast::<Category<T>>().ok())
}

/// Derives an instance name from a type: its last two path segments, joined
/// with a dot, without generic arguments.
///
/// ```rust
/// use categorie::factory::instance_name_for;
///
/// mod gateway {
///     pub struct Ingress;
/// }
///
/// assert!(instance_name_for::<gateway::Ingress>().ends_with("gateway.Ingress"));
/// assert_eq!(instance_name_for::<Vec<u8>>(), "vec.Vec");
/// ```
pub fn instance_name_for<Owner: ?Sized>() -> String {
    let full = std::any::type_name::<Owner>();
    let path = full.split('<').next().unwrap_or(full);
    let mut segments: Vec<&str> = path.rsplit("::").take(2).collect();
    segments.reverse();
    segments.join(".")
}

/// Returns the instance of `T` named after `Owner` from the global factory.
pub fn category_for<T: CounterSet, Owner: ?Sized>() -> Result<Arc<Category<T>>, CategoryError> {
    CategoryFactory::global().get_instance_for::<T, Owner>()
}
