//! Snapshot scheduling for a category.
//!
//! Every [`Category`] owns exactly one [`Monitor`]. The monitor multiplexes any
//! number of observers, each with its own interval, over a single sampling
//! loop:
//!
//! ```text
//!   add_observer ──► ┌──────────┐  wait (≤ min interval)  ┌────────────────┐
//!                    │ schedule │ ──────────────────────► │ sampling loop  │
//!   remove_observer ►│ (Mutex)  │ ◄── reschedule due ──── │ (one thread)   │
//!                    └──────────┘                         └───────┬────────┘
//!                                                                 │ one snapshot
//!                                                                 ▼
//!                                                  due observers, called in turn
//! ```
//!
//! # Lifecycle
//!
//! The loop starts with the first observer and exits on its own once the
//! observer list drains; adding an observer afterwards restarts it.
//! [`Monitor::shutdown`] stops it explicitly, and dropping the category does
//! the same.
//!
//! # Timing
//!
//! An observer is never called before its interval has elapsed since it was
//! added or last called. It may be called late: a snapshot is taken only when
//! at least one observer is due, and every observer due at that moment shares
//! it. Intervals below the configured floor (never less than 100ms) are
//! raised to the floor, and intervals above [`MAX_INTERVAL`] are lowered to it.
//!
//! # Failures
//!
//! Observers run on the sampling thread. An observer returning an error, or
//! panicking, is reported through [`report_failure`](crate::report::report_failure)
//! and stays registered; the other due observers still receive the snapshot.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::fmt::{self, Debug};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

use crate::category::{Category, CounterDescriptor, CounterSet};
use crate::observers::{self, ObserverError};
use crate::report::report_failure;
use crate::snapshot::{CounterSnapshot, Snapshot};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest accepted observer interval.
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// Largest accepted observer interval: one year.
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Interval used by [`Monitor::add_observer_default`].
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Errors raised by a [`Monitor`].
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The sampling thread could not be started.
    #[error("failed to spawn sampling thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The category owning the monitor has been dropped.
    #[error("category has been reclaimed")]
    CategoryReclaimed,
}

/// Configuration for a category's [`Monitor`].
///
/// # Examples
///
/// ```rust
/// use categorie::monitor::MonitorConfig;
/// use std::time::Duration;
///
/// let config = MonitorConfig::default()
///     .with_default_interval(Duration::from_secs(5))
///     .with_thread_name_prefix("metrics");
/// assert_eq!(config.min_interval, Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MonitorConfig {
    /// Floor applied to every observer interval, never below [`MIN_INTERVAL`].
    pub min_interval: Duration,
    /// Interval used when an observer is added without one.
    pub default_interval: Duration,
    /// Prefix of the sampling thread name, followed by `-{category}`.
    pub thread_name_prefix: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            min_interval: MIN_INTERVAL,
            default_interval: DEFAULT_INTERVAL,
            thread_name_prefix: "categorie".to_string(),
        }
    }
}

impl MonitorConfig {
    /// Sets the floor applied to every observer interval.
    ///
    /// The floor can be raised but not lowered below [`MIN_INTERVAL`].
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval.clamp(MIN_INTERVAL, MAX_INTERVAL);
        self
    }

    /// Sets the interval used by [`Monitor::add_observer_default`].
    pub fn with_default_interval(mut self, interval: Duration) -> Self {
        self.default_interval = interval;
        self
    }

    /// Sets the prefix of the sampling thread name.
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }
}

type Callback = dyn Fn(&Snapshot) -> observers::Result<()> + Send + Sync;

/// A snapshot callback with a stable identity.
///
/// Clones of an `Observer` are the *same* observer: registering a clone
/// replaces the earlier registration, and any clone can remove it. Two
/// observers built from identical closures are different observers.
///
/// # Examples
///
/// ```rust
/// use categorie::monitor::Observer;
///
/// let a = Observer::new(|snapshot| println!("{:?}", snapshot.get("InTotal")));
/// let b = a.clone();
/// let c = Observer::new(|_| {});
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// ```
#[derive(Clone)]
pub struct Observer {
    callback: Arc<Callback>,
}

impl Observer {
    /// Wraps an infallible callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        Self::fallible(move |snapshot| {
            callback(snapshot);
            Ok(())
        })
    }

    /// Wraps a callback whose errors are reported by the monitor.
    pub fn fallible<F>(callback: F) -> Self
    where
        F: Fn(&Snapshot) -> observers::Result<()> + Send + Sync + 'static,
    {
        Observer {
            callback: Arc::new(callback),
        }
    }

    /// Invokes the callback with `snapshot`.
    pub fn notify(&self, snapshot: &Snapshot) -> observers::Result<()> {
        (self.callback)(snapshot)
    }
}

impl PartialEq for Observer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.callback, &other.callback)
    }
}

impl Eq for Observer {}

impl Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Observer({:p})", Arc::as_ptr(&self.callback))
    }
}

struct Registration {
    observer: Observer,
    interval: Duration,
    next_due: Instant,
}

struct Schedule {
    registrations: Vec<Registration>,
    min_interval: Duration,
    running: bool,
    // bumped on every start and shutdown; a loop exits once it no longer matches
    epoch: u64,
    handle: Option<JoinHandle<()>>,
}

impl Schedule {
    // Replaces any earlier registration of the same observer.
    fn register(&mut self, observer: &Observer, interval: Duration, now: Instant) {
        let next_due = now + interval;
        self.unregister(observer);
        self.registrations.push(Registration {
            observer: observer.clone(),
            interval,
            next_due,
        });
        self.recompute_min_interval();
    }

    fn unregister(&mut self, observer: &Observer) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.observer != *observer);
        self.registrations.len() != before
    }

    fn recompute_min_interval(&mut self) {
        if let Some(min) = self.registrations.iter().map(|r| r.interval).min() {
            self.min_interval = min;
        }
    }
}

struct Shared {
    schedule: Mutex<Schedule>,
    wake: Condvar,
}

/// Background sampler of one category.
///
/// Obtained through [`Category::monitor`]. See the [module docs](self) for
/// the scheduling model.
pub struct Monitor<T: CounterSet> {
    category: Weak<Category<T>>,
    name: String,
    descriptors: Vec<CounterDescriptor<T>>,
    config: MonitorConfig,
    shared: Arc<Shared>,
}

impl<T: CounterSet> Monitor<T> {
    pub(crate) fn new(
        category: Weak<Category<T>>,
        name: String,
        descriptors: Vec<CounterDescriptor<T>>,
        mut config: MonitorConfig,
    ) -> Self {
        // struct literals and deserialized configs bypass the builder
        config.min_interval = config.min_interval.clamp(MIN_INTERVAL, MAX_INTERVAL);
        let shared = Arc::new(Shared {
            schedule: Mutex::new(Schedule {
                registrations: Vec::new(),
                min_interval: config.default_interval.clamp(config.min_interval, MAX_INTERVAL),
                running: false,
                epoch: 0,
                handle: None,
            }),
            wake: Condvar::new(),
        });
        Monitor {
            category,
            name,
            descriptors,
            config,
            shared,
        }
    }

    /// Returns the monitor configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Registers `observer` to receive a snapshot every `interval`.
    ///
    /// The interval is raised to the configured floor and capped at
    /// [`MAX_INTERVAL`]. Registering an observer that is already registered
    /// replaces its interval and restarts its schedule. Starts the sampling
    /// loop if it is not running; if that fails, the observer is not
    /// registered.
    pub fn add_observer(&self, observer: &Observer, interval: Duration) -> Result<(), MonitorError> {
        let interval = interval.clamp(self.config.min_interval, MAX_INTERVAL);
        let finished = {
            let mut schedule = self.shared.schedule.lock();
            let previous_min = schedule.min_interval;
            schedule.register(observer, interval, Instant::now());

            let finished = if schedule.running {
                None
            } else {
                match self.start(&mut schedule) {
                    Ok(finished) => finished,
                    Err(err) => {
                        schedule.unregister(observer);
                        schedule.min_interval = previous_min;
                        schedule.recompute_min_interval();
                        return Err(err);
                    }
                }
            };
            self.shared.wake.notify_all();
            finished
        };

        if let Some(handle) = finished {
            join_unless_current(handle);
        }
        Ok(())
    }

    /// Registers `observer` with the configured default interval (1s unless configured).
    pub fn add_observer_default(&self, observer: &Observer) -> Result<(), MonitorError> {
        self.add_observer(observer, self.config.default_interval)
    }

    /// Unregisters `observer`, returning `true` if it was registered.
    ///
    /// Removing an unknown observer is a no-op.
    pub fn remove_observer(&self, observer: &Observer) -> bool {
        let mut schedule = self.shared.schedule.lock();
        let removed = schedule.unregister(observer);
        if removed {
            schedule.recompute_min_interval();
            self.shared.wake.notify_all();
        }
        removed
    }

    /// Returns the number of registered observers.
    pub fn observer_count(&self) -> usize {
        self.shared.schedule.lock().registrations.len()
    }

    /// Returns the smallest interval among registered observers.
    ///
    /// Once the last observer is removed, the previous value is kept.
    pub fn min_interval(&self) -> Duration {
        self.shared.schedule.lock().min_interval
    }

    /// Returns `true` while the sampling loop is running.
    pub fn is_sampling(&self) -> bool {
        self.shared.schedule.lock().running
    }

    /// Captures the current value of every declared counter.
    ///
    /// Returns `None`, and reports the failure, if the category has been
    /// dropped.
    pub fn try_get_snapshot(&self) -> Option<Snapshot> {
        let Some(category) = self.category.upgrade() else {
            report_failure(&self.name, &MonitorError::CategoryReclaimed);
            return None;
        };
        let counters = self
            .descriptors
            .iter()
            .map(|d| CounterSnapshot::new(d.name(), d.counter(&category).value()))
            .collect();
        Some(Snapshot::new(category.name(), counters))
    }

    /// Unregisters every observer and stops the sampling loop.
    ///
    /// Blocks until the loop has exited, unless called from an observer
    /// running on the loop itself. Observers may be added again afterwards.
    pub fn shutdown(&self) {
        let handle = {
            let mut schedule = self.shared.schedule.lock();
            schedule.registrations.clear();
            schedule.running = false;
            schedule.epoch = schedule.epoch.wrapping_add(1);
            self.shared.wake.notify_all();
            schedule.handle.take()
        };

        if let Some(handle) = handle {
            join_unless_current(handle);
            debug!(category = %self.name, "category monitor shut down");
        }
    }

    // Spawns a loop, handing back the handle of the previous one.
    fn start(&self, schedule: &mut Schedule) -> Result<Option<JoinHandle<()>>, MonitorError> {
        let category = self.category.clone();
        let shared = Arc::clone(&self.shared);
        let name = self.name.clone();
        let epoch = schedule.epoch.wrapping_add(1);

        if spawn_refused() {
            return Err(std::io::Error::other("spawn refused").into());
        }

        let handle = thread::Builder::new()
            .name(format!("{}-{}", self.config.thread_name_prefix, self.name))
            .spawn(move || sampling_loop(category, shared, name, epoch))?;

        schedule.epoch = epoch;
        schedule.running = true;
        Ok(schedule.handle.replace(handle))
    }
}

impl<T: CounterSet> Drop for Monitor<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<T: CounterSet> Debug for Monitor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schedule = self.shared.schedule.lock();
        f.debug_struct("Monitor")
            .field("category", &self.name)
            .field("observers", &schedule.registrations.len())
            .field("min_interval", &schedule.min_interval)
            .field("running", &schedule.running)
            .finish()
    }
}

#[cfg(test)]
fn spawn_refused() -> bool {
    tests::REFUSE_SPAWN.with(|refuse| refuse.replace(false))
}

#[cfg(not(test))]
fn spawn_refused() -> bool {
    false
}

fn join_unless_current(handle: JoinHandle<()>) {
    if handle.thread().id() != thread::current().id() {
        let _ = handle.join();
    }
}

fn sampling_loop<T: CounterSet>(
    category: Weak<Category<T>>,
    shared: Arc<Shared>,
    name: String,
    epoch: u64,
) {
    debug!(category = %name, "sampling loop started");
    let mut schedule = shared.schedule.lock();

    loop {
        if schedule.epoch != epoch {
            break;
        }
        let now = Instant::now();
        let Some(earliest) = schedule.registrations.iter().map(|r| r.next_due).min() else {
            break;
        };

        if earliest > now {
            let timeout = (earliest - now).min(schedule.min_interval);
            shared.wake.wait_for(&mut schedule, timeout);
            continue;
        }

        let due: Vec<Observer> = schedule
            .registrations
            .iter()
            .filter(|r| r.next_due <= now)
            .map(|r| r.observer.clone())
            .collect();

        let alive = MutexGuard::unlocked(&mut schedule, || {
            let Some(owner) = category.upgrade() else {
                report_failure(&name, &MonitorError::CategoryReclaimed);
                return false;
            };
            let snapshot = owner.monitor().try_get_snapshot();
            // never extend the category's lifetime across observer calls
            drop(owner);

            if let Some(snapshot) = snapshot {
                for observer in &due {
                    deliver(&name, observer, &snapshot);
                }
            }
            true
        });

        if !alive {
            if schedule.epoch == epoch {
                schedule.registrations.clear();
            }
            break;
        }

        let delivered = Instant::now();
        for registration in schedule.registrations.iter_mut() {
            if due.contains(&registration.observer) {
                registration.next_due = delivered + registration.interval;
            }
        }
    }

    if schedule.epoch == epoch {
        schedule.running = false;
    }
    drop(schedule);
    debug!(category = %name, "sampling loop stopped");
}

fn deliver(category: &str, observer: &Observer, snapshot: &Snapshot) {
    match panic::catch_unwind(AssertUnwindSafe(|| observer.notify(snapshot))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => report_failure(category, &err),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            report_failure(category, &ObserverError::Panicked(message));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::sum_total::SumTotal;
    use crate::counters::{Counter, Increment};
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    thread_local! {
        // makes the next sampling thread spawn on this thread fail
        pub(super) static REFUSE_SPAWN: Cell<bool> = const { Cell::new(false) };
    }

    struct Probe {
        hits: SumTotal,
    }

    impl CounterSet for Probe {
        fn create(_name: &str) -> Self {
            Probe {
                hits: SumTotal::new(),
            }
        }

        fn descriptors() -> Vec<CounterDescriptor<Self>> {
            vec![CounterDescriptor::new("Hits", |p| &p.hits)]
        }
    }

    fn probe(name: &str) -> Arc<Category<Probe>> {
        Category::<Probe>::new(name).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.min_interval, Duration::from_millis(100));
        assert_eq!(config.default_interval, Duration::from_secs(1));
        assert_eq!(config.thread_name_prefix, "categorie");
    }

    #[test]
    fn test_observer_identity() {
        let a = Observer::new(|_| {});
        let b = a.clone();
        let c = Observer::new(|_| {});
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_try_get_snapshot() {
        let category = probe("Monitor.Snapshot");
        category.hits.increment(3);
        let snapshot = category.monitor().try_get_snapshot().unwrap();
        assert_eq!(snapshot.category, "Monitor.Snapshot");
        assert_eq!(snapshot.get("Hits"), Some(3));
        assert!(!category.monitor().is_sampling());
    }

    #[test]
    fn test_interval_is_clamped() {
        let category = probe("Monitor.Clamp");
        let observer = Observer::new(|_| {});
        category
            .monitor()
            .add_observer(&observer, Duration::from_millis(1))
            .unwrap();
        assert_eq!(category.monitor().min_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_min_interval_floor() {
        let config = MonitorConfig::default().with_min_interval(Duration::ZERO);
        assert_eq!(config.min_interval, MIN_INTERVAL);
        let config = MonitorConfig::default().with_min_interval(Duration::from_millis(250));
        assert_eq!(config.min_interval, Duration::from_millis(250));

        let config = MonitorConfig {
            min_interval: Duration::ZERO,
            ..MonitorConfig::default()
        };
        let category = Category::<Probe>::with_config("Monitor.ZeroFloor", config).unwrap();
        let monitor = category.monitor();
        assert_eq!(monitor.config().min_interval, MIN_INTERVAL);

        let calls = Arc::new(AtomicUsize::new(0));
        let observer = {
            let calls = Arc::clone(&calls);
            Observer::new(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };
        monitor.add_observer(&observer, Duration::ZERO).unwrap();
        assert_eq!(monitor.min_interval(), MIN_INTERVAL);

        thread::sleep(Duration::from_millis(350));
        monitor.shutdown();
        // due at 100, 200 and 300ms at the earliest
        assert!(calls.load(Ordering::SeqCst) <= 3);
    }

    #[test]
    fn test_huge_interval_is_capped() {
        let category = probe("Monitor.Huge");
        let monitor = category.monitor();
        let observer = Observer::new(|_| {});

        monitor.add_observer(&observer, Duration::MAX).unwrap();
        assert_eq!(monitor.observer_count(), 1);
        assert_eq!(monitor.min_interval(), MAX_INTERVAL);

        // replacing a registration with a huge interval keeps it
        monitor.add_observer(&observer, Duration::MAX).unwrap();
        assert_eq!(monitor.observer_count(), 1);
        assert!(monitor.is_sampling());

        monitor.shutdown();
        assert!(!monitor.is_sampling());
    }

    #[test]
    fn test_huge_default_interval() {
        let config = MonitorConfig::default().with_default_interval(Duration::MAX);
        let category = Category::<Probe>::with_config("Monitor.HugeDefault", config).unwrap();
        let observer = Observer::new(|_| {});
        category.monitor().add_observer_default(&observer).unwrap();
        assert_eq!(category.monitor().min_interval(), MAX_INTERVAL);
        category.monitor().shutdown();
    }

    #[test]
    fn test_failed_start_leaves_no_registration() {
        let category = probe("Monitor.SpawnFailure");
        let monitor = category.monitor();
        let observer = Observer::new(|_| {});

        REFUSE_SPAWN.with(|refuse| refuse.set(true));
        let err = monitor
            .add_observer(&observer, Duration::from_millis(300))
            .unwrap_err();
        assert!(matches!(err, MonitorError::Spawn(_)));
        assert_eq!(monitor.observer_count(), 0);
        assert!(!monitor.is_sampling());
        assert_eq!(monitor.min_interval(), DEFAULT_INTERVAL);

        // the next attempt spawns normally
        monitor.add_observer(&observer, Duration::from_millis(300)).unwrap();
        assert_eq!(monitor.observer_count(), 1);
        assert!(monitor.is_sampling());
        monitor.shutdown();
    }

    #[test]
    fn test_re_add_replaces_registration() {
        let category = probe("Monitor.Replace");
        let monitor = category.monitor();
        let observer = Observer::new(|_| {});

        monitor.add_observer(&observer, Duration::from_millis(200)).unwrap();
        monitor.add_observer(&observer.clone(), Duration::from_millis(700)).unwrap();

        assert_eq!(monitor.observer_count(), 1);
        assert_eq!(monitor.min_interval(), Duration::from_millis(700));
    }

    #[test]
    fn test_remove_keeps_last_min_interval() {
        let category = probe("Monitor.Remove");
        let monitor = category.monitor();
        let fast = Observer::new(|_| {});
        let slow = Observer::new(|_| {});

        monitor.add_observer(&fast, Duration::from_millis(150)).unwrap();
        monitor.add_observer(&slow, Duration::from_millis(900)).unwrap();
        assert_eq!(monitor.min_interval(), Duration::from_millis(150));

        assert!(monitor.remove_observer(&fast));
        assert_eq!(monitor.min_interval(), Duration::from_millis(900));

        assert!(monitor.remove_observer(&slow));
        assert_eq!(monitor.min_interval(), Duration::from_millis(900));
        assert!(!monitor.remove_observer(&slow));
    }

    #[test]
    fn test_default_interval() {
        let config = MonitorConfig::default().with_default_interval(Duration::from_millis(400));
        let category = Category::<Probe>::with_config("Monitor.Default", config).unwrap();
        let observer = Observer::new(|_| {});
        category.monitor().add_observer_default(&observer).unwrap();
        assert_eq!(category.monitor().min_interval(), Duration::from_millis(400));
    }

    #[test]
    fn test_delivers_and_idles_after_drain() {
        let category = probe("Monitor.Deliver");
        category.hits.increment(7);

        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let observer = Observer::new(move |snapshot| {
            let _ = tx.lock().send(snapshot.get("Hits"));
        });

        let monitor = category.monitor();
        monitor.add_observer(&observer, Duration::from_millis(100)).unwrap();
        assert!(monitor.is_sampling());

        let value = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(value, Some(7));

        monitor.remove_observer(&observer);
        let deadline = Instant::now() + Duration::from_secs(5);
        while monitor.is_sampling() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!monitor.is_sampling());

        // restarts on the next registration
        monitor.add_observer(&observer, Duration::from_millis(100)).unwrap();
        assert!(monitor.is_sampling());
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_never_fires_early() {
        let category = probe("Monitor.Early");
        let added = Instant::now();
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let observer = Observer::new(move |_| {
            let _ = tx.lock().send(Instant::now());
        });

        category
            .monitor()
            .add_observer(&observer, Duration::from_millis(300))
            .unwrap();
        let fired = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(fired.duration_since(added) >= Duration::from_millis(300));
    }

    #[test]
    fn test_failing_observers_do_not_stop_delivery() {
        let category = probe("Monitor.Failures");
        let monitor = category.monitor();

        let failing = Observer::fallible(|_| Err(ObserverError::Observer("nope".into())));
        let panicking = Observer::new(|_| panic!("observer exploded"));
        let calls = Arc::new(AtomicUsize::new(0));
        let healthy = {
            let calls = Arc::clone(&calls);
            Observer::new(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };

        monitor.add_observer(&failing, Duration::from_millis(100)).unwrap();
        monitor.add_observer(&panicking, Duration::from_millis(100)).unwrap();
        monitor.add_observer(&healthy, Duration::from_millis(100)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while calls.load(Ordering::SeqCst) < 2 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        assert!(calls.load(Ordering::SeqCst) >= 2);
        assert!(monitor.is_sampling());
        assert_eq!(monitor.observer_count(), 3);
    }

    #[test]
    fn test_shutdown_stops_loop() {
        let category = probe("Monitor.Shutdown");
        let monitor = category.monitor();
        let observer = Observer::new(|_| {});
        monitor.add_observer(&observer, Duration::from_millis(100)).unwrap();

        monitor.shutdown();
        assert!(!monitor.is_sampling());
        assert_eq!(monitor.observer_count(), 0);

        // idempotent
        monitor.shutdown();
    }

    #[test]
    fn test_shutdown_from_observer() {
        let category = probe("Monitor.SelfShutdown");
        let weak = Arc::downgrade(&category);
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let observer = Observer::new(move |_| {
            if let Some(category) = weak.upgrade() {
                category.monitor().shutdown();
            }
            let _ = tx.lock().send(());
        });

        category
            .monitor()
            .add_observer(&observer, Duration::from_millis(100))
            .unwrap();
        rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while category.monitor().is_sampling() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(!category.monitor().is_sampling());
    }

    #[test]
    fn test_drop_category_stops_loop() {
        let category = probe("Monitor.Drop");
        let (tx, rx) = mpsc::channel::<()>();
        let tx = Mutex::new(tx);
        let observer = Observer::new(move |_| {
            let _ = tx.lock().send(());
        });
        category
            .monitor()
            .add_observer(&observer, Duration::from_millis(100))
            .unwrap();
        drop(observer);
        rx.recv_timeout(Duration::from_secs(5)).unwrap();

        drop(category);
        // the registration (and its sender) is released once the loop is gone
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match rx.recv_timeout(Duration::from_millis(50)) {
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
                _ if Instant::now() > deadline => panic!("sampling loop still alive"),
                _ => {}
            }
        }
    }

    #[test]
    fn test_thread_name() {
        let config = MonitorConfig::default().with_thread_name_prefix("probe");
        let category = Category::<Probe>::with_config("Named", config).unwrap();
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let observer = Observer::new(move |_| {
            let _ = tx.lock().send(thread::current().name().map(str::to_string));
        });
        category
            .monitor()
            .add_observer(&observer, Duration::from_millis(100))
            .unwrap();
        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("probe-Named"));
    }

    #[test]
    fn test_counter_values_are_live() {
        let category = probe("Monitor.Live");
        assert_eq!(category.hits.value(), 0);
        category.hits.increment(1);
        assert_eq!(category.monitor().try_get_snapshot().unwrap().get("Hits"), Some(1));
    }
}
