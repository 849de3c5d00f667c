//! # Categorie - Composable Runtime Counters in Monitored Categories
//!
//! A Rust library for instrumenting a running service with a small set of
//! composable counters, grouping them into named **categories**, and
//! periodically delivering point-in-time snapshots of each category to any
//! number of observers.
//!
//! ## The Model
//!
//! ```text
//!   application threads                    sampling thread (one per category)
//!   ───────────────────                    ──────────────────────────────────
//!   in_total.increment(1) ─┐
//!   out_total.increment(1) ├─► Category<Ingress> ──► Monitor ──► Snapshot ──► observers
//!   latency.increment(ms) ─┘        ▲                                      (table, JSON,
//!                                   │                                       callbacks)
//!                         CategoryFactory (weak cache)
//! ```
//!
//! 1. **Counters** are the primitives. Each one exposes a readable `i64` and
//!    optionally supports increment, decrement and reset.
//! 2. **Derived counters** compose other counters: a [`Delta`](counters::delta::Delta)
//!    is `in - out`, a [`RatePerSecond`](counters::rate_per_second::RatePerSecond)
//!    divides a total by elapsed seconds. Counters that must be read together
//!    share a [`SyncRoot`](counters::SyncRoot).
//! 3. **Categories** bundle counters under a name, see [`category`].
//! 4. **Monitors** sample a category on a schedule and hand the snapshot to
//!    observers, see [`monitor`].
//!
//! ## Available Counter Types
//!
//! | Type | Value | Typical use |
//! |------|-------|-------------|
//! | [`SumTotal`](counters::sum_total::SumTotal) | Running sum | Request totals, bytes sent |
//! | [`ElapsedTime`](counters::elapsed_time::ElapsedTime) | Time since start/reset, in a unit | Uptime |
//! | [`ObservedValue`](counters::observed_value::ObservedValue) | Last, minimum or maximum observation | Queue depth, peak latency |
//! | [`Delta`](counters::delta::Delta) | Minuend minus subtrahend | In-flight requests |
//! | [`MeanAverage`](counters::mean_average::MeanAverage) | Numerator over denominator | Average latency, error ratio |
//! | [`MedianAverage`](counters::median_average::MedianAverage) | Median of all observations | Typical payload size |
//! | [`MovingAverage`](counters::moving_average::MovingAverage) | Mean of the last N observations | Recent latency |
//! | [`RatePerSecond`](counters::rate_per_second::RatePerSecond) | Total over elapsed seconds | Throughput |
//! | [`CompositeCounter`](counters::composite::CompositeCounter) | Fans updates out to members | One call, many counters |
//!
//! ## Quick Start
//!
//! ```rust
//! use categorie::category::{CounterDescriptor, CounterSet};
//! use categorie::counters::moving_average::MovingAverage;
//! use categorie::counters::sum_total::SumTotal;
//! use categorie::counters::Increment;
//! use categorie::factory::CategoryFactory;
//! use categorie::monitor::Observer;
//! use std::time::Duration;
//!
//! struct Http {
//!     requests: SumTotal,
//!     latency_ms: MovingAverage,
//! }
//!
//! impl CounterSet for Http {
//!     fn create(_name: &str) -> Self {
//!         Http {
//!             requests: SumTotal::new(),
//!             latency_ms: MovingAverage::with_capacity(16),
//!         }
//!     }
//!
//!     fn descriptors() -> Vec<CounterDescriptor<Self>> {
//!         vec![
//!             CounterDescriptor::new("RequestsTotal", |h| &h.requests),
//!             CounterDescriptor::new("LatencyMs", |h| &h.latency_ms),
//!         ]
//!     }
//! }
//!
//! let http = CategoryFactory::global().get_instance::<Http>("Web.Http").unwrap();
//! http.requests.increment_one();
//! http.latency_ms.increment(12);
//!
//! let printer = Observer::new(|snapshot| println!("{:?}", snapshot.to_map()));
//! http.monitor().add_observer(&printer, Duration::from_secs(10)).unwrap();
//! http.monitor().remove_observer(&printer);
//! ```
//!
//! ## Thread Safety
//!
//! Every counter and category is `Send + Sync`. Counter operations are
//! synchronous and never block on the sampling thread; observers run on the
//! sampling thread, one after another, and should return promptly.
//!
//! ## Logging
//!
//! The crate logs through `tracing`: lifecycle events at `debug`, snapshot and
//! observer failures at `error` (see [`report`]). Nothing is printed unless
//! the application installs a subscriber.
//!
//! ## Observers
//!
//! Formatting sinks are gated behind feature flags:
//!
//! | Feature | Module | Description |
//! |---------|--------|-------------|
//! | `table` | [`observers::table`] | Pretty-print snapshots as tables |
//! | `json` | [`observers::json`] | Serialize snapshots to JSON lines |
//! | `serde` | [`snapshot`] | `Serialize`/`Deserialize` for snapshots and configs |
//! | `full` | All observers | Enables all observer modules |
//!
//! ### Example: JSON Lines
//!
//! ```toml
//! [dependencies]
//! categorie = { version = "0.1", features = ["json"] }
//! ```
//!
//! ```rust,ignore
//! use categorie::observers::json::JsonObserver;
//!
//! let lines = JsonObserver::new().wrap_in_snapshot(true).into_observer(std::io::stdout());
//! http.monitor().add_observer(&lines, Duration::from_secs(1))?;
//! ```

pub mod category;
pub mod counters;
pub mod factory;
pub mod monitor;
pub mod observers;
pub mod report;
pub mod snapshot;
