//! Observer sinks and the error type shared by every observer callback.
//!
//! An observer is any callback registered with a category's
//! [`Monitor`](crate::monitor::Monitor). This module provides ready-made
//! formatting sinks for the common cases:
//!
//! - [`table`] - Pretty-print snapshots as tables using the `tabled` crate
//! - [`json`] - Serialize snapshots to JSON (one document per line)
//!
//! # Unified Error Handling
//!
//! All observers return the unified [`ObserverError`] type. A failing
//! observer is reported and skipped; it never prevents delivery to the
//! other observers of the same category.
//!
//! # Feature Flags
//!
//! - `table` - Enables the [`table`] module
//! - `json` - Enables the [`json`] module
//! - `full` - Enables all observer modules
//!
//! # Example
//!
//! ```rust,ignore
//! use categorie::observers::json::JsonObserver;
//! use categorie::observers::table::TableObserver;
//! use std::time::Duration;
//!
//! let lines = JsonObserver::new().wrap_in_snapshot(true).into_observer(std::io::stdout());
//! let table = TableObserver::new().compact(true).columns(3).into_observer(std::io::stderr());
//!
//! category.monitor().add_observer(&lines, Duration::from_secs(1))?;
//! category.monitor().add_observer(&table, Duration::from_secs(10))?;
//! ```

mod error;

pub use error::{ObserverError, Result};

#[cfg(feature = "table")]
pub mod table;

#[cfg(feature = "json")]
pub mod json;
