//! JSON observer for serializing snapshots.
//!
//! This module provides [`JsonObserver`], which serializes a [`Snapshot`] to
//! JSON using serde, and can be turned into a monitor [`Observer`] writing
//! one JSON document per delivered snapshot (JSON lines when not pretty).
//!
//! # Feature Flag
//!
//! This module requires the `json` feature:
//!
//! ```toml
//! [dependencies]
//! categorie = { version = "0.1", features = ["json"] }
//! ```
//!
//! # Examples
//!
//! ```rust
//! use categorie::observers::json::JsonObserver;
//! use categorie::snapshot::{CounterSnapshot, Snapshot};
//!
//! let snapshot = Snapshot::new(
//!     "Ingress.Gateway",
//!     vec![CounterSnapshot::new("InTotal", 1000), CounterSnapshot::new("ErrorsTotal", 5)],
//! );
//!
//! let json = JsonObserver::new().to_json(&snapshot).unwrap();
//! assert_eq!(json, r#"[{"name":"InTotal","value":1000},{"name":"ErrorsTotal","value":5}]"#);
//! ```

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::monitor::Observer;
use crate::observers::Result;
use crate::snapshot::{CounterSnapshot, Snapshot};

/// Configuration for the JSON observer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonConfig {
    /// Whether to pretty-print the JSON output.
    pub pretty: bool,
    /// Whether to include the capture timestamp in the output.
    pub include_timestamp: bool,
    /// Whether to wrap counters in an object carrying the category name.
    pub wrap_in_snapshot: bool,
}

#[derive(Serialize)]
struct SnapshotView<'a> {
    category: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp_ms: Option<u64>,
    counters: &'a [CounterSnapshot],
}

/// Serializes snapshots to JSON.
///
/// By default only the counter array is emitted. With
/// [`wrap_in_snapshot`](JsonObserver::wrap_in_snapshot) the output is an
/// object carrying the category name, and optionally the timestamp:
///
/// ```rust
/// use categorie::observers::json::JsonObserver;
/// use categorie::snapshot::{CounterSnapshot, Snapshot};
///
/// let snapshot = Snapshot::with_timestamp("svc", vec![CounterSnapshot::new("a", 1)], 42);
/// let json = JsonObserver::new()
///     .wrap_in_snapshot(true)
///     .include_timestamp(true)
///     .to_json(&snapshot)
///     .unwrap();
/// assert_eq!(json, r#"{"category":"svc","timestamp_ms":42,"counters":[{"name":"a","value":1}]}"#);
/// ```
#[derive(Debug, Clone, Default)]
pub struct JsonObserver {
    config: JsonConfig,
}

impl JsonObserver {
    /// Creates a new JSON observer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new JSON observer with the specified configuration.
    pub fn with_config(config: JsonConfig) -> Self {
        Self { config }
    }

    /// Enables or disables pretty-printing.
    pub fn pretty(mut self, enabled: bool) -> Self {
        self.config.pretty = enabled;
        self
    }

    /// Enables or disables timestamp inclusion.
    ///
    /// Only has effect when `wrap_in_snapshot` is also enabled.
    pub fn include_timestamp(mut self, enabled: bool) -> Self {
        self.config.include_timestamp = enabled;
        self
    }

    /// Enables or disables wrapping the counters in a category object.
    pub fn wrap_in_snapshot(mut self, enabled: bool) -> Self {
        self.config.wrap_in_snapshot = enabled;
        self
    }

    fn write_into<W: Write>(&self, snapshot: &Snapshot, writer: W) -> serde_json::Result<()> {
        if self.config.wrap_in_snapshot {
            let view = SnapshotView {
                category: &snapshot.category,
                timestamp_ms: self
                    .config
                    .include_timestamp
                    .then_some(snapshot.timestamp_ms),
                counters: &snapshot.counters,
            };
            if self.config.pretty {
                serde_json::to_writer_pretty(writer, &view)
            } else {
                serde_json::to_writer(writer, &view)
            }
        } else if self.config.pretty {
            serde_json::to_writer_pretty(writer, &snapshot.counters)
        } else {
            serde_json::to_writer(writer, &snapshot.counters)
        }
    }

    /// Serializes the snapshot to a JSON byte vector.
    pub fn to_json_bytes(&self, snapshot: &Snapshot) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.write_into(snapshot, &mut bytes)?;
        Ok(bytes)
    }

    /// Serializes the snapshot to a JSON string.
    pub fn to_json(&self, snapshot: &Snapshot) -> Result<String> {
        let bytes = self.to_json_bytes(snapshot)?;
        // serde_json only ever emits valid UTF-8
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Turns this serializer into a monitor observer writing each snapshot to `sink`,
    /// followed by a newline.
    pub fn into_observer<W>(self, sink: W) -> Observer
    where
        W: Write + Send + 'static,
    {
        let sink = Mutex::new(sink);
        Observer::fallible(move |snapshot| {
            let mut sink = sink.lock();
            self.write_into(snapshot, &mut *sink)?;
            writeln!(sink)?;
            sink.flush()?;
            Ok(())
        })
    }
}
