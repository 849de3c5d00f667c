//! Unified error type for all observers.
//!
//! Every observer callback registered with a
//! [`Monitor`](crate::monitor::Monitor) returns [`Result<()>`], so formatting
//! sinks, user closures and panics caught by the sampling loop all surface
//! through the same [`ObserverError`].
//!
//! # Example
//!
//! ```rust
//! use categorie::observers::{ObserverError, Result};
//! use categorie::snapshot::Snapshot;
//!
//! fn alert_on_errors(snapshot: &Snapshot) -> Result<()> {
//!     match snapshot.get("ErrorsTotal") {
//!         Some(errors) if errors > 100 => {
//!             Err(ObserverError::Observer(format!("{} errors", errors)))
//!         }
//!         _ => Ok(()),
//!     }
//! }
//! # assert!(alert_on_errors(&Snapshot::new("x", vec![])).is_ok());
//! ```

use thiserror::Error;

/// Unified error type for all observer operations.
#[derive(Debug, Error)]
pub enum ObserverError {
    /// Error from the JSON observer.
    #[cfg(feature = "json")]
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error writing rendered output.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Error reported by an observer callback.
    #[error("observer error: {0}")]
    Observer(String),

    /// An observer callback panicked.
    #[error("observer panicked: {0}")]
    Panicked(String),
}

/// Result type for observer operations.
pub type Result<T> = std::result::Result<T, ObserverError>;
