//! Failure reporting for the sampling machinery.
//!
//! The monitor never lets an error escape its sampling loop. Snapshot
//! failures and observer failures are handed to [`report_failure`], which
//! flattens the error and its source chain into a single line and emits it
//! through `tracing` at the `error` level, tagged with the category name.
//! Where the line ends up (console, file, collector) is decided by the
//! subscriber installed by the application.

use std::error::Error;

use tracing::error;

/// Reports a failure observed while sampling `category`.
///
/// ```rust
/// use categorie::monitor::MonitorError;
/// use categorie::report::report_failure;
///
/// report_failure("Ingress.Gateway", &MonitorError::CategoryReclaimed);
/// ```
pub fn report_failure(category: &str, err: &dyn Error) {
    error!(category, error = %flatten_error(err), "category monitor failure");
}

/// Joins an error and all of its sources into one whitespace-normalized line.
///
/// ```rust
/// use categorie::report::flatten_error;
///
/// let err = std::io::Error::new(std::io::ErrorKind::Other, "disk\n  full");
/// assert_eq!(flatten_error(&err), "disk full");
/// ```
pub fn flatten_error(err: &dyn Error) -> String {
    let mut parts = vec![normalize(&err.to_string())];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = normalize(&cause.to_string());
        // thiserror's transparent and `{0}` messages repeat their source
        if parts.last().is_some_and(|last| last.ends_with(&text)) {
            source = cause.source();
            continue;
        }
        parts.push(text);
        source = cause.source();
    }
    parts.join(": ")
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
