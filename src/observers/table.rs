//! Table observer for pretty-printing snapshots.
//!
//! This module provides [`TableObserver`], which renders a [`Snapshot`] as a
//! formatted ASCII table using the `tabled` crate, and can be turned into a
//! monitor [`Observer`] writing every delivered snapshot to a sink.
//!
//! # Feature Flag
//!
//! This module requires the `table` feature:
//!
//! ```toml
//! [dependencies]
//! categorie = { version = "0.1", features = ["table"] }
//! ```
//!
//! # Examples
//!
//! ## Standard format (vertical list)
//!
//! ```rust
//! use categorie::observers::table::{TableObserver, TableStyle};
//! use categorie::snapshot::{CounterSnapshot, Snapshot};
//!
//! let snapshot = Snapshot::new(
//!     "Ingress.Gateway",
//!     vec![CounterSnapshot::new("InTotal", 1000), CounterSnapshot::new("ErrorsTotal", 5)],
//! );
//!
//! let observer = TableObserver::new().with_style(TableStyle::Rounded);
//! println!("{}", observer.render(&snapshot));
//! // Ingress.Gateway
//! // ╭─────────────┬───────╮
//! // │ Name        │ Value │
//! // ├─────────────┼───────┤
//! // │ InTotal     │ 1000  │
//! // │ ErrorsTotal │ 5     │
//! // ╰─────────────┴───────╯
//! ```
//!
//! ## Compact format (multiple columns)
//!
//! ```rust
//! use categorie::observers::table::TableObserver;
//! # use categorie::snapshot::Snapshot;
//! # let snapshot = Snapshot::new("x", vec![]);
//!
//! let observer = TableObserver::new()
//!     .compact(true)
//!     .columns(3);
//!
//! println!("{}", observer.render(&snapshot));
//! // ╭──────────────┬──────────────┬────────────────╮
//! // │ InTotal: 10  │ OutTotal: 8  │ PendingCount: 2│
//! // ╰──────────────┴──────────────┴────────────────╯
//! ```

use parking_lot::Mutex;
use std::io::Write;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

use crate::monitor::Observer;
use crate::snapshot::Snapshot;

/// Available table styles for rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TableStyle {
    /// ASCII table with simple characters: +, -, |
    Ascii,
    /// Modern rounded corners (default)
    #[default]
    Rounded,
    /// Sharp corners with box-drawing characters
    Sharp,
    /// Modern style with clean lines
    Modern,
    /// GitHub-flavored Markdown table
    Markdown,
    /// No borders, just spacing
    Blank,
}

/// Separator style between name and value in compact mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompactSeparator {
    /// Colon separator: "name: value"
    #[default]
    Colon,
    /// Equals separator: "name = value"
    Equals,
    /// Arrow separator: "name → value"
    Arrow,
}

impl CompactSeparator {
    /// Returns the separator string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompactSeparator::Colon => ": ",
            CompactSeparator::Equals => " = ",
            CompactSeparator::Arrow => " → ",
        }
    }
}

/// Configuration for the table observer.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TableConfig {
    /// The style to use for rendering.
    pub style: TableStyle,
    /// Whether to show the header row (only in non-compact mode).
    pub show_header: bool,
    /// Title printed above the table; the category name when unset.
    pub title: Option<String>,
    /// Whether to print a title line at all.
    pub show_title: bool,
    /// Whether to use compact format (name: value in cells).
    pub compact: bool,
    /// Number of columns in compact mode (default: 1).
    pub columns: usize,
    /// Separator between name and value in compact mode.
    pub separator: CompactSeparator,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            style: TableStyle::default(),
            show_header: true,
            title: None,
            show_title: true,
            compact: false,
            columns: 1,
            separator: CompactSeparator::default(),
        }
    }
}

#[derive(Tabled)]
struct CounterRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Value")]
    value: i64,
}

/// Renders snapshots as formatted ASCII tables.
///
/// Supports two rendering modes:
///
/// 1. **Standard mode**: two-column table with Name and Value headers
/// 2. **Compact mode**: multi-column grid with "name: value" cells
#[derive(Debug, Clone, Default)]
pub struct TableObserver {
    config: TableConfig,
}

impl TableObserver {
    /// Creates a new table observer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new table observer with the specified configuration.
    pub fn with_config(config: TableConfig) -> Self {
        Self { config }
    }

    /// Sets the table style.
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.config.style = style;
        self
    }

    /// Sets whether to show the header row.
    pub fn with_header(mut self, show: bool) -> Self {
        self.config.show_header = show;
        self
    }

    /// Sets the title printed above the table.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    /// Sets whether a title line is printed.
    pub fn show_title(mut self, show: bool) -> Self {
        self.config.show_title = show;
        self
    }

    /// Enables or disables compact mode.
    pub fn compact(mut self, enabled: bool) -> Self {
        self.config.compact = enabled;
        self
    }

    /// Sets the number of columns in compact mode. Values below 1 are treated as 1.
    pub fn columns(mut self, count: usize) -> Self {
        self.config.columns = count.max(1);
        self
    }

    /// Sets the separator between name and value in compact mode.
    pub fn separator(mut self, sep: CompactSeparator) -> Self {
        self.config.separator = sep;
        self
    }

    fn apply_style(&self, table: &mut Table) {
        match self.config.style {
            TableStyle::Ascii => {
                table.with(Style::ascii());
            }
            TableStyle::Rounded => {
                table.with(Style::rounded());
            }
            TableStyle::Sharp => {
                table.with(Style::sharp());
            }
            TableStyle::Modern => {
                table.with(Style::modern());
            }
            TableStyle::Markdown => {
                table.with(Style::markdown());
            }
            TableStyle::Blank => {
                table.with(Style::blank());
            }
        }
    }

    fn with_title_line(&self, snapshot: &Snapshot, table: Table) -> String {
        if !self.config.show_title {
            return table.to_string();
        }
        let title = self.config.title.as_deref().unwrap_or(&snapshot.category);
        format!("{}\n{}", title, table)
    }

    fn render_compact(&self, snapshot: &Snapshot) -> String {
        let sep = self.config.separator.as_str();
        let cells: Vec<String> = snapshot
            .iter()
            .map(|c| format!("{}{}{}", c.name, sep, c.value))
            .collect();

        if cells.is_empty() {
            return String::new();
        }

        let cols = self.config.columns.max(1);
        let mut builder = Builder::default();

        for chunk in cells.chunks(cols) {
            let mut row: Vec<String> = chunk.to_vec();
            row.resize(cols, String::new());
            builder.push_record(row);
        }

        let mut table = builder.build();
        self.apply_style(&mut table);
        self.with_title_line(snapshot, table)
    }

    fn render_standard(&self, snapshot: &Snapshot) -> String {
        let rows: Vec<CounterRow> = snapshot
            .iter()
            .map(|c| CounterRow {
                name: c.name.clone(),
                value: c.value,
            })
            .collect();

        let mut table = Table::new(&rows);
        self.apply_style(&mut table);

        if !self.config.show_header {
            table.with(tabled::settings::Remove::row(
                tabled::settings::object::Rows::first(),
            ));
        }

        self.with_title_line(snapshot, table)
    }

    /// Renders the snapshot as a formatted table string.
    pub fn render(&self, snapshot: &Snapshot) -> String {
        if self.config.compact {
            self.render_compact(snapshot)
        } else {
            self.render_standard(snapshot)
        }
    }

    /// Turns this renderer into a monitor observer writing each snapshot to `sink`.
    ///
    /// ```rust
    /// use categorie::observers::table::TableObserver;
    ///
    /// let observer = TableObserver::new().compact(true).columns(4).into_observer(std::io::stdout());
    /// ```
    pub fn into_observer<W>(self, sink: W) -> Observer
    where
        W: Write + Send + 'static,
    {
        let sink = Mutex::new(sink);
        Observer::fallible(move |snapshot| {
            let rendered = self.render(snapshot);
            let mut sink = sink.lock();
            writeln!(sink, "{}", rendered)?;
            sink.flush()?;
            Ok(())
        })
    }
}
