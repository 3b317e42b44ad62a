#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/topchart/topchart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Chart row persistence.
//!
//! This crate provides implementations of the [`ChartStore`] trait from `chart-core`:
//!
//! - [`SqliteChartStore`] - Persistent SQLite store (default, requires `sqlite` feature)
//! - [`InMemoryChartStore`] - Simple in-memory store for testing

/// CSV export through polars.
pub mod export;
/// CSV import through polars.
pub mod import;
/// In-memory store implementation.
pub mod memory;

/// SQLite-based store implementation.
#[cfg(feature = "sqlite")]
pub mod sqlite;

// Re-export the trait for convenience
pub use chart_core::ChartStore;

pub use export::{rows_to_frame, write_csv};
pub use import::{import_csv, read_csv};
pub use memory::InMemoryChartStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteChartStore;

/// Name of the table holding one chart year.
#[must_use]
pub fn table_name(year: i32) -> String {
    format!("top_singles_{year}")
}
