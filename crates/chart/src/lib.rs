#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/topchart/topchart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Incremental weekly chart ingestion.
//!
//! This crate ties the pipeline together. A [`ChartUpdater`] asks the store
//! for the last persisted week of a year, then scrapes every following week
//! through a [`ChartSource`], enriches each entry with an [`Enricher`] and
//! inserts the merged rows. Failures are recorded per week in the returned
//! [`RunReport`] instead of aborting the run.
//!
//! # Features
//!
//! - `sqlite` - SQLite-backed [`ChartStore`] and the `chart-update` binary
//!
//! # Example
//!
//! ```rust,ignore
//! use chart::UpdateConfig;
//!
//! #[tokio::main]
//! async fn main() -> chart::Result<()> {
//!     let config = UpdateConfig::default();
//!     let updater = config.build_updater()?;
//!     let report = updater.run(config.year, config.week).await;
//!     println!("{} rows inserted", report.rows_inserted());
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use chart_core::*;

// Caches
pub use chart_cache::{InMemoryCache, JsonSongCache, JsonWeekCache, NoopCache};

// Stores
#[cfg(feature = "sqlite")]
pub use chart_store::SqliteChartStore;
pub use chart_store::{InMemoryChartStore, import_csv, read_csv, write_csv};

// Providers
pub use chart_genius::GeniusProvider;
pub use chart_snep::SnepSource;

// Text normalization
pub use chart_text::{clean_title_and_extract_feat, merge_artists, parse_artists};

mod config;
mod enricher;
mod updater;

pub use config::{UpdateConfig, current_iso_week};
pub use enricher::{DEFAULT_API_DELAY, Enricher};
pub use updater::{BackfillReport, ChartUpdater, DEFAULT_PAGE_DELAY, RunReport, UnitReport};

#[cfg(test)]
mod testing;
