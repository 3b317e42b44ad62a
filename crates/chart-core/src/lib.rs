#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/topchart/topchart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for weekly chart ingestion.
//!
//! This crate provides the foundational abstractions shared by every stage of the
//! pipeline:
//!
//! - [`ChartSource`](provider::ChartSource) - Scrapes one chart week into entries
//! - [`SongMetadataProvider`](provider::SongMetadataProvider) - External song metadata lookups
//! - [`SongCache`](cache::SongCache) - Enrichment cache keyed by normalized title/artist
//! - [`WeekCache`](cache::WeekCache) - Scrape cache keyed by `(year, week)`
//! - [`ChartStore`](store::ChartStore) - Persistence of enriched chart rows

/// Cache traits for enrichment records and scraped weeks.
pub mod cache;
/// Error types for chart operations.
pub mod error;
/// Provider traits for chart pages and song metadata.
pub mod provider;
/// Persistence trait for enriched chart rows.
pub mod store;
/// Core data types (ChartEntry, EnrichmentRecord, ChartRow, etc.).
pub mod types;
/// Unit of work and its pipeline state.
pub mod unit;

// Re-export commonly used items at crate root
pub use cache::{CacheStats, SongCache, WeekCache};
pub use error::{ChartError, Result};
pub use provider::{ChartSource, Provider, SongHit, SongMetadataProvider};
pub use store::ChartStore;
pub use types::{
    ARTIST_SLOTS, ArtistCredits, CacheKey, ChartEntry, ChartRow, EnrichmentRecord, SampleType,
};
pub use unit::{Unit, UnitState};
