#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/topchart/topchart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Caching implementations for chart ingestion.
//!
//! This crate provides implementations of the [`SongCache`] and [`WeekCache`]
//! traits from `chart-core`:
//!
//! - [`JsonSongCache`] - Persistent JSON-file enrichment cache
//! - [`JsonWeekCache`] - Persistent JSON-file cache of scraped weeks
//! - [`InMemoryCache`] - Simple in-memory cache for testing
//! - [`NoopCache`] - No-op cache that doesn't store anything

/// JSON-file cache implementations.
pub mod json;
/// In-memory cache implementation.
pub mod memory;
/// No-op cache implementation.
pub mod noop;

mod stats;

// Re-export the traits for convenience
pub use chart_core::{CacheStats, SongCache, WeekCache};

// Re-export implementations
pub use json::{DEFAULT_FLUSH_EVERY, JsonSongCache, JsonWeekCache};
pub use memory::InMemoryCache;
pub use noop::NoopCache;
