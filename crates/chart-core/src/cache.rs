//! Cache traits for enrichment records and scraped weeks.
//!
//! This module defines the [`SongCache`] trait, which stores one
//! [`EnrichmentRecord`] per normalized `(title, artist)` key, and the
//! [`WeekCache`] trait, which stores the entries scraped for a `(year, week)`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    types::{ChartEntry, EnrichmentRecord},
    unit::Unit,
};

/// Process-lifetime counters of a [`SongCache`]. Never persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Live provider lookups performed after a miss.
    pub api_calls: u64,
}

impl CacheStats {
    /// Share of lookups answered from the cache, 0.0 when nothing was looked up.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Enrichment cache keyed by normalized `(title, artist)`.
///
/// Implementations normalize with [`CacheKey`](crate::types::CacheKey), so
/// callers pass raw strings.
#[async_trait]
pub trait SongCache: Send + Sync {
    /// Looks up the record for a song, counting a hit or a miss.
    async fn get(&self, title: &str, artist: &str) -> Option<EnrichmentRecord>;

    /// Stores the record for a song, absent records included.
    ///
    /// May flush to durable storage, hence the `Result`.
    async fn put(&self, title: &str, artist: &str, record: EnrichmentRecord) -> Result<()>;

    /// Writes every pending change to durable storage.
    async fn flush(&self) -> Result<()>;

    /// Counts one live provider lookup.
    fn record_api_call(&self);

    /// Returns the current counters.
    fn stats(&self) -> CacheStats;

    /// Number of cached songs.
    fn len(&self) -> usize;

    /// Returns true when nothing is cached.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scrape cache keyed by `(year, week)`, distinct from the enrichment cache.
#[async_trait]
pub trait WeekCache: Send + Sync {
    /// Returns the cached entries of a unit.
    async fn get(&self, unit: Unit) -> Option<Vec<ChartEntry>>;

    /// Stores the entries of a unit.
    async fn put(&self, unit: Unit, entries: &[ChartEntry]) -> Result<()>;

    /// Writes every pending change to durable storage.
    async fn flush(&self) -> Result<()>;
}
