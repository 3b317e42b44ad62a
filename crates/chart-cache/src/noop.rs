//! No-op cache implementation.

use async_trait::async_trait;
use chart_core::{
    CacheStats, ChartEntry, EnrichmentRecord, Result, SongCache, Unit, WeekCache,
};
use tracing::trace;

use crate::stats::Counters;

/// A no-op cache that doesn't store anything.
///
/// Every lookup misses and every store is discarded, so each song goes to the
/// provider and each week to the chart site. Counters still work.
#[derive(Debug, Default)]
pub struct NoopCache {
    counters: Counters,
}

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SongCache for NoopCache {
    async fn get(&self, _title: &str, _artist: &str) -> Option<EnrichmentRecord> {
        trace!("NoopCache: song get called, returning None");
        self.counters.miss();
        None
    }

    async fn put(&self, _title: &str, _artist: &str, _record: EnrichmentRecord) -> Result<()> {
        trace!("NoopCache: song put called, doing nothing");
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn record_api_call(&self) {
        self.counters.api_call();
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    fn len(&self) -> usize {
        0
    }
}

#[async_trait]
impl WeekCache for NoopCache {
    async fn get(&self, _unit: Unit) -> Option<Vec<ChartEntry>> {
        trace!("NoopCache: week get called, returning None");
        None
    }

    async fn put(&self, _unit: Unit, _entries: &[ChartEntry]) -> Result<()> {
        trace!("NoopCache: week put called, doing nothing");
        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_cache_never_hits() {
        let cache = NoopCache::new();
        SongCache::put(&cache, "a", "b", EnrichmentRecord::absent())
            .await
            .unwrap();
        assert!(SongCache::get(&cache, "a", "b").await.is_none());
        assert!(SongCache::is_empty(&cache));
        assert_eq!(cache.stats().misses, 1);

        let unit = Unit::new(2024, 1).unwrap();
        WeekCache::put(&cache, unit, &[]).await.unwrap();
        assert!(WeekCache::get(&cache, unit).await.is_none());
    }
}
