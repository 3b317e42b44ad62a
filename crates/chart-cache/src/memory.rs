//! In-memory cache implementation.

use async_trait::async_trait;
use chart_core::{
    CacheKey, CacheStats, ChartEntry, EnrichmentRecord, Result, SongCache, Unit, WeekCache,
};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

use crate::stats::Counters;

/// Simple in-memory cache for testing and development.
///
/// Implements both [`SongCache`] and [`WeekCache`]. Data is stored in
/// `RwLock`-protected `HashMap`s and is lost when the cache is dropped; `flush`
/// is a no-op.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    songs: RwLock<HashMap<CacheKey, EnrichmentRecord>>,
    weeks: RwLock<HashMap<Unit, Vec<ChartEntry>>>,
    counters: Counters,
}

impl InMemoryCache {
    /// Create a new empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached weeks.
    #[must_use]
    pub fn week_count(&self) -> usize {
        self.weeks.read().map_or(0, |weeks| weeks.len())
    }
}

#[async_trait]
impl SongCache for InMemoryCache {
    async fn get(&self, title: &str, artist: &str) -> Option<EnrichmentRecord> {
        let key = CacheKey::new(title, artist);
        let found = self
            .songs
            .read()
            .ok()
            .and_then(|songs| songs.get(&key).cloned());
        if found.is_some() {
            self.counters.hit();
            debug!(key = %key, "Cache hit for song");
        } else {
            self.counters.miss();
            debug!(key = %key, "Cache miss for song");
        }
        found
    }

    async fn put(&self, title: &str, artist: &str, record: EnrichmentRecord) -> Result<()> {
        if let Ok(mut songs) = self.songs.write() {
            songs.insert(CacheKey::new(title, artist), record);
        }
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
        self.songs.read().map_or(0, |songs| songs.len())
    }
}

#[async_trait]
impl WeekCache for InMemoryCache {
    async fn get(&self, unit: Unit) -> Option<Vec<ChartEntry>> {
        self.weeks
            .read()
            .ok()
            .and_then(|weeks| weeks.get(&unit).cloned())
    }

    async fn put(&self, unit: Unit, entries: &[ChartEntry]) -> Result<()> {
        if let Ok(mut weeks) = self.weeks.write() {
            weeks.insert(unit, entries.to_vec());
        }
        debug!(unit = %unit, count = entries.len(), "Cached week");
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
    async fn test_memory_cache_songs() {
        let cache = InMemoryCache::new();
        assert!(SongCache::get(&cache, "Tout va bien", "Orelsan").await.is_none());

        SongCache::put(&cache, "Tout va bien", "Orelsan", EnrichmentRecord::absent())
            .await
            .unwrap();
        let hit = SongCache::get(&cache, "TOUT VA BIEN", "orelsan").await;
        assert_eq!(hit, Some(EnrichmentRecord::absent()));

        assert_eq!(SongCache::len(&cache), 1);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses), (1, 1));
    }

    #[tokio::test]
    async fn test_memory_cache_weeks() {
        let cache = InMemoryCache::new();
        let unit = Unit::new(2023, 40).unwrap();
        assert!(WeekCache::get(&cache, unit).await.is_none());

        let entries = vec![ChartEntry::new(unit, 1, "DAISY")];
        WeekCache::put(&cache, unit, &entries).await.unwrap();
        assert_eq!(WeekCache::get(&cache, unit).await, Some(entries));
        assert_eq!(cache.week_count(), 1);
    }
}
