//! In-process fakes for the pipeline seams.

use async_trait::async_trait;
use chart_core::{
    ArtistCredits, ChartEntry, ChartError, ChartRow, ChartSource, ChartStore, EnrichmentRecord,
    Provider, Result, SongHit, SongMetadataProvider, Unit,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Builds an entry of `unit` credited to a single artist.
pub(crate) fn entry(unit: Unit, rank: u32, title: &str, artist: &str) -> ChartEntry {
    ChartEntry::new(unit, rank, title).with_artists(ArtistCredits::from_names([artist]))
}

/// Serves canned pages keyed by week and counts scrapes.
#[derive(Debug, Default)]
pub(crate) struct FakeSource {
    pages: Mutex<HashMap<u32, Vec<ChartEntry>>>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn with_page(self, unit: Unit, entries: Vec<ChartEntry>) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(unit.week(), entries);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Provider for FakeSource {
    fn name(&self) -> &str {
        "fake-source"
    }

    fn description(&self) -> &str {
        "Canned chart pages"
    }
}

#[async_trait]
impl ChartSource for FakeSource {
    async fn scrape_week(&self, unit: Unit) -> Vec<ChartEntry> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .lock()
            .unwrap()
            .get(&unit.week())
            .cloned()
            .unwrap_or_default()
    }
}

/// Metadata provider keyed by title.
///
/// `BROKEN` fails with a network error, `UNKNOWN` has no match, any other
/// title resolves to a record whose first producer is the title itself.
#[derive(Debug, Default)]
pub(crate) struct FakeMetadata {
    searches: AtomicUsize,
}

impl FakeMetadata {
    pub(crate) fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

impl Provider for FakeMetadata {
    fn name(&self) -> &str {
        "fake-metadata"
    }

    fn description(&self) -> &str {
        "Title-driven song metadata"
    }
}

#[async_trait]
impl SongMetadataProvider for FakeMetadata {
    async fn search_song(&self, title: &str, artist: &str) -> Result<Option<SongHit>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        match title {
            "BROKEN" => Err(ChartError::Network("connection reset".to_string())),
            "UNKNOWN" => Ok(None),
            _ => Ok(Some(SongHit {
                id: title.len() as u64,
                title: title.to_string(),
                primary_artist: Some(artist.to_string()),
            })),
        }
    }

    async fn song_details(&self, _id: u64) -> Result<Option<EnrichmentRecord>> {
        Ok(Some(EnrichmentRecord::absent()))
    }

    async fn lookup(&self, title: &str, artist: &str) -> Result<Option<EnrichmentRecord>> {
        Ok(self.search_song(title, artist).await?.map(|hit| {
            let mut record = EnrichmentRecord::absent();
            record.producer_1 = Some(hit.title);
            record
        }))
    }
}

/// Store whose every call fails.
#[derive(Debug, Default)]
pub(crate) struct FailingStore;

#[async_trait]
impl ChartStore for FailingStore {
    async fn last_week(&self, _year: i32) -> Result<u32> {
        Err(ChartError::Store("database is locked".to_string()))
    }

    async fn insert_rows(&self, _year: i32, _rows: &[ChartRow]) -> Result<usize> {
        Err(ChartError::Store("database is locked".to_string()))
    }

    async fn rows_for_year(&self, _year: i32) -> Result<Vec<ChartRow>> {
        Err(ChartError::Store("database is locked".to_string()))
    }

    async fn update_enrichment(
        &self,
        _year: i32,
        _week: u32,
        _rank: u32,
        _record: &EnrichmentRecord,
    ) -> Result<bool> {
        Err(ChartError::Store("database is locked".to_string()))
    }
}
