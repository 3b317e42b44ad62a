//! JSON-file cache implementations.
//!
//! Both caches load their file once at construction and keep everything in
//! memory. Writes reach disk only on flush, through a temp file renamed over
//! the target, so a reader never sees a half-written cache.

use async_trait::async_trait;
use chart_core::{
    CacheKey, CacheStats, ChartEntry, ChartError, EnrichmentRecord, Result, SongCache, Unit,
    WeekCache,
};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, instrument};

use crate::stats::Counters;

/// Number of unsaved changes after which [`JsonSongCache`] flushes itself.
pub const DEFAULT_FLUSH_EVERY: usize = 10;

#[derive(Debug, Default)]
struct Pending<V> {
    entries: BTreeMap<String, V>,
    unsaved: usize,
}

impl<V> Pending<V> {
    fn new(entries: BTreeMap<String, V>) -> Mutex<Self> {
        Mutex::new(Self {
            entries,
            unsaved: 0,
        })
    }
}

/// Locks cache state. A poisoned lock still holds a consistent map.
fn lock<V>(state: &Mutex<Pending<V>>) -> MutexGuard<'_, Pending<V>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Enrichment cache persisted as one JSON object, normalized key → record.
///
/// Every [`put`](SongCache::put) counts as one unsaved change. When the count
/// reaches the flush threshold the file is rewritten. Changes not yet flushed
/// are lost if the process dies.
#[derive(Debug)]
pub struct JsonSongCache {
    path: PathBuf,
    flush_every: usize,
    state: Mutex<Pending<EnrichmentRecord>>,
    counters: Counters,
}

impl JsonSongCache {
    /// Loads the cache stored at `path`.
    ///
    /// A missing file gives an empty cache. An unreadable or corrupt file is
    /// logged and also gives an empty cache, so this never fails.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_map(&path, "song cache");
        Self {
            path,
            flush_every: DEFAULT_FLUSH_EVERY,
            state: Pending::new(entries),
            counters: Counters::default(),
        }
    }

    /// Sets the number of unsaved changes that triggers a flush.
    ///
    /// A threshold of 0 is treated as 1.
    #[must_use]
    pub fn with_flush_every(mut self, flush_every: usize) -> Self {
        self.flush_every = flush_every.max(1);
        self
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SongCache for JsonSongCache {
    async fn get(&self, title: &str, artist: &str) -> Option<EnrichmentRecord> {
        let key = CacheKey::new(title, artist);
        let state = lock(&self.state);
        match state.entries.get(key.as_str()) {
            Some(record) => {
                self.counters.hit();
                debug!(key = %key, "Song cache hit");
                Some(record.clone())
            }
            None => {
                self.counters.miss();
                debug!(key = %key, "Song cache miss");
                None
            }
        }
    }

    async fn put(&self, title: &str, artist: &str, record: EnrichmentRecord) -> Result<()> {
        let key = CacheKey::new(title, artist);
        let mut state = lock(&self.state);
        state.entries.insert(key.to_string(), record);
        state.unsaved += 1;

        if state.unsaved >= self.flush_every {
            write_atomic(&self.path, &state.entries)?;
            debug!(entries = state.entries.len(), "Song cache flushed at threshold");
            state.unsaved = 0;
        }
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn flush(&self) -> Result<()> {
        let mut state = lock(&self.state);
        write_atomic(&self.path, &state.entries)?;
        state.unsaved = 0;
        debug!(entries = state.entries.len(), "Song cache saved");
        Ok(())
    }

    fn record_api_call(&self) {
        self.counters.api_call();
    }

    fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }
}

/// Scraped weeks persisted as one JSON object, `"<year>-<week>"` → entries.
#[derive(Debug)]
pub struct JsonWeekCache {
    path: PathBuf,
    state: Mutex<Pending<Vec<ChartEntry>>>,
}

impl JsonWeekCache {
    /// Loads the cache stored at `path`. Never fails, see [`JsonSongCache::load`].
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_map(&path, "week cache");
        Self {
            path,
            state: Pending::new(entries),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true when no week is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of cached weeks.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }
}

#[async_trait]
impl WeekCache for JsonWeekCache {
    async fn get(&self, unit: Unit) -> Option<Vec<ChartEntry>> {
        let state = lock(&self.state);
        let entries = state.entries.get(&unit.cache_key()).cloned();
        debug!(unit = %unit, hit = entries.is_some(), "Week cache lookup");
        entries
    }

    async fn put(&self, unit: Unit, entries: &[ChartEntry]) -> Result<()> {
        let mut state = lock(&self.state);
        state.entries.insert(unit.cache_key(), entries.to_vec());
        state.unsaved += 1;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn flush(&self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.unsaved == 0 {
            return Ok(());
        }
        write_atomic(&self.path, &state.entries)?;
        state.unsaved = 0;
        debug!(weeks = state.entries.len(), "Week cache saved");
        Ok(())
    }
}

/// Reads a JSON object from disk, degrading to an empty map on any failure.
fn load_map<V: DeserializeOwned>(path: &Path, what: &str) -> BTreeMap<String, V> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No {what} file, starting empty");
            return BTreeMap::new();
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Failed to read {what}, starting empty");
            return BTreeMap::new();
        }
    };

    match serde_json::from_str::<BTreeMap<String, V>>(&text) {
        Ok(entries) => {
            info!(path = %path.display(), entries = entries.len(), "Loaded {what}");
            entries
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Corrupt {what}, starting empty");
            BTreeMap::new()
        }
    }
}

/// Writes pretty-printed JSON to a sibling temp file, then renames it over `path`.
fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ChartError::Cache(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ChartError::Cache(e.to_string()))?;
    }

    let temp_path = temp_path_for(path);
    fs::write(&temp_path, json).map_err(|e| ChartError::Cache(e.to_string()))?;
    fs::rename(&temp_path, path).map_err(|e| ChartError::Cache(e.to_string()))?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
