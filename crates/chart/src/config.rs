//! Runtime configuration of an update run.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{Datelike, Local};

use crate::enricher::DEFAULT_API_DELAY;
use crate::updater::DEFAULT_PAGE_DELAY;

#[cfg(feature = "sqlite")]
use {
    crate::{enricher::Enricher, updater::ChartUpdater},
    chart_cache::{JsonSongCache, JsonWeekCache},
    chart_core::{Result, SongCache},
    chart_genius::GeniusProvider,
    chart_snep::SnepSource,
    chart_store::SqliteChartStore,
    std::sync::Arc,
    tracing::{info, warn},
};

/// Current ISO year and week, in local time.
#[must_use]
pub fn current_iso_week() -> (i32, u32) {
    let week = Local::now().iso_week();
    (week.year(), week.week())
}

/// Everything needed to build a [`ChartUpdater`](crate::ChartUpdater) over the
/// live SNEP and Genius services.
#[derive(Clone)]
pub struct UpdateConfig {
    /// Year to update.
    pub year: i32,
    /// Last week to process.
    pub week: u32,
    /// SQLite database path.
    pub db_path: PathBuf,
    /// Song cache file.
    pub song_cache_path: PathBuf,
    /// Week cache file.
    pub week_cache_path: PathBuf,
    /// Genius API token. Enrichment is disabled without one.
    pub genius_token: Option<String>,
    /// Pause after live page fetches.
    pub page_delay: Duration,
    /// Pause after live provider lookups.
    pub api_delay: Duration,
}

impl std::fmt::Debug for UpdateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateConfig")
            .field("year", &self.year)
            .field("week", &self.week)
            .field("db_path", &self.db_path)
            .field("song_cache_path", &self.song_cache_path)
            .field("week_cache_path", &self.week_cache_path)
            .field("genius_token", &self.genius_token.as_ref().map(|_| "[REDACTED]"))
            .field("page_delay", &self.page_delay)
            .field("api_delay", &self.api_delay)
            .finish()
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        let (year, week) = current_iso_week();
        Self {
            year,
            week,
            db_path: PathBuf::from("charts.db"),
            song_cache_path: PathBuf::from("song_cache_v2.json"),
            week_cache_path: PathBuf::from("week_cache.json"),
            genius_token: None,
            page_delay: DEFAULT_PAGE_DELAY,
            api_delay: DEFAULT_API_DELAY,
        }
    }
}

impl UpdateConfig {
    /// Set the token, treating a blank value as none.
    #[must_use]
    pub fn with_genius_token(mut self, token: Option<String>) -> Self {
        self.genius_token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Build the updater: SNEP source, JSON caches, SQLite store and, when a
    /// token is set, the Genius provider.
    ///
    /// # Errors
    /// Returns an error if the store cannot be opened or an HTTP client cannot
    /// be built.
    #[cfg(feature = "sqlite")]
    pub fn build_updater(&self) -> Result<ChartUpdater> {
        let source = Arc::new(SnepSource::new()?);
        let store = Arc::new(SqliteChartStore::new(&self.db_path)?);
        let song_cache = Arc::new(JsonSongCache::load(&self.song_cache_path));
        let week_cache = Arc::new(JsonWeekCache::load(&self.week_cache_path));
        info!(
            songs = song_cache.len(),
            weeks = week_cache.len(),
            "Caches loaded"
        );

        let enricher = match self.genius_token.as_deref() {
            Some(token) if !token.trim().is_empty() => {
                Enricher::new(Arc::new(GeniusProvider::new(token)?), song_cache)
            }
            _ => {
                warn!("No Genius token configured, songs will not be enriched");
                Enricher::without_provider(song_cache)
            }
        };

        Ok(ChartUpdater::new(source, enricher, week_cache, store)
            .with_delays(self.page_delay, self.api_delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = UpdateConfig::default();
        assert!((1..=53).contains(&config.week));
        assert_eq!(config.db_path, PathBuf::from("charts.db"));
        assert_eq!(config.song_cache_path, PathBuf::from("song_cache_v2.json"));
        assert_eq!(config.page_delay, Duration::from_millis(1500));
        assert_eq!(config.api_delay, Duration::from_millis(100));
    }

    #[test]
    fn test_blank_token_is_none() {
        let config = UpdateConfig::default().with_genius_token(Some("  ".to_string()));
        assert!(config.genius_token.is_none());

        let config = UpdateConfig::default().with_genius_token(Some("secret".to_string()));
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_build_updater_without_token() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = UpdateConfig {
            db_path: dir.path().join("charts.db"),
            song_cache_path: dir.path().join("songs.json"),
            week_cache_path: dir.path().join("weeks.json"),
            ..UpdateConfig::default()
        };

        let updater = config.build_updater().unwrap();
        assert!(!updater.enricher().has_provider());
    }
}
