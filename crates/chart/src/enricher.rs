//! Cache-first song enrichment.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chart_core::{EnrichmentRecord, SongCache, SongMetadataProvider};
use tracing::{debug, error, warn};

/// Pause after every live provider lookup.
pub const DEFAULT_API_DELAY: Duration = Duration::from_millis(100);

/// Resolves enrichment records, consulting the song cache before the provider.
///
/// Every provider outcome is cached, absent records included, so a song is
/// looked up live at most once per cache lifetime. Without a provider the
/// enricher still answers cache hits and returns absent records otherwise.
pub struct Enricher {
    provider: Option<Arc<dyn SongMetadataProvider>>,
    cache: Arc<dyn SongCache>,
    api_delay: Duration,
}

impl fmt::Debug for Enricher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enricher")
            .field("provider", &self.provider.as_ref().map(|p| p.name()))
            .field("cached_songs", &self.cache.len())
            .field("api_delay", &self.api_delay)
            .finish()
    }
}

impl Enricher {
    /// Create an enricher backed by a provider and a cache.
    #[must_use]
    pub fn new(provider: Arc<dyn SongMetadataProvider>, cache: Arc<dyn SongCache>) -> Self {
        Self {
            provider: Some(provider),
            cache,
            api_delay: DEFAULT_API_DELAY,
        }
    }

    /// Create an enricher with no provider configured.
    #[must_use]
    pub fn without_provider(cache: Arc<dyn SongCache>) -> Self {
        Self {
            provider: None,
            cache,
            api_delay: DEFAULT_API_DELAY,
        }
    }

    /// Set the pause applied after each live lookup.
    #[must_use]
    pub const fn with_api_delay(mut self, api_delay: Duration) -> Self {
        self.api_delay = api_delay;
        self
    }

    /// The song cache consulted before the provider.
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn SongCache> {
        &self.cache
    }

    /// Returns true when a provider is configured.
    #[must_use]
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Resolve the enrichment record of a song.
    ///
    /// Never fails. Provider errors and missing matches yield an absent record,
    /// which is cached like any other outcome.
    pub async fn song_details(&self, title: &str, artist: &str) -> EnrichmentRecord {
        if let Some(record) = self.cache.get(title, artist).await {
            return record;
        }

        let Some(provider) = &self.provider else {
            return EnrichmentRecord::absent();
        };

        let record = match provider.lookup(title, artist).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(title, artist, provider = provider.name(), "No metadata match");
                EnrichmentRecord::absent()
            }
            Err(e) => {
                error!(title, artist, provider = provider.name(), error = %e, "Metadata lookup failed");
                EnrichmentRecord::absent()
            }
        };

        if let Err(e) = self.cache.put(title, artist, record.clone()).await {
            warn!(title, artist, error = %e, "Failed to cache enrichment record");
        }
        self.cache.record_api_call();
        tokio::time::sleep(self.api_delay).await;

        record
    }
}
