//! Provider traits for chart pages and song metadata.
//!
//! This module defines the core provider traits:
//!
//! - [`Provider`] - Base trait for all providers
//! - [`ChartSource`] - Scrapes one chart week into entries
//! - [`SongMetadataProvider`] - Searches songs and fetches their credits

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::{
    error::Result,
    types::{ChartEntry, EnrichmentRecord},
    unit::Unit,
};

/// Base trait for all providers.
pub trait Provider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "SNEP").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Source of weekly chart pages.
#[async_trait]
pub trait ChartSource: Provider {
    /// Fetches and extracts the chart for one unit.
    ///
    /// Never fails: a fetch failure or an unparseable page yields an empty
    /// vector (logged), and the caller decides how to treat the missing week.
    async fn scrape_week(&self, unit: Unit) -> Vec<ChartEntry>;
}

/// A song matched by a provider search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongHit {
    /// Provider-specific song id.
    pub id: u64,
    /// Song title as known by the provider.
    pub title: String,
    /// Primary artist as known by the provider, when reported.
    pub primary_artist: Option<String>,
}

/// Provider of song credits (producers, writers, release date, samples).
#[async_trait]
pub trait SongMetadataProvider: Provider {
    /// Searches the provider for a song.
    ///
    /// Returns `Ok(None)` when nothing matches.
    async fn search_song(&self, title: &str, artist: &str) -> Result<Option<SongHit>>;

    /// Fetches full song details by id.
    ///
    /// Returns `Ok(None)` when the provider answers with a non-success status.
    async fn song_details(&self, id: u64) -> Result<Option<EnrichmentRecord>>;

    /// Searches then fetches details.
    ///
    /// `Ok(None)` means the provider has no usable record for this song.
    async fn lookup(&self, title: &str, artist: &str) -> Result<Option<EnrichmentRecord>> {
        match self.search_song(title, artist).await? {
            Some(hit) => self.song_details(hit.id).await,
            None => Ok(None),
        }
    }
}
