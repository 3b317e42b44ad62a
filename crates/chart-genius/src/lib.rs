#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/topchart/topchart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Genius song metadata provider.
//!
//! # Usage
//!
//! ```rust,ignore
//! use chart_core::SongMetadataProvider;
//! use chart_genius::GeniusProvider;
//!
//! #[tokio::main]
//! async fn main() -> chart_core::Result<()> {
//!     let provider = GeniusProvider::new("your_access_token")?;
//!     if let Some(record) = provider.lookup("God's Plan", "Drake").await? {
//!         println!("produced by {:?}", record.producer_1);
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chart_core::{
    CacheKey, ChartError, EnrichmentRecord, Provider, Result, SampleType, SongHit,
    SongMetadataProvider,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// Base URL for the Genius API.
pub const GENIUS_BASE_URL: &str = "https://api.genius.com";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Extra attempts after a transient failure.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Pause before the first retry, grown linearly with each attempt.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Genius API provider.
///
/// Implements [`Provider`] and [`SongMetadataProvider`]. Requests carry the
/// access token as a bearer token. Transport errors, timeouts, HTTP 429 and
/// 5xx responses are retried.
#[derive(Clone)]
pub struct GeniusProvider {
    client: Client,
    access_token: String,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl fmt::Debug for GeniusProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeniusProvider")
            .field("access_token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl GeniusProvider {
    /// Create a new Genius provider with the given access token.
    ///
    /// # Errors
    /// Returns [`ChartError::ProviderNotConfigured`] for a blank token, or an
    /// error if the HTTP client cannot be built.
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ChartError::Network(e.to_string()))?;
        Self::with_client(client, access_token)
    }

    /// Create a new Genius provider with a custom HTTP client.
    ///
    /// # Errors
    /// Returns [`ChartError::ProviderNotConfigured`] for a blank token.
    pub fn with_client(client: Client, access_token: impl Into<String>) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(ChartError::ProviderNotConfigured(
                "Genius access token is empty".to_string(),
            ));
        }
        Ok(Self {
            client,
            access_token,
            base_url: GENIUS_BASE_URL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Point the provider at another API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Override the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Error for a non-success status, `None` on success.
    fn status_error(&self, status: StatusCode) -> Option<ChartError> {
        if status.is_success() {
            return None;
        }
        Some(match status {
            StatusCode::TOO_MANY_REQUESTS => ChartError::RateLimited {
                provider: self.name().to_string(),
                retry_after: None,
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ChartError::AuthenticationFailed(format!("Genius answered HTTP {status}"))
            }
            StatusCode::NOT_FOUND => ChartError::NotFound(format!("Genius answered HTTP {status}")),
            status if status.is_server_error() => ChartError::Network(format!("HTTP {status}")),
            status => ChartError::Other(format!("unexpected Genius status HTTP {status}")),
        })
    }

    /// Send a request, retrying transient failures.
    ///
    /// A response is returned only with a success status. Transport failures,
    /// HTTP 429 and 5xx are retried up to `max_retries` times.
    async fn send_with_retry(&self, build: impl Fn() -> RequestBuilder) -> Result<Response> {
        let mut attempt = 0;
        loop {
            let outcome = match build().bearer_auth(&self.access_token).send().await {
                Ok(response) => match self.status_error(response.status()) {
                    Some(e) => Err(e),
                    None => Ok(response),
                },
                Err(e) => Err(ChartError::Network(e.to_string())),
            };

            match outcome {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(error = %e, attempt, "Genius request failed, retrying");
                    sleep(self.retry_delay * attempt).await;
                }
                outcome => return outcome,
            }
        }
    }

    /// GET a JSON document. `Ok(None)` when Genius has no such resource.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        let url = format!("{}{path}", self.base_url);
        debug!("Genius request: {}", path);

        let response = match self
            .send_with_retry(|| self.client.get(&url).query(query))
            .await
        {
            Ok(response) => response,
            Err(ChartError::NotFound(e)) => {
                debug!(error = %e, "Genius resource not found");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let text = response
            .text()
            .await
            .map_err(|e| ChartError::Network(e.to_string()))?;
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ChartError::Parse(format!("{e}: {text}")))
    }
}

impl Provider for GeniusProvider {
    fn name(&self) -> &str {
        "Genius"
    }

    fn description(&self) -> &str {
        "Genius - Song credits, release dates and samples"
    }
}

#[async_trait]
impl SongMetadataProvider for GeniusProvider {
    #[instrument(skip(self))]
    async fn search_song(&self, title: &str, artist: &str) -> Result<Option<SongHit>> {
        let query = format!("{title} {artist}");
        let Some(envelope) = self
            .get_json::<Envelope<SearchResponse>>("/search", &[("q", query.as_str())])
            .await?
        else {
            return Ok(None);
        };

        let hit = pick_hit(envelope.response.hits, title);
        match &hit {
            Some(hit) => debug!(id = hit.id, title = %hit.title, "Genius search matched"),
            None => debug!("Genius search found no song"),
        }
        Ok(hit)
    }

    #[instrument(skip(self))]
    async fn song_details(&self, id: u64) -> Result<Option<EnrichmentRecord>> {
        let envelope = self
            .get_json::<Envelope<SongResponse>>(&format!("/songs/{id}"), &[])
            .await?;
        Ok(envelope.map(|envelope| record_from_song(envelope.response.song)))
    }
}

/// Picks the song hit whose title matches the query title, else the first song hit.
fn pick_hit(hits: Vec<GeniusHit>, title: &str) -> Option<SongHit> {
    let wanted = CacheKey::normalize(title);
    let songs: Vec<GeniusSongSummary> = hits
        .into_iter()
        .filter(|hit| hit.kind == "song")
        .map(|hit| hit.result)
        .collect();

    let index = songs
        .iter()
        .position(|song| CacheKey::normalize(&song.title) == wanted)
        .unwrap_or(0);

    songs.into_iter().nth(index).map(|song| SongHit {
        id: song.id,
        title: song.title,
        primary_artist: song.primary_artist.map(|artist| artist.name),
    })
}

/// Maps song details onto an enrichment record.
fn record_from_song(song: GeniusSong) -> EnrichmentRecord {
    let mut producers = song.producer_artists.into_iter().map(|a| a.name);
    let mut writers = song.writer_artists.into_iter().map(|a| a.name);

    let mut record = EnrichmentRecord {
        producer_1: producers.next(),
        producer_2: producers.next(),
        writer_1: writers.next(),
        writer_2: writers.next(),
        release_date: song.release_date,
        ..EnrichmentRecord::absent()
    };

    let relationship = song.song_relationships.into_iter().find_map(|rel| {
        let kind = rel.relationship_type.to_lowercase();
        let reuses = kind.contains("sample") || kind.contains("interpolat");
        let source = rel.songs.into_iter().next()?;
        reuses.then_some((kind, source))
    });

    if let Some((kind, source)) = relationship {
        let sample_type = if kind.contains("sample") {
            SampleType::Sample
        } else {
            SampleType::Interpolation
        };
        let artist = source
            .primary_artist
            .map(|artist| artist.name)
            .filter(|name| !name.is_empty());
        let from = match artist {
            Some(artist) => format!("{} - {artist}", source.title),
            None => source.title,
        };
        record.set_sample(sample_type, from);
    }

    record
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: T,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<GeniusHit>,
}

#[derive(Debug, Deserialize)]
struct GeniusHit {
    #[serde(rename = "type")]
    kind: String,
    result: GeniusSongSummary,
}

#[derive(Debug, Deserialize)]
struct GeniusSongSummary {
    id: u64,
    #[serde(default)]
    title: String,
    primary_artist: Option<GeniusArtist>,
}

#[derive(Debug, Deserialize)]
struct SongResponse {
    song: GeniusSong,
}

#[derive(Debug, Deserialize)]
struct GeniusSong {
    release_date: Option<String>,
    #[serde(default)]
    producer_artists: Vec<GeniusArtist>,
    #[serde(default)]
    writer_artists: Vec<GeniusArtist>,
    #[serde(default)]
    song_relationships: Vec<GeniusRelationship>,
}

#[derive(Debug, Deserialize)]
struct GeniusArtist {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct GeniusRelationship {
    #[serde(default)]
    relationship_type: String,
    #[serde(default)]
    songs: Vec<GeniusRelatedSong>,
}

#[derive(Debug, Deserialize)]
struct GeniusRelatedSong {
    #[serde(default)]
    title: String,
    primary_artist: Option<GeniusArtist>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned `(status, body)` per connection, recording request heads.
    async fn serve(responses: Vec<(u16, String)>) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    head.extend_from_slice(&buf[..n]);
                }
                seen.lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&head).into_owned());

                let reply = format!(
                    "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        (format!("http://{addr}"), requests)
    }

    fn provider(base_url: &str) -> GeniusProvider {
        GeniusProvider::new("secret-token")
            .unwrap()
            .with_base_url(base_url)
            .with_retry(3, Duration::ZERO)
    }

    fn search_body() -> String {
        r#"{"meta": {"status": 200}, "response": {"hits": [
            {"type": "album", "result": {"id": 1, "title": "Scorpion"}},
            {"type": "song", "result": {"id": 2, "title": "God's Plan (Remix)", "primary_artist": {"name": "Drake"}}},
            {"type": "song", "result": {"id": 3, "title": "God's Plan", "primary_artist": {"name": "Drake"}}}
        ]}}"#
            .to_string()
    }

    fn song_body() -> String {
        r#"{"meta": {"status": 200}, "response": {"song": {
            "id": 3,
            "title": "God's Plan",
            "release_date": "2018-01-19",
            "producer_artists": [{"name": "Cardo"}, {"name": "Yung Exclusive"}, {"name": "Boi-1da"}],
            "writer_artists": [{"name": "Drake"}],
            "song_relationships": [
                {"relationship_type": "translations", "songs": [{"title": "God's Plan (Traduction)"}]},
                {"relationship_type": "samples", "songs": []},
                {"relationship_type": "interpolates", "songs": [
                    {"title": "Intro", "primary_artist": {"name": "Kanye West"}}
                ]}
            ]
        }}}"#
            .to_string()
    }

    #[test]
    fn test_debug_redacts_token() {
        let provider = GeniusProvider::new("secret-token").unwrap();
        let debug = format!("{provider:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret-token"));
    }

    #[test]
    fn test_blank_token_is_not_configured() {
        assert!(matches!(
            GeniusProvider::new("  "),
            Err(ChartError::ProviderNotConfigured(_))
        ));
    }

    #[test]
    fn test_pick_hit_prefers_exact_title() {
        let envelope: Envelope<SearchResponse> = serde_json::from_str(&search_body()).unwrap();
        let hit = pick_hit(envelope.response.hits, "GOD'S PLAN").unwrap();
        assert_eq!(hit.id, 3);
        assert_eq!(hit.primary_artist.as_deref(), Some("Drake"));
    }

    #[test]
    fn test_pick_hit_falls_back_to_first_song() {
        let envelope: Envelope<SearchResponse> = serde_json::from_str(&search_body()).unwrap();
        let hit = pick_hit(envelope.response.hits, "Hotline Bling").unwrap();
        assert_eq!(hit.id, 2);

        assert!(pick_hit(Vec::new(), "anything").is_none());
    }

    #[test]
    fn test_record_from_song() {
        let envelope: Envelope<SongResponse> = serde_json::from_str(&song_body()).unwrap();
        let record = record_from_song(envelope.response.song);

        assert_eq!(record.producer_1.as_deref(), Some("Cardo"));
        assert_eq!(record.producer_2.as_deref(), Some("Yung Exclusive"));
        assert_eq!(record.writer_1.as_deref(), Some("Drake"));
        assert_eq!(record.writer_2, None);
        assert_eq!(record.release_date.as_deref(), Some("2018-01-19"));
        assert_eq!(record.sample_type, Some(SampleType::Interpolation));
        assert_eq!(record.sample_from.as_deref(), Some("Intro - Kanye West"));
    }

    #[test]
    fn test_record_from_sparse_song() {
        let song: GeniusSong = serde_json::from_str(
            r#"{"release_date": null, "song_relationships": [
                {"relationship_type": "Samples", "songs": [{"title": "Bella"}]}
            ]}"#,
        )
        .unwrap();
        let record = record_from_song(song);

        assert!(record.producer_1.is_none());
        assert!(record.release_date.is_none());
        assert_eq!(record.sample_type, Some(SampleType::Sample));
        assert_eq!(record.sample_from.as_deref(), Some("Bella"));
    }

    #[tokio::test]
    async fn test_lookup_searches_then_fetches_details() {
        let (base_url, requests) =
            serve(vec![(200, search_body()), (200, song_body())]).await;

        let record = provider(&base_url)
            .lookup("God's Plan", "Drake")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.producer_1.as_deref(), Some("Cardo"));

        let requests = requests.lock().unwrap();
        assert!(requests[0].starts_with("GET /search?q="));
        assert!(requests[1].starts_with("GET /songs/3 "));
        assert!(
            requests[0]
                .to_lowercase()
                .contains("authorization: bearer secret-token")
        );
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let (base_url, requests) = serve(vec![
            (503, String::new()),
            (429, String::new()),
            (200, song_body()),
        ])
        .await;

        let record = provider(&base_url).song_details(3).await.unwrap();
        assert!(record.is_some());
        assert_eq!(requests.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let (base_url, _) = serve(vec![(500, String::new()), (500, String::new())]).await;

        let result = provider(&base_url)
            .with_retry(1, Duration::ZERO)
            .song_details(3)
            .await;
        assert!(matches!(result, Err(ChartError::Network(_))));
    }

    #[tokio::test]
    async fn test_not_found_is_none() {
        let (base_url, _) = serve(vec![(404, "{}".to_string())]).await;
        assert_eq!(provider(&base_url).song_details(9).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_authentication_failure_is_not_retried() {
        let (base_url, requests) = serve(vec![(401, "{}".to_string())]).await;

        let result = provider(&base_url).song_details(3).await;
        assert!(matches!(result, Err(ChartError::AuthenticationFailed(_))));
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_outlasting_retries() {
        let (base_url, requests) = serve(vec![(429, String::new()), (429, String::new())]).await;

        let result = provider(&base_url)
            .with_retry(1, Duration::ZERO)
            .song_details(3)
            .await;
        assert!(matches!(result, Err(ChartError::RateLimited { .. })));
        assert_eq!(requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unexpected_status_is_an_error() {
        let (base_url, requests) = serve(vec![(400, "{}".to_string())]).await;

        let result = provider(&base_url).song_details(3).await;
        assert!(matches!(result, Err(ChartError::Other(_))));
        assert_eq!(requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_status_errors() {
        let provider = GeniusProvider::new("secret-token").unwrap();

        assert!(provider.status_error(StatusCode::OK).is_none());
        assert!(matches!(
            provider.status_error(StatusCode::NOT_FOUND),
            Some(ChartError::NotFound(_))
        ));
        assert!(
            provider
                .status_error(StatusCode::BAD_GATEWAY)
                .is_some_and(|e| e.is_transient())
        );
        assert!(
            provider
                .status_error(StatusCode::FORBIDDEN)
                .is_some_and(|e| !e.is_transient())
        );
    }
}
