#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/topchart/topchart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SNEP Top Singles chart source.
//!
//! # Usage
//!
//! ```rust,ignore
//! use chart_core::{ChartSource, Unit};
//! use chart_snep::SnepSource;
//!
//! #[tokio::main]
//! async fn main() -> chart_core::Result<()> {
//!     let source = SnepSource::new()?;
//!     let entries = source.scrape_week(Unit::new(2025, 7)?).await;
//!     println!("{} entries", entries.len());
//!     Ok(())
//! }
//! ```

/// HTML extraction of chart entries.
pub mod extract;

pub use extract::extract;

use async_trait::async_trait;
use chart_core::{ChartEntry, ChartError, ChartSource, Provider, Result, Unit};
use reqwest::{Client, Request, StatusCode};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Top Singles page of the SNEP site.
pub const SNEP_BASE_URL: &str = "https://snepmusique.com/les-tops/le-top-de-la-semaine/top-albums/";

/// Chart category requested by default.
pub const DEFAULT_CATEGORY: &str = "Top Singles";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// SNEP chart source.
///
/// Implements [`Provider`] and [`ChartSource`]. The pause between weekly
/// pages belongs to the caller; this type sends one request per call.
#[derive(Debug, Clone)]
pub struct SnepSource {
    client: Client,
    base_url: String,
    category: String,
}

impl SnepSource {
    /// Create a source with the default URL, category and timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Start configuring a source.
    #[must_use]
    pub fn builder() -> SnepSourceBuilder {
        SnepSourceBuilder::default()
    }

    /// Create a source with a custom HTTP client and the default URL and category.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: SNEP_BASE_URL.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    /// Build the page request for a unit.
    fn page_request(&self, unit: Unit) -> Result<Request> {
        self.client
            .get(&self.base_url)
            .query(&[
                ("categorie", self.category.clone()),
                ("semaine", unit.week().to_string()),
                ("annee", unit.year().to_string()),
            ])
            .build()
            .map_err(|e| ChartError::InvalidParameter(e.to_string()))
    }

    /// Fetch the raw HTML of one chart page.
    ///
    /// # Errors
    /// Returns [`ChartError::Network`] on transport failures, timeouts and
    /// non-success statuses, [`ChartError::RateLimited`] on HTTP 429.
    #[instrument(skip(self), fields(unit = %unit))]
    pub async fn fetch_page(&self, unit: Unit) -> Result<String> {
        let request = self.page_request(unit)?;
        debug!("Fetching chart page: {}", request.url());

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| ChartError::Network(e.to_string()))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ChartError::RateLimited {
                provider: self.name().to_string(),
                retry_after: None,
            });
        }

        if !response.status().is_success() {
            return Err(ChartError::Network(format!(
                "HTTP {} for {unit}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ChartError::Network(e.to_string()))
    }
}

impl Provider for SnepSource {
    fn name(&self) -> &str {
        "SNEP"
    }

    fn description(&self) -> &str {
        "SNEP - Weekly French Top Singles chart"
    }
}

#[async_trait]
impl ChartSource for SnepSource {
    async fn scrape_week(&self, unit: Unit) -> Vec<ChartEntry> {
        let html = match self.fetch_page(unit).await {
            Ok(html) => html,
            Err(e) => {
                warn!(%unit, error = %e, "Chart page unavailable");
                return Vec::new();
            }
        };

        let entries = extract(&html, unit);
        if entries.is_empty() {
            warn!(%unit, "No chart entries found on page");
        } else {
            info!(%unit, count = entries.len(), "Scraped chart week");
        }
        entries
    }
}

/// Builder for [`SnepSource`].
#[derive(Debug, Clone)]
pub struct SnepSourceBuilder {
    base_url: String,
    category: String,
    timeout: Duration,
}

impl Default for SnepSourceBuilder {
    fn default() -> Self {
        Self {
            base_url: SNEP_BASE_URL.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SnepSourceBuilder {
    /// Override the page URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the chart category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the source.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn build(self) -> Result<SnepSource> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .build()
            .map_err(|e| ChartError::Network(e.to_string()))?;

        Ok(SnepSource {
            client,
            base_url: self.base_url,
            category: self.category,
        })
    }
}
