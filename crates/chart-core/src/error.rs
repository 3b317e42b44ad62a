//! Error types for chart operations.
//!
//! This module defines [`ChartError`] which covers all error cases that can occur
//! when fetching chart pages, querying the metadata provider, caching, or persisting.

use thiserror::Error;

/// Errors that can occur during chart operations.
#[derive(Error, Debug)]
pub enum ChartError {
    /// Network-related errors (connection failures, timeouts, non-2xx pages, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by a provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// The requested song or page was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Error parsing data from a page or a provider response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error reading or writing a cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Error interacting with the persistence store.
    #[error("Store error: {0}")]
    Store(String),

    /// The requested provider is not configured.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Authentication failed for a provider.
    #[error("Authentication failed for provider {0}")]
    AuthenticationFailed(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl ChartError {
    /// Returns true for failures worth retrying (network faults and rate limits).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited { .. })
    }
}

/// Result type alias using [`ChartError`].
pub type Result<T> = std::result::Result<T, ChartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors() {
        assert!(ChartError::Network("reset".to_string()).is_transient());
        assert!(
            ChartError::RateLimited {
                provider: "Genius".to_string(),
                retry_after: None,
            }
            .is_transient()
        );
        assert!(!ChartError::NotFound("/songs/9".to_string()).is_transient());
        assert!(!ChartError::AuthenticationFailed("Genius".to_string()).is_transient());
        assert!(!ChartError::Other("HTTP 400".to_string()).is_transient());
    }
}
