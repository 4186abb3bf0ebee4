//! Error types for the websift-search crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. No API keys or sensitive data appear in
//! error messages.

/// Errors that can occur during web search and page fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// A search backend request failed: bad status, malformed body or timeout.
    ///
    /// Always tagged with the provider name so the coordinator can report
    /// which backend was isolated.
    #[error("{provider} backend error: {message}")]
    Backend {
        /// Human-readable provider name, e.g. `Yandex`.
        provider: &'static str,
        /// What went wrong.
        message: String,
    },

    /// A page fetch failed (transport error or non-200 status).
    #[error("fetch failed for {url}: {message}")]
    Fetch {
        /// The URL that could not be fetched.
        url: String,
        /// What went wrong.
        message: String,
    },

    /// The HTTP client could not be constructed or used.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Failed to parse a response or document.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl SearchError {
    /// Build a [`SearchError::Backend`] for the given provider.
    pub fn backend(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            provider,
            message: message.into(),
        }
    }

    /// Build a [`SearchError::Fetch`] for the given URL.
    pub fn fetch(url: &str, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.to_owned(),
            message: message.into(),
        }
    }
}

/// Convenience type alias for websift-search results.
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_backend_includes_provider() {
        let err = SearchError::backend("Google", "HTTP 403");
        assert_eq!(err.to_string(), "Google backend error: HTTP 403");
    }

    #[test]
    fn display_fetch_includes_url() {
        let err = SearchError::fetch("https://example.com", "status 404");
        assert_eq!(
            err.to_string(),
            "fetch failed for https://example.com: status 404"
        );
    }

    #[test]
    fn display_parse() {
        let err = SearchError::Parse("unexpected XML structure".into());
        assert_eq!(err.to_string(), "parse error: unexpected XML structure");
    }

    #[test]
    fn display_config() {
        let err = SearchError::Config("results_per_query must be > 0".into());
        assert_eq!(
            err.to_string(),
            "config error: results_per_query must be > 0"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchError>();
    }
}
