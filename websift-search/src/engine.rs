//! Capability trait for search backend adapters.
//!
//! Each provider (Yandex, Google) implements [`SearchBackend`]: one method
//! builds the provider-specific request, one parses the provider-specific
//! response into [`SearchHit`] values. The HTTP round trip is shared by
//! every adapter in [`execute`].

use crate::error::SearchError;
use crate::types::{Provider, SearchHit};

/// Per-call request options, independent of provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// How many hits the caller wants from this request.
    pub num_results: usize,
    /// Zero-based result page.
    pub page: u32,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            num_results: 10,
            page: 0,
        }
    }
}

/// A fully built backend request: endpoint plus query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Absolute endpoint URL.
    pub endpoint: String,
    /// Query-string parameters, in the order they are sent.
    pub params: Vec<(&'static str, String)>,
}

impl SearchRequest {
    /// Look up a parameter value by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A search provider adapter.
///
/// Adapters hold no mutable state besides static credentials, so they are
/// `Send + Sync` and can be shared across concurrent fan-out units.
pub trait SearchBackend: Send + Sync {
    /// Which provider this adapter speaks to.
    fn provider(&self) -> Provider;

    /// Translate a query into the provider's request shape.
    fn build_request(&self, query: &str, options: &RequestOptions) -> SearchRequest;

    /// Parse a successful response body into normalised hits.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Backend`] if the body is malformed or the
    /// provider reports an error inside a 200 response.
    fn parse_response(&self, body: &str) -> Result<Vec<SearchHit>, SearchError>;
}

/// Run one search against one backend.
///
/// Sends the request built by [`SearchBackend::build_request`], requires a
/// success status, and hands the body to [`SearchBackend::parse_response`].
/// Every failure is reported as [`SearchError::Backend`] tagged with the
/// provider name.
pub async fn execute<B: SearchBackend + ?Sized>(
    backend: &B,
    client: &reqwest::Client,
    query: &str,
    options: &RequestOptions,
) -> Result<Vec<SearchHit>, SearchError> {
    let provider = backend.provider().name();
    let request = backend.build_request(query, options);
    tracing::trace!(provider, query, "backend search");

    let response = client
        .get(&request.endpoint)
        .query(&request.params)
        .send()
        .await
        .map_err(|e| SearchError::backend(provider, format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SearchError::backend(provider, format!("HTTP {status}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| SearchError::backend(provider, format!("response read failed: {e}")))?;

    tracing::trace!(provider, bytes = body.len(), "backend response received");

    let hits = backend.parse_response(&body)?;
    tracing::debug!(provider, count = hits.len(), "backend hits parsed");
    Ok(hits)
}
