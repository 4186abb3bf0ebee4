//! Google Custom Search JSON API backend.
//!
//! Responses carry an `items` array; each item exposes `link` and
//! `snippet`. The domain is not reported separately and is derived from
//! the host of `link`.

use serde::Deserialize;

use crate::config::GoogleSettings;
use crate::engine::{RequestOptions, SearchBackend, SearchRequest};
use crate::error::SearchError;
use crate::types::{Provider, SearchHit};

/// Public Custom Search endpoint.
pub const GOOGLE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// The API rejects `num` above 10.
const MAX_NUM: usize = 10;

/// Google Custom Search adapter.
#[derive(Debug, Clone)]
pub struct GoogleBackend {
    settings: GoogleSettings,
}

impl GoogleBackend {
    /// Create an adapter from resolved settings.
    pub fn new(settings: GoogleSettings) -> Self {
        Self { settings }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    items: Vec<GoogleItem>,
    error: Option<GoogleApiError>,
}

#[derive(Debug, Deserialize)]
struct GoogleItem {
    link: Option<String>,
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleApiError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

impl SearchBackend for GoogleBackend {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn build_request(&self, query: &str, options: &RequestOptions) -> SearchRequest {
        let endpoint = self
            .settings
            .endpoint
            .clone()
            .unwrap_or_else(|| GOOGLE_ENDPOINT.to_owned());
        let num = options.num_results.clamp(1, MAX_NUM);
        // `start` is 1-based.
        let start = options.page as usize * num + 1;

        SearchRequest {
            endpoint,
            params: vec![
                ("key", self.settings.api_key.clone()),
                ("cx", self.settings.cse_id.clone()),
                ("q", query.to_owned()),
                ("num", num.to_string()),
                ("start", start.to_string()),
            ],
        }
    }

    fn parse_response(&self, body: &str) -> Result<Vec<SearchHit>, SearchError> {
        parse_google_json(body)
    }
}

/// Derive `host[:port]` from a URL, or `None` if it does not parse.
pub fn domain_of(link: &str) -> Option<String> {
    let parsed = url::Url::parse(link).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    })
}

/// Parse a Custom Search JSON body into hits.
fn parse_google_json(body: &str) -> Result<Vec<SearchHit>, SearchError> {
    let provider = Provider::Google.name();
    let response: GoogleResponse = serde_json::from_str(body)
        .map_err(|e| SearchError::backend(provider, format!("malformed JSON: {e}")))?;

    if let Some(err) = response.error {
        return Err(SearchError::backend(
            provider,
            format!("API error {}: {}", err.code, err.message),
        ));
    }

    let hits: Vec<SearchHit> = response
        .items
        .into_iter()
        .filter_map(|item| {
            let url = item.link.filter(|link| !link.trim().is_empty())?;
            let domain = domain_of(&url);
            let snippet = item
                .snippet
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty());
            Some(SearchHit {
                url,
                domain,
                snippet,
            })
        })
        .collect();

    tracing::debug!(count = hits.len(), "Google results parsed");
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOCK_GOOGLE_JSON: &str = r#"{
        "kind": "customsearch#search",
        "items": [
            {
                "title": "Rust Programming Language",
                "link": "https://www.rust-lang.org/",
                "snippet": "  A language empowering everyone.  "
            },
            {
                "title": "Local docs",
                "link": "http://localhost:8080/docs",
                "snippet": ""
            },
            { "title": "No link" },
            {
                "link": "https://en.wikipedia.org/wiki/Rust",
                "snippet": "Rust is a multi-paradigm language."
            }
        ]
    }"#;

    fn backend() -> GoogleBackend {
        GoogleBackend::new(GoogleSettings::new("api-key", "engine-id"))
    }

    #[test]
    fn parse_fixture_normalises_fields() {
        let hits = parse_google_json(MOCK_GOOGLE_JSON).expect("should parse");
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].url, "https://www.rust-lang.org/");
        assert_eq!(hits[0].domain.as_deref(), Some("www.rust-lang.org"));
        assert_eq!(hits[0].snippet.as_deref(), Some("A language empowering everyone."));
    }

    #[test]
    fn domain_keeps_explicit_port() {
        let hits = parse_google_json(MOCK_GOOGLE_JSON).expect("should parse");
        assert_eq!(hits[1].domain.as_deref(), Some("localhost:8080"));
        assert!(hits[1].snippet.is_none());
    }

    #[test]
    fn missing_items_is_empty_not_error() {
        let hits = parse_google_json(r#"{"kind": "customsearch#search"}"#).expect("should parse");
        assert!(hits.is_empty());
    }

    #[test]
    fn api_error_body_is_backend_error() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded"}}"#;
        let err = parse_google_json(body).unwrap_err();
        assert!(matches!(err, SearchError::Backend { provider: "Google", .. }));
        assert!(err.to_string().contains("Quota exceeded"));
    }

    #[test]
    fn malformed_json_is_backend_error() {
        let err = parse_google_json("<html>not json</html>").unwrap_err();
        assert!(err.to_string().contains("malformed JSON"));
    }

    #[test]
    fn domain_of_unparseable_link_is_none() {
        assert_eq!(domain_of("not a url"), None);
        assert_eq!(domain_of("https://a.example.com/x?y=1").as_deref(), Some("a.example.com"));
    }

    #[test]
    fn build_request_clamps_num_and_computes_start() {
        let request = backend().build_request(
            "rust",
            &RequestOptions {
                num_results: 25,
                page: 1,
            },
        );
        assert_eq!(request.endpoint, GOOGLE_ENDPOINT);
        assert_eq!(request.param("key"), Some("api-key"));
        assert_eq!(request.param("cx"), Some("engine-id"));
        assert_eq!(request.param("q"), Some("rust"));
        assert_eq!(request.param("num"), Some("10"));
        assert_eq!(request.param("start"), Some("11"));
    }

    #[test]
    fn build_request_first_page_starts_at_one() {
        let request = backend().build_request(
            "rust",
            &RequestOptions {
                num_results: 3,
                page: 0,
            },
        );
        assert_eq!(request.param("num"), Some("3"));
        assert_eq!(request.param("start"), Some("1"));
    }

    #[test]
    fn provider_is_google() {
        assert_eq!(backend().provider(), Provider::Google);
    }
}
