//! Core types for search hits, provider identification and fetched pages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single hit returned by a search backend, normalised across providers.
///
/// Equality for deduplication is by `url` only (exact string match).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// The URL of the hit.
    pub url: String,
    /// Host name of the hit, when the provider reports or implies one.
    pub domain: Option<String>,
    /// Provider-supplied passage summarising the page.
    pub snippet: Option<String>,
}

impl SearchHit {
    /// Create a hit with only a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            domain: None,
            snippet: None,
        }
    }
}

/// Search providers that websift-search has adapters for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// Yandex Search XML API.
    Yandex,
    /// Google Custom Search JSON API.
    Google,
}

impl Provider {
    /// Returns the human-readable name of this provider.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Yandex => "Yandex",
            Self::Google => "Google",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw page body as fetched. Owned by a single extraction unit.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was fetched.
    pub url: String,
    /// The response body.
    pub html: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_hit_new_has_no_optional_fields() {
        let hit = SearchHit::new("https://example.com");
        assert_eq!(hit.url, "https://example.com");
        assert!(hit.domain.is_none());
        assert!(hit.snippet.is_none());
    }

    #[test]
    fn provider_display() {
        assert_eq!(Provider::Yandex.to_string(), "Yandex");
        assert_eq!(Provider::Google.to_string(), "Google");
    }

    #[test]
    fn provider_serde_round_trip() {
        let json = serde_json::to_string(&Provider::Google).expect("serialize");
        let decoded: Provider = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, Provider::Google);
    }

    #[test]
    fn search_hit_serializes_missing_fields_as_null() {
        let hit = SearchHit::new("https://a.com");
        let json = serde_json::to_value(&hit).expect("serialize");
        assert!(json["domain"].is_null());
        assert!(json["snippet"].is_null());
    }
}
