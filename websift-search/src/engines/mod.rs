//! Search backend implementations.
//!
//! Each module provides a struct implementing [`crate::engine::SearchBackend`]
//! for one provider. [`Backend`] registers them statically so the fan-out
//! coordinator can hold a homogeneous list.

pub mod google;
pub mod yandex;

pub use google::GoogleBackend;
pub use yandex::YandexBackend;

use crate::config::SearchConfig;
use crate::engine::{RequestOptions, SearchBackend, SearchRequest};
use crate::error::SearchError;
use crate::types::{Provider, SearchHit};

/// Statically registered backend adapters.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Yandex XML.
    Yandex(YandexBackend),
    /// Google Custom Search.
    Google(GoogleBackend),
}

impl Backend {
    /// Build one adapter per backend configured in `config`, in
    /// [`SearchConfig::enabled_providers`] order.
    pub fn from_config(config: &SearchConfig) -> Vec<Backend> {
        let mut backends = Vec::new();
        if let Some(ref yandex) = config.yandex {
            backends.push(Backend::Yandex(YandexBackend::new(yandex.clone())));
        }
        if let Some(ref google) = config.google {
            backends.push(Backend::Google(GoogleBackend::new(google.clone())));
        }
        backends
    }
}

impl SearchBackend for Backend {
    fn provider(&self) -> Provider {
        match self {
            Self::Yandex(b) => b.provider(),
            Self::Google(b) => b.provider(),
        }
    }

    fn build_request(&self, query: &str, options: &RequestOptions) -> SearchRequest {
        match self {
            Self::Yandex(b) => b.build_request(query, options),
            Self::Google(b) => b.build_request(query, options),
        }
    }

    fn parse_response(&self, body: &str) -> Result<Vec<SearchHit>, SearchError> {
        match self {
            Self::Yandex(b) => b.parse_response(body),
            Self::Google(b) => b.parse_response(body),
        }
    }
}
