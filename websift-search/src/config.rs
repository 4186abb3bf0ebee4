//! Search configuration with sensible defaults.
//!
//! [`SearchConfig`] controls which backends are queried, how many hits each
//! contributes, timeouts and request behaviour. Credentials arrive here
//! already resolved; secret lookup happens in the application layer.

use crate::error::SearchError;
use crate::types::Provider;

/// Default Yandex region (`lr`), Moscow.
pub const DEFAULT_YANDEX_REGION: u32 = 213;

/// Default Yandex interface language (`l10n`).
pub const DEFAULT_YANDEX_LANG: &str = "ru";

/// Credentials and locale settings for the Yandex XML backend.
#[derive(Debug, Clone)]
pub struct YandexSettings {
    /// API key (`apikey`).
    pub api_key: String,
    /// Cloud folder identifier (`folderid`).
    pub folder_id: String,
    /// Region code (`lr`).
    pub region: u32,
    /// Interface language (`l10n`).
    pub lang: String,
    /// Override for the request endpoint. `None` uses the public API.
    pub endpoint: Option<String>,
}

impl YandexSettings {
    /// Settings with default region and language.
    pub fn new(api_key: impl Into<String>, folder_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            folder_id: folder_id.into(),
            region: DEFAULT_YANDEX_REGION,
            lang: DEFAULT_YANDEX_LANG.to_owned(),
            endpoint: None,
        }
    }
}

/// Credentials for the Google Custom Search backend.
#[derive(Debug, Clone)]
pub struct GoogleSettings {
    /// API key (`key`).
    pub api_key: String,
    /// Programmable search engine identifier (`cx`).
    pub cse_id: String,
    /// Override for the request endpoint. `None` uses the public API.
    pub endpoint: Option<String>,
}

impl GoogleSettings {
    /// Settings against the public endpoint.
    pub fn new(api_key: impl Into<String>, cse_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            cse_id: cse_id.into(),
            endpoint: None,
        }
    }
}

/// Configuration for a fan-out search operation.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Yandex backend settings. `None` disables the backend.
    pub yandex: Option<YandexSettings>,
    /// Google backend settings. `None` disables the backend.
    pub google: Option<GoogleSettings>,
    /// Hits kept from each (variant, backend) pair before merging.
    pub results_per_query: usize,
    /// Per-request timeout in seconds, applied to searches and page fetches.
    pub timeout_seconds: u64,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            yandex: None,
            google: None,
            results_per_query: 10,
            timeout_seconds: 10,
            user_agent: None,
        }
    }
}

impl SearchConfig {
    /// Providers that have settings and will be queried.
    pub fn enabled_providers(&self) -> Vec<Provider> {
        let mut providers = Vec::new();
        if self.yandex.is_some() {
            providers.push(Provider::Yandex);
        }
        if self.google.is_some() {
            providers.push(Provider::Google);
        }
        providers
    }

    /// Reject configurations the fan-out cannot run with: no backend, a
    /// zero hit limit or timeout, or blank credentials on an enabled backend.
    pub fn validate(&self) -> Result<(), SearchError> {
        let problem = if self.enabled_providers().is_empty() {
            Some("no search backend is configured")
        } else if self.results_per_query == 0 {
            Some("results_per_query must be at least 1")
        } else if self.timeout_seconds == 0 {
            Some("timeout_seconds must be at least 1")
        } else if self
            .yandex
            .as_ref()
            .is_some_and(|y| blank(&y.api_key) || blank(&y.folder_id))
        {
            Some("yandex needs both api_key and folder_id")
        } else if self
            .google
            .as_ref()
            .is_some_and(|g| blank(&g.api_key) || blank(&g.cse_id))
        {
            Some("google needs both api_key and cse_id")
        } else {
            None
        };
        match problem {
            Some(message) => Err(SearchError::Config(message.to_owned())),
            None => Ok(()),
        }
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}
