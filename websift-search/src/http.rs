//! The HTTP client shared by search adapters and page fetches.
//!
//! One client is built per fan-out from [`SearchConfig`]. Requests carry a
//! browser User-Agent (fixed or picked at random), browser-like `Accept`
//! headers, and an `Accept-Language` matching the configured Yandex locale
//! so that fetched pages come back in the language the backends searched.

use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};

use crate::config::SearchConfig;
use crate::error::SearchError;

/// Redirect hops followed before a page fetch is abandoned.
const MAX_REDIRECTS: usize = 10;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 YaBrowser/24.7.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36 Edg/131.0.0.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Build the client used for one fan-out stage.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if a header value is invalid or the client
/// cannot be constructed.
pub fn build_client(config: &SearchConfig) -> Result<reqwest::Client, SearchError> {
    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| random_user_agent().to_owned());

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    let language = accept_language(config);
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_str(&language)
            .map_err(|e| SearchError::Http(format!("invalid Accept-Language {language:?}: {e}")))?,
    );

    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(user_agent)
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// A browser User-Agent picked uniformly at random.
pub fn random_user_agent() -> &'static str {
    let index = rand::thread_rng().gen_range(0..BROWSER_USER_AGENTS.len());
    BROWSER_USER_AGENTS[index]
}

/// `Accept-Language` for the configured locale, English as fallback.
fn accept_language(config: &SearchConfig) -> String {
    match config.yandex {
        Some(ref yandex) if !yandex.lang.trim().is_empty() && yandex.lang != "en" => {
            format!("{},en;q=0.8", yandex.lang.trim())
        }
        _ => "en".to_owned(),
    }
}
