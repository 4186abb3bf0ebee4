//! # websift-search
//!
//! Multi-backend web search fan-out and page text extraction for websift.
//!
//! ## Design
//!
//! - One adapter per provider (Yandex XML, Google Custom Search JSON)
//!   behind the [`SearchBackend`] capability trait
//! - Every (query variant, backend) pair is searched concurrently
//! - Hits are merged into a single candidate set keyed by exact URL
//! - Graceful degradation: a failing backend or variant contributes
//!   nothing and never fails the overall call
//! - Candidate pages are fetched and normalised to markdown text with
//!   paragraph boundaries preserved
//!
//! ## Security
//!
//! - API keys never appear in error messages or logs
//! - Search queries are logged only at trace level

pub mod config;
pub mod content;
pub mod engine;
pub mod engines;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod types;

pub use config::{GoogleSettings, SearchConfig, YandexSettings};
pub use engine::{RequestOptions, SearchBackend, SearchRequest};
pub use engines::google::domain_of;
pub use engines::Backend;
pub use error::{Result, SearchError};
pub use orchestrator::dedup::CandidateSet;
pub use orchestrator::search::{FanOutReport, UnitFailure};
pub use types::{FetchedPage, Provider, SearchHit};

/// Search every query variant on every configured backend concurrently.
///
/// Each backend's hits are truncated to `config.results_per_query`, then
/// all surviving hits are merged into one set keyed by exact URL. Failed
/// units are logged and listed in [`FanOutReport::failures`].
///
/// # Errors
///
/// Returns [`SearchError::Config`] if `config` is invalid. Backend failures
/// never produce an error here.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> websift_search::Result<()> {
/// let config = websift_search::SearchConfig {
///     google: Some(websift_search::GoogleSettings::new("key", "cx")),
///     ..Default::default()
/// };
/// let variants = vec!["rust ownership".to_owned()];
/// let report = websift_search::search(&variants, &config).await?;
/// for url in report.candidates.urls() {
///     println!("{url}");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search(variants: &[String], config: &SearchConfig) -> Result<FanOutReport> {
    config.validate()?;
    orchestrator::search::orchestrate_search(variants, config).await
}
