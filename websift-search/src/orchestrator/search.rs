//! Fan-out coordinator: concurrent (variant × backend) searches merged into
//! one deduplicated candidate set.
//!
//! Every unit runs independently under its own timeout. A failing unit
//! contributes zero hits and is reported in [`FanOutReport::failures`];
//! it never fails the overall call. Each unit returns its own hit list and
//! the lists are merged once, sequentially, after all units complete.

use std::time::Duration;

use crate::config::SearchConfig;
use crate::engine::{self, RequestOptions, SearchBackend};
use crate::engines::Backend;
use crate::error::SearchError;
use crate::http;
use crate::types::{Provider, SearchHit};

use super::dedup::{deduplicate, CandidateSet};

/// A (variant, backend) unit that contributed nothing.
#[derive(Debug)]
pub struct UnitFailure {
    /// Index of the query variant in the input list.
    pub variant: usize,
    /// The backend that failed.
    pub provider: Provider,
    /// Why it failed.
    pub error: SearchError,
}

/// Result of one fan-out call.
#[derive(Debug, Default)]
pub struct FanOutReport {
    /// Unique candidate hits, first-seen order.
    pub candidates: CandidateSet,
    /// Units that were isolated as failures.
    pub failures: Vec<UnitFailure>,
}

/// Orchestrate a fan-out search for every configured backend.
///
/// Builds the shared HTTP client and the statically registered adapters
/// from `config`, then delegates to [`fan_out`].
///
/// # Errors
///
/// Returns [`SearchError::Http`] only if the HTTP client cannot be built.
/// Per-unit failures are isolated in the report.
pub async fn orchestrate_search(
    variants: &[String],
    config: &SearchConfig,
) -> Result<FanOutReport, SearchError> {
    let client = http::build_client(config)?;
    let backends = Backend::from_config(config);
    Ok(fan_out(
        variants,
        &backends,
        &client,
        config.results_per_query,
        Duration::from_secs(config.timeout_seconds),
    )
    .await)
}

/// Search every (variant, backend) pair concurrently and merge the hits.
///
/// # Pipeline
///
/// 1. Build one unit per (variant, backend) pair; blank variants are skipped
/// 2. Run all units concurrently with [`futures::future::join_all`], each
///    bounded by `timeout`
/// 3. Truncate each successful unit's hits to `results_per_query`
/// 4. Merge in (variant, backend) order, keeping the first hit per URL
pub async fn fan_out<B: SearchBackend>(
    variants: &[String],
    backends: &[B],
    client: &reqwest::Client,
    results_per_query: usize,
    timeout: Duration,
) -> FanOutReport {
    let options = RequestOptions {
        num_results: results_per_query,
        page: 0,
    };

    let units: Vec<_> = variants
        .iter()
        .enumerate()
        .filter(|(_, variant)| !variant.trim().is_empty())
        .flat_map(move |(index, variant)| {
            backends.iter().map(move |backend| {
                async move {
                    let outcome = run_unit(backend, client, variant, &options, timeout).await;
                    (index, backend.provider(), outcome)
                }
            })
        })
        .collect();

    let unit_count = units.len();
    let outcomes = futures::future::join_all(units).await;

    let mut batches: Vec<Vec<SearchHit>> = Vec::with_capacity(unit_count);
    let mut failures = Vec::new();

    for (variant, provider, outcome) in outcomes {
        match outcome {
            Ok(mut hits) => {
                hits.truncate(results_per_query);
                tracing::debug!(%provider, variant, count = hits.len(), "unit returned hits");
                batches.push(hits);
            }
            Err(error) => {
                tracing::warn!(%provider, variant, %error, "search unit failed");
                failures.push(UnitFailure {
                    variant,
                    provider,
                    error,
                });
            }
        }
    }

    let candidates = deduplicate(batches);
    tracing::debug!(
        units = unit_count,
        failed = failures.len(),
        unique = candidates.len(),
        "fan-out complete"
    );

    FanOutReport {
        candidates,
        failures,
    }
}

/// Run one unit under a timeout, converting expiry into a backend error.
async fn run_unit<B: SearchBackend>(
    backend: &B,
    client: &reqwest::Client,
    query: &str,
    options: &RequestOptions,
    timeout: Duration,
) -> Result<Vec<SearchHit>, SearchError> {
    match tokio::time::timeout(timeout, engine::execute(backend, client, query, options)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(SearchError::backend(
            backend.provider().name(),
            format!("timed out after {}ms", timeout.as_millis()),
        )),
    }
}
