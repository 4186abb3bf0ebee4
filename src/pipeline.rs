//! Retrieval pipeline assembly: fan-out search → extraction → MMR rerank.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use websift_search::orchestrator::search::fan_out;
use websift_search::{Backend, FanOutReport};

use crate::config::{RerankConfig, WebsiftConfig};
use crate::error::Result;
use crate::extract::Extractor;
use crate::models::{Embedder, RelevanceScorer};
use crate::rerank::{rerank, RankedResult};

/// The retrieval core with its model capabilities injected.
pub struct RetrievalPipeline {
    backends: Vec<Backend>,
    client: reqwest::Client,
    results_per_query: usize,
    search_timeout: Duration,
    extractor: Extractor,
    embedder: Arc<dyn Embedder>,
    rerank: RerankConfig,
}

impl RetrievalPipeline {
    /// Validate `config`, resolve backend credentials and assemble the
    /// pipeline around the given scorer and embedder.
    ///
    /// # Errors
    ///
    /// Returns a configuration error before any network work is done.
    pub fn new(
        config: &WebsiftConfig,
        scorer: Arc<dyn RelevanceScorer>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self> {
        config.validate()?;
        let search = config.search_config()?;
        let client = websift_search::http::build_client(&search)?;
        Ok(Self {
            backends: Backend::from_config(&search),
            extractor: Extractor::new(client.clone(), scorer, config.extraction.clone()),
            client,
            results_per_query: search.results_per_query,
            search_timeout: Duration::from_secs(search.timeout_seconds),
            embedder,
            rerank: config.rerank.clone(),
        })
    }

    /// Fan out `variants` over every configured backend, reusing the
    /// client built at assembly. Backend failures are listed in the report.
    pub async fn search(&self, variants: &[String]) -> FanOutReport {
        fan_out(
            variants,
            &self.backends,
            &self.client,
            self.results_per_query,
            self.search_timeout,
        )
        .await
    }

    /// Retrieve the top passages for `query`.
    ///
    /// `variants` are searched instead of `query` when non-empty. Chunks are
    /// always scored against `query`. An empty result means nothing relevant
    /// was found.
    ///
    /// # Errors
    ///
    /// Returns an error only for an embedding failure during reranking.
    /// Failing backends and pages are skipped.
    pub async fn retrieve(&self, query: &str, variants: &[String]) -> Result<Vec<RankedResult>> {
        let owned_query;
        let variants = if variants.is_empty() {
            owned_query = [query.to_owned()];
            &owned_query[..]
        } else {
            variants
        };

        let report = self.search(variants).await;
        if !report.failures.is_empty() {
            debug!(failures = report.failures.len(), "some search units failed");
        }
        let urls: Vec<String> = report.candidates.urls().map(str::to_owned).collect();
        info!(variants = variants.len(), candidates = urls.len(), "search complete");

        let documents = self.extractor.extract_all(&urls, query).await;
        if documents.is_empty() {
            info!("no documents survived extraction");
            return Ok(Vec::new());
        }

        let results = rerank(
            self.embedder.as_ref(),
            query,
            documents,
            self.rerank.top_n,
            self.rerank.lambda,
            self.rerank.embed_batch_size,
        )
        .await?;
        info!(results = results.len(), "retrieval complete");
        Ok(results)
    }
}
