//! Relevance extraction: fetch → normalise → chunk → score → budget-select.
//!
//! Each candidate URL is an independent unit of work. Units run on a pool
//! capped at `workers`, each under its own timeout. A unit that fails (fetch
//! error, non-200 status, empty page, scorer failure, timeout) is logged and
//! contributes nothing; it never fails the batch.

pub mod chunker;
pub mod select;

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, warn};
use websift_search::content;

pub use chunker::Chunker;
pub use select::{join_chunks, select_within_budget};

use crate::config::ExtractionConfig;
use crate::error::{PipelineError, Result};
use crate::models::RelevanceScorer;

/// A bounded span of one page's text.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub text: String,
    pub source_url: String,
}

/// A chunk with its relevance score. Only relative order matters.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// The budgeted, relevance-ordered text extracted from one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub source_url: String,
    pub text: String,
}

/// Runs extraction units against a shared HTTP client and scorer.
pub struct Extractor {
    client: reqwest::Client,
    scorer: Arc<dyn RelevanceScorer>,
    chunker: Chunker,
    config: ExtractionConfig,
}

impl Extractor {
    pub fn new(
        client: reqwest::Client,
        scorer: Arc<dyn RelevanceScorer>,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            client,
            scorer,
            chunker: Chunker::new(config.chunk_size),
            config,
        }
    }

    /// Extract documents from every URL concurrently.
    ///
    /// Surviving documents are returned in the order of `urls`, so the
    /// result does not depend on which unit finished first.
    pub async fn extract_all(&self, urls: &[String], query: &str) -> Vec<ExtractedDocument> {
        let unit_timeout = Duration::from_secs(self.config.unit_timeout_seconds);
        let workers = self.config.workers.max(1);

        let mut outcomes: Vec<(usize, Option<ExtractedDocument>)> = stream::iter(
            urls.iter().enumerate(),
        )
        .map(|(position, url)| async move {
            let outcome = match tokio::time::timeout(unit_timeout, self.extract(url, query)).await
            {
                Ok(Ok(document)) => {
                    if document.is_none() {
                        debug!(url = %url, "no chunk fits the budget, page skipped");
                    }
                    document
                }
                Ok(Err(e)) => {
                    warn!(url = %url, error = %e, "extraction failed, page skipped");
                    None
                }
                Err(_) => {
                    warn!(
                        url = %url,
                        timeout_ms = unit_timeout.as_millis() as u64,
                        "extraction timed out, page skipped"
                    );
                    None
                }
            };
            (position, outcome)
        })
        .buffer_unordered(workers)
        .collect()
        .await;

        outcomes.sort_by_key(|(position, _)| *position);
        let documents: Vec<ExtractedDocument> = outcomes
            .into_iter()
            .filter_map(|(_, document)| document)
            .collect();
        debug!(
            candidates = urls.len(),
            extracted = documents.len(),
            "extraction complete"
        );
        documents
    }

    /// Extract one page.
    ///
    /// Returns `Ok(None)` when the page has no text or its best chunk alone
    /// overflows the budget.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Search`] wrapping a fetch error, or
    /// [`PipelineError::Scoring`] if the scorer fails.
    pub async fn extract(&self, url: &str, query: &str) -> Result<Option<ExtractedDocument>> {
        let page = content::fetch_page(&self.client, url).await?;
        let text = content::html_to_text(&page.html);
        drop(page);

        let pieces = self.chunker.split(&text);
        if pieces.is_empty() {
            return Ok(None);
        }
        let scores = self.score_chunks(query, &pieces).await?;

        let scored: Vec<ScoredChunk> = pieces
            .into_iter()
            .zip(scores)
            .map(|(text, score)| ScoredChunk {
                chunk: Chunk {
                    text,
                    source_url: url.to_owned(),
                },
                score,
            })
            .collect();
        let total_chunks = scored.len();

        let accepted = select_within_budget(scored, self.config.max_document_length);
        debug!(url, total_chunks, accepted = accepted.len(), "chunks selected");
        if accepted.is_empty() {
            return Ok(None);
        }
        Ok(Some(ExtractedDocument {
            source_url: url.to_owned(),
            text: join_chunks(&accepted),
        }))
    }

    async fn score_chunks(&self, query: &str, pieces: &[String]) -> Result<Vec<f32>> {
        let mut scores = Vec::with_capacity(pieces.len());
        for batch in pieces.chunks(self.config.score_batch_size.max(1)) {
            let batch_scores = self.scorer.score_batch(query, batch).await?;
            if batch_scores.len() != batch.len() {
                return Err(PipelineError::Scoring(format!(
                    "{} scores returned for {} chunks",
                    batch_scores.len(),
                    batch.len()
                )));
            }
            scores.extend(batch_scores);
        }
        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Scores a chunk by how many times it mentions the query.
    struct CountingScorer {
        calls: AtomicUsize,
    }

    impl CountingScorer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RelevanceScorer for CountingScorer {
        async fn score_batch(&self, query: &str, texts: &[String]) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| t.matches(query).count() as f32)
                .collect())
        }
    }

    struct FailingScorer;

    #[async_trait]
    impl RelevanceScorer for FailingScorer {
        async fn score_batch(&self, _query: &str, _texts: &[String]) -> Result<Vec<f32>> {
            Err(PipelineError::Scoring("model offline".into()))
        }
    }

    fn config(chunk_size: usize, max_document_length: usize) -> ExtractionConfig {
        ExtractionConfig {
            chunk_size,
            max_document_length,
            workers: 4,
            unit_timeout_seconds: 5,
            score_batch_size: 2,
        }
    }

    async fn serve(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.to_owned()))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn short_page_is_one_whole_document() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/short",
            "<html><body><p>Rust is fast.</p><p>Rust is safe.</p></body></html>",
        )
        .await;

        let extractor = Extractor::new(
            reqwest::Client::new(),
            Arc::new(CountingScorer::new()),
            config(1024, 7500),
        );
        let url = format!("{}/short", server.uri());
        let document = extractor
            .extract(&url, "Rust")
            .await
            .expect("extraction succeeds")
            .expect("document present");
        assert_eq!(document.source_url, url);
        assert_eq!(document.text, "Rust is fast.\n\nRust is safe.");
    }

    #[tokio::test]
    async fn chunks_are_ordered_by_score_and_budgeted() {
        let server = MockServer::start().await;
        let html = format!(
            "<html><body><p>{}</p><p>{}</p><p>{}</p></body></html>",
            "filler text without the keyword here",
            "rust rust rust is the topic of this one",
            "rust shows up once in this paragraph"
        );
        serve(&server, "/page", &html).await;

        let scorer = Arc::new(CountingScorer::new());
        let extractor = Extractor::new(reqwest::Client::new(), scorer.clone(), config(45, 90));
        let url = format!("{}/page", server.uri());
        let document = extractor
            .extract(&url, "rust")
            .await
            .expect("extraction succeeds")
            .expect("document present");

        assert!(document.text.chars().count() <= 90);
        assert!(document.text.starts_with("rust rust rust"));
        assert!(!document.text.contains("filler"));
        // Three chunks at batch size 2 take two scorer calls.
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn oversized_first_chunk_yields_no_document() {
        let server = MockServer::start().await;
        serve(&server, "/big", "<html><body><p>far too long for the budget</p></body></html>").await;

        let extractor = Extractor::new(
            reqwest::Client::new(),
            Arc::new(CountingScorer::new()),
            config(1024, 5),
        );
        let document = extractor
            .extract(&format!("{}/big", server.uri()), "q")
            .await
            .expect("not an error");
        assert!(document.is_none());
    }

    #[tokio::test]
    async fn empty_page_yields_no_document() {
        let server = MockServer::start().await;
        serve(&server, "/empty", "<html><body><script>x()</script></body></html>").await;

        let scorer = Arc::new(CountingScorer::new());
        let extractor = Extractor::new(reqwest::Client::new(), scorer.clone(), config(100, 100));
        let document = extractor
            .extract(&format!("{}/empty", server.uri()), "q")
            .await
            .expect("not an error");
        assert!(document.is_none());
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_units_are_dropped_and_order_is_kept() {
        let server = MockServer::start().await;
        serve(&server, "/a", "<body><p>alpha page</p></body>").await;
        serve(&server, "/c", "<body><p>gamma page</p></body>").await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let extractor = Extractor::new(
            reqwest::Client::new(),
            Arc::new(CountingScorer::new()),
            config(100, 100),
        );
        let urls: Vec<String> = ["/a", "/b", "/c"]
            .iter()
            .map(|p| format!("{}{p}", server.uri()))
            .collect();
        let documents = extractor.extract_all(&urls, "page").await;
        let texts: Vec<&str> = documents.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["alpha page", "gamma page"]);
    }

    #[tokio::test]
    async fn slow_page_times_out_without_blocking_others() {
        let server = MockServer::start().await;
        serve(&server, "/fast", "<body><p>fast page</p></body>").await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<body><p>slow page</p></body>")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let mut cfg = config(100, 100);
        cfg.unit_timeout_seconds = 1;
        let extractor = Extractor::new(reqwest::Client::new(), Arc::new(CountingScorer::new()), cfg);
        let urls = vec![
            format!("{}/slow", server.uri()),
            format!("{}/fast", server.uri()),
        ];
        let documents = extractor.extract_all(&urls, "page").await;
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].text, "fast page");
    }

    #[tokio::test]
    async fn scorer_failure_is_isolated_to_the_unit() {
        let server = MockServer::start().await;
        serve(&server, "/a", "<body><p>alpha</p></body>").await;

        let extractor = Extractor::new(reqwest::Client::new(), Arc::new(FailingScorer), config(100, 100));
        let url = format!("{}/a", server.uri());
        let err = extractor.extract(&url, "q").await.unwrap_err();
        assert!(matches!(err, PipelineError::Scoring(_)));
        assert!(extractor.extract_all(&[url], "q").await.is_empty());
    }
}
