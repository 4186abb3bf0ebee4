//! Cross-encoder scoring over a text-embeddings-inference style `/rerank` API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{HttpEndpoint, RelevanceScorer};
use crate::config::ModelEndpoint;
use crate::error::{PipelineError, Result};

/// Relevance scorer that calls `POST {base_url}/rerank`.
#[derive(Clone)]
pub struct HttpRelevanceScorer {
    endpoint: HttpEndpoint,
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    texts: &'a [String],
    raw_scores: bool,
}

#[derive(Deserialize)]
struct RerankEntry {
    index: usize,
    score: f32,
}

impl HttpRelevanceScorer {
    /// Build a scorer from endpoint configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the API key cannot be resolved
    /// or the HTTP client cannot be built.
    pub fn new(config: &ModelEndpoint) -> Result<Self> {
        Ok(Self {
            endpoint: HttpEndpoint::from_config(config)?,
        })
    }
}

#[async_trait]
impl RelevanceScorer for HttpRelevanceScorer {
    async fn score_batch(&self, query: &str, texts: &[String]) -> Result<Vec<f32>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = RerankRequest {
            model: &self.endpoint.model,
            query,
            texts,
            raw_scores: true,
        };
        let entries: Vec<RerankEntry> = self
            .endpoint
            .post_json("rerank", &request)
            .await
            .map_err(PipelineError::Scoring)?;

        // The server returns entries sorted by score; map them back to input order.
        let mut scores: Vec<Option<f32>> = vec![None; texts.len()];
        for entry in entries {
            let slot = scores.get_mut(entry.index).ok_or_else(|| {
                PipelineError::Scoring(format!(
                    "score index {} out of range for {} texts",
                    entry.index,
                    texts.len()
                ))
            })?;
            *slot = Some(entry.score);
        }
        scores
            .into_iter()
            .enumerate()
            .map(|(i, score)| {
                score.ok_or_else(|| PipelineError::Scoring(format!("no score returned for text {i}")))
            })
            .collect()
    }
}
