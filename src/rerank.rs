//! Diversity-aware final selection (Maximal Marginal Relevance).
//!
//! Each step picks the unselected document maximising
//! `lambda * relevance - (1 - lambda) * max_similarity_to_selected`.
//! The penalty is zero before anything is selected, so the first pick is
//! always the most relevant document. Ties go to the earlier document.

use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::extract::ExtractedDocument;
use crate::models::{EmbedRole, Embedder};

/// One selected document, in selection order.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    pub source_url: String,
    pub text: String,
    /// MMR score at the moment this document was selected.
    pub mmr_score: f32,
}

/// Cosine similarity between two vectors. Zero-norm inputs give `0.0`.
///
/// Callers pass vectors of equal dimension; [`rerank`] checks this before
/// selection.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;
    if denom < 1e-12 {
        return 0.0;
    }
    dot / denom
}

/// Pure MMR selection over precomputed embeddings.
///
/// Returns `(document index, mmr score)` pairs in selection order, at most
/// `top_n` of them, with no index repeated.
pub fn mmr_select(
    query_vec: &[f32],
    doc_vecs: &[Vec<f32>],
    top_n: usize,
    lambda: f32,
) -> Vec<(usize, f32)> {
    let relevance: Vec<f32> = doc_vecs
        .iter()
        .map(|doc| cosine_similarity(query_vec, doc))
        .collect();

    // Highest similarity to any selected document, per candidate.
    let mut penalty = vec![0.0_f32; doc_vecs.len()];
    let mut selected = vec![false; doc_vecs.len()];
    let mut picks = Vec::with_capacity(top_n.min(doc_vecs.len()));

    while picks.len() < top_n {
        let mut best: Option<(usize, f32)> = None;
        for (i, rel) in relevance.iter().enumerate() {
            if selected[i] {
                continue;
            }
            let score = lambda * rel - (1.0 - lambda) * penalty[i];
            // Strictly greater keeps the earlier index on ties.
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((i, score));
            }
        }
        let Some((pick, score)) = best else {
            break;
        };
        selected[pick] = true;
        picks.push((pick, score));

        for (i, doc) in doc_vecs.iter().enumerate() {
            if !selected[i] {
                let similarity = cosine_similarity(doc, &doc_vecs[pick]);
                if picks.len() == 1 || similarity > penalty[i] {
                    penalty[i] = similarity;
                }
            }
        }
    }
    picks
}

/// Embed the query and documents, then select up to `top_n` by MMR.
///
/// An empty document list returns an empty result without calling the
/// embedder.
///
/// # Errors
///
/// Returns [`PipelineError::Embedding`] if the embedder fails or returns a
/// different number of vectors than it was given texts.
pub async fn rerank(
    embedder: &dyn Embedder,
    query: &str,
    documents: Vec<ExtractedDocument>,
    top_n: usize,
    lambda: f32,
    batch_size: usize,
) -> Result<Vec<RankedResult>> {
    if documents.is_empty() || top_n == 0 {
        return Ok(Vec::new());
    }

    let query_vec = embedder
        .embed_batch(&[query.to_owned()], EmbedRole::Query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| PipelineError::Embedding("no embedding returned for query".into()))?;

    let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
    let mut doc_vecs = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size.max(1)) {
        let vectors = embedder.embed_batch(batch, EmbedRole::Passage).await?;
        if vectors.len() != batch.len() {
            return Err(PipelineError::Embedding(format!(
                "{} embeddings returned for {} documents",
                vectors.len(),
                batch.len()
            )));
        }
        doc_vecs.extend(vectors);
    }

    let dimension = query_vec.len();
    if let Some((index, odd)) = doc_vecs
        .iter()
        .enumerate()
        .find(|(_, vec)| vec.len() != dimension)
    {
        return Err(PipelineError::Embedding(format!(
            "document {index} embedded with dimension {}, query with {dimension}",
            odd.len()
        )));
    }

    let picks = mmr_select(&query_vec, &doc_vecs, top_n, lambda);
    debug!(
        candidates = documents.len(),
        selected = picks.len(),
        lambda,
        "mmr selection complete"
    );

    let mut slots: Vec<Option<ExtractedDocument>> = documents.into_iter().map(Some).collect();
    Ok(picks
        .into_iter()
        .filter_map(|(index, mmr_score)| {
            slots[index].take().map(|doc| RankedResult {
                source_url: doc.source_url,
                text: doc.text,
                mmr_score,
            })
        })
        .collect())
}
