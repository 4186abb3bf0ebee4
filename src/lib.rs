//! websift: search-augmented retrieval for question answering.
//!
//! Given a user query (and optionally paraphrased variants) this crate
//! gathers candidate pages from several search backends, extracts the
//! passages most relevant to the query under a size budget, and selects a
//! diverse, relevance-ranked set of passages for an answer generator.
//!
//! # Architecture
//!
//! - **Fan-out search**: every (variant, backend) pair concurrently,
//!   deduplicated by URL (`websift-search`)
//! - **Extraction**: fetch → normalise → chunk → score → budget-select, on a
//!   capped worker pool ([`extract`])
//! - **Diversity rerank**: Maximal Marginal Relevance over embeddings
//!   ([`rerank`])
//! - **Synthesis**: query paraphrasing and grounded answers ([`synthesis`])
//!
//! Model capabilities (relevance scorer, embedder, text generator) are
//! traits in [`models`] and are injected at assembly time.

pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod rerank;
pub mod synthesis;

pub use config::WebsiftConfig;
pub use error::{PipelineError, Result};
pub use extract::{ExtractedDocument, Extractor};
pub use models::{EmbedRole, Embedder, RelevanceScorer, TextGenerator};
pub use pipeline::RetrievalPipeline;
pub use rerank::RankedResult;
pub use synthesis::{Assistant, ParaphraseMode};
