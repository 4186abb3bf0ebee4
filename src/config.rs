//! Configuration types for the retrieval pipeline.
//!
//! Loaded from TOML. Every section has defaults, so an empty file is a
//! valid starting point; only backend credentials must be supplied.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use websift_search::{GoogleSettings, SearchConfig, YandexSettings};

use crate::error::{PipelineError, Result};
use crate::synthesis::ParaphraseMode;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebsiftConfig {
    /// Search backends and fan-out settings.
    pub search: SearchSection,
    /// Page extraction settings.
    pub extraction: ExtractionConfig,
    /// Diversity reranking settings.
    pub rerank: RerankConfig,
    /// Model capability endpoints.
    pub models: ModelsConfig,
    /// Conversational assistant settings.
    pub assistant: AssistantConfig,
}

/// Reference to a secret value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SecretRef {
    /// No secret.
    #[default]
    None,
    /// Inline literal value (discouraged; prefer `env`).
    Literal { value: String },
    /// Resolve from an environment variable.
    Env { var: String },
}

impl SecretRef {
    /// Resolve the secret.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the referenced environment
    /// variable is missing or empty.
    pub fn resolve(&self) -> Result<Option<String>> {
        match self {
            Self::None => Ok(None),
            Self::Literal { value } => Ok(Some(value.clone())),
            Self::Env { var } => {
                let value = std::env::var(var).map_err(|_| {
                    PipelineError::Config(format!("secret env var is missing: {var}"))
                })?;
                if value.trim().is_empty() {
                    return Err(PipelineError::Config(format!(
                        "secret env var is empty: {var}"
                    )));
                }
                Ok(Some(value))
            }
        }
    }
}

/// Search fan-out settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    /// Yandex XML backend. Absent disables it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yandex: Option<YandexSection>,
    /// Google Custom Search backend. Absent disables it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google: Option<GoogleSection>,
    /// Hits kept per (variant, backend) pair.
    pub results_per_query: usize,
    /// Per-request timeout in seconds for searches and page fetches.
    pub timeout_seconds: u64,
    /// Fixed User-Agent. `None` rotates browser User-Agents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for SearchSection {
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

/// Yandex XML credentials and locale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YandexSection {
    /// API key.
    pub api_key: SecretRef,
    /// Cloud folder identifier.
    pub folder_id: String,
    /// Region code (`lr`).
    #[serde(default = "default_yandex_region")]
    pub region: u32,
    /// Interface language (`l10n`).
    #[serde(default = "default_yandex_lang")]
    pub lang: String,
    /// Endpoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

fn default_yandex_region() -> u32 {
    websift_search::config::DEFAULT_YANDEX_REGION
}

fn default_yandex_lang() -> String {
    websift_search::config::DEFAULT_YANDEX_LANG.to_owned()
}

/// Google Custom Search credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleSection {
    /// API key.
    pub api_key: SecretRef,
    /// Programmable search engine identifier.
    pub cse_id: String,
    /// Endpoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Page extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Target chunk size in characters. Overlap is always half of this.
    pub chunk_size: usize,
    /// Character budget for one extracted document.
    pub max_document_length: usize,
    /// Maximum pages processed concurrently.
    pub workers: usize,
    /// Time limit for one page (fetch, normalise, score) in seconds.
    pub unit_timeout_seconds: u64,
    /// Chunks sent to the relevance scorer per request.
    pub score_batch_size: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            max_document_length: 7500,
            workers: 8,
            unit_timeout_seconds: 30,
            score_batch_size: 32,
        }
    }
}

impl ExtractionConfig {
    /// Chunk overlap, derived from the chunk size.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_size / 2
    }
}

/// Diversity reranking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    /// Relevance/diversity trade-off in `[0, 1]`; 1 is pure relevance.
    pub lambda: f32,
    /// Number of documents to select.
    pub top_n: usize,
    /// Texts sent to the embedder per request.
    pub embed_batch_size: usize,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            lambda: 0.5,
            top_n: 5,
            embed_batch_size: 16,
        }
    }
}

/// One model capability endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEndpoint {
    /// API base URL.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Bearer token, if the endpoint needs one.
    #[serde(default)]
    pub api_key: SecretRef,
    /// Request timeout in seconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_seconds: u64,
}

fn default_model_timeout() -> u64 {
    60
}

impl ModelEndpoint {
    fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
            model: model.to_owned(),
            api_key: SecretRef::None,
            timeout_seconds: default_model_timeout(),
        }
    }
}

/// Model capability endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Cross-encoder relevance scorer (`/rerank` API).
    pub scorer: ModelEndpoint,
    /// Bi-encoder embedder (OpenAI-compatible `/embeddings`).
    pub embedder: ModelEndpoint,
    /// Chat model (OpenAI-compatible `/chat/completions`).
    pub generator: ModelEndpoint,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            scorer: ModelEndpoint::new(
                "http://127.0.0.1:8080",
                "cross-encoder/ms-marco-MiniLM-L-6-v2",
            ),
            embedder: ModelEndpoint::new("http://127.0.0.1:8081/v1", "intfloat/multilingual-e5-base"),
            generator: ModelEndpoint::new("http://127.0.0.1:11434/v1", "llama3.1"),
        }
    }
}

/// Conversational assistant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// How the query is paraphrased before searching.
    pub paraphrase_mode: ParaphraseMode,
    /// Conversation turns (user + assistant pairs) kept as history.
    pub max_history_turns: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            paraphrase_mode: ParaphraseMode::Simplify,
            max_history_turns: 5,
        }
    }
}

impl WebsiftConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| PipelineError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| PipelineError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/websift/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("websift").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("websift")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/websift-config/config.toml")
        }
    }

    /// Check every numeric setting before any work begins.
    ///
    /// Backend credentials are checked separately by [`Self::search_config`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(PipelineError::Config(msg.to_owned()));

        if self.search.yandex.is_none() && self.search.google.is_none() {
            return fail("at least one search backend must be configured");
        }
        if self.search.results_per_query == 0 {
            return fail("results_per_query must be greater than 0");
        }
        if self.search.timeout_seconds == 0 {
            return fail("timeout_seconds must be greater than 0");
        }
        let extraction = &self.extraction;
        if extraction.chunk_size <= extraction.chunk_overlap() {
            return fail("chunk_size must be greater than its overlap (chunk_size / 2)");
        }
        if extraction.max_document_length == 0 {
            return fail("max_document_length must be greater than 0");
        }
        if extraction.workers == 0 {
            return fail("workers must be greater than 0");
        }
        if extraction.unit_timeout_seconds == 0 {
            return fail("unit_timeout_seconds must be greater than 0");
        }
        if extraction.score_batch_size == 0 {
            return fail("score_batch_size must be greater than 0");
        }
        if !(0.0..=1.0).contains(&self.rerank.lambda) {
            return fail("lambda must be within [0, 1]");
        }
        if self.rerank.top_n == 0 {
            return fail("top_n must be greater than 0");
        }
        if self.rerank.embed_batch_size == 0 {
            return fail("embed_batch_size must be greater than 0");
        }
        Ok(())
    }

    /// Resolve backend credentials into a [`SearchConfig`].
    ///
    /// A backend whose `api_key` is unset is left disabled.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if a configured backend's secret
    /// cannot be resolved, or [`PipelineError::Search`] if no backend is
    /// left enabled or a credential is blank.
    pub fn search_config(&self) -> Result<SearchConfig> {
        let mut yandex = None;
        if let Some(ref section) = self.search.yandex {
            match section.api_key.resolve()? {
                Some(api_key) => {
                    yandex = Some(YandexSettings {
                        api_key,
                        folder_id: section.folder_id.clone(),
                        region: section.region,
                        lang: section.lang.clone(),
                        endpoint: section.endpoint.clone(),
                    });
                }
                None => tracing::debug!("yandex api_key not set, backend disabled"),
            }
        }
        let mut google = None;
        if let Some(ref section) = self.search.google {
            match section.api_key.resolve()? {
                Some(api_key) => {
                    google = Some(GoogleSettings {
                        api_key,
                        cse_id: section.cse_id.clone(),
                        endpoint: section.endpoint.clone(),
                    });
                }
                None => tracing::debug!("google api_key not set, backend disabled"),
            }
        }

        let config = SearchConfig {
            yandex,
            google,
            results_per_query: self.search.results_per_query,
            timeout_seconds: self.search.timeout_seconds,
            user_agent: self.search.user_agent.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}
