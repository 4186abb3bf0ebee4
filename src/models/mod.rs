//! Model capabilities consumed by the pipeline.
//!
//! The pipeline never constructs a model client itself. Callers build one
//! implementation of each trait (usually the HTTP clients in this module)
//! and hand them to [`crate::pipeline::RetrievalPipeline`] and
//! [`crate::synthesis::Assistant`] as `Arc<dyn Trait>`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ModelEndpoint;
use crate::error::{PipelineError, Result};

mod embedder;
mod generator;
mod scorer;

pub use embedder::OpenAiEmbedder;
pub use generator::OpenAiChatGenerator;
pub use scorer::HttpRelevanceScorer;

/// Cross-encoder relevance scoring.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    /// Score every text against `query`. Higher is more relevant; the range
    /// is model-specific. Returns one score per input, in input order.
    async fn score_batch(&self, query: &str, texts: &[String]) -> Result<Vec<f32>>;
}

/// Which side of an asymmetric encoder a text is embedded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedRole {
    Query,
    Passage,
}

impl EmbedRole {
    /// Role marker prefixed to the input text.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Query => "query: ",
            Self::Passage => "passage: ",
        }
    }
}

/// Bi-encoder text embedding.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed every text with the given role. Returns one vector per input,
    /// in input order.
    async fn embed_batch(&self, texts: &[String], role: EmbedRole) -> Result<Vec<Vec<f32>>>;
}

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Chat text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a reply to an ordered list of messages.
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Connection details shared by the HTTP clients.
#[derive(Clone)]
struct HttpEndpoint {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEndpoint {
    fn from_config(endpoint: &ModelEndpoint) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(endpoint.timeout_seconds))
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build model client: {e}")))?;
        Ok(Self {
            client,
            base_url: endpoint.base_url.trim_end_matches('/').to_owned(),
            model: endpoint.model.clone(),
            api_key: endpoint.api_key.resolve()?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// POST a JSON body and decode a JSON response. Failures are reported
    /// as plain messages; callers wrap them in their capability's error.
    async fn post_json<B, R>(&self, path: &str, body: &B) -> std::result::Result<R, String>
    where
        B: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_owned());
            return Err(format!("HTTP {status}: {}", truncate(&body, 200)));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| format!("invalid response body: {e}"))
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_prefixes() {
        assert_eq!(EmbedRole::Query.prefix(), "query: ");
        assert_eq!(EmbedRole::Passage.prefix(), "passage: ");
    }

    #[test]
    fn chat_message_serializes_lowercase_role() {
        let json = serde_json::to_value(ChatMessage::system("hi")).expect("serialize");
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("привет", 3), "при");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[test]
    fn endpoint_url_strips_trailing_slash() {
        let config = ModelEndpoint {
            base_url: "http://localhost:8080/v1/".into(),
            model: "m".into(),
            api_key: crate::config::SecretRef::None,
            timeout_seconds: 5,
        };
        let endpoint = HttpEndpoint::from_config(&config).expect("client builds");
        assert_eq!(endpoint.url("embeddings"), "http://localhost:8080/v1/embeddings");
        assert!(endpoint.api_key.is_none());
    }
}
