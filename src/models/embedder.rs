//! OpenAI-compatible embeddings client with e5-style role prefixes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{EmbedRole, Embedder, HttpEndpoint};
use crate::config::ModelEndpoint;
use crate::error::{PipelineError, Result};

/// Embedder that calls `POST {base_url}/embeddings`.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    endpoint: HttpEndpoint,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// Build an embedder from endpoint configuration.
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
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[String], role: EmbedRole) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = EmbeddingRequest {
            model: &self.endpoint.model,
            input: texts
                .iter()
                .map(|text| format!("{}{text}", role.prefix()))
                .collect(),
        };
        let mut response: EmbeddingResponse = self
            .endpoint
            .post_json("embeddings", &request)
            .await
            .map_err(PipelineError::Embedding)?;

        response.data.sort_by_key(|entry| entry.index);
        if response.data.len() != texts.len() {
            return Err(PipelineError::Embedding(format!(
                "{} embeddings returned for {} inputs",
                response.data.len(),
                texts.len()
            )));
        }
        Ok(response
            .data
            .into_iter()
            .map(|entry| entry.embedding)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecretRef;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embedder(server: &MockServer) -> OpenAiEmbedder {
        OpenAiEmbedder::new(&ModelEndpoint {
            base_url: format!("{}/v1", server.uri()),
            model: "e5".into(),
            api_key: SecretRef::None,
            timeout_seconds: 5,
        })
        .expect("embedder builds")
    }

    #[tokio::test]
    async fn role_prefix_is_applied_and_order_restored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(body_partial_json(json!({
                "model": "e5",
                "input": ["passage: first", "passage: second"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    { "index": 1, "embedding": [0.0, 1.0] },
                    { "index": 0, "embedding": [1.0, 0.0] }
                ]
            })))
            .mount(&server)
            .await;

        let vectors = embedder(&server)
            .embed_batch(&["first".to_owned(), "second".to_owned()], EmbedRole::Passage)
            .await
            .expect("embedding succeeds");
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn query_role_uses_query_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "input": ["query: what is rust"] })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "index": 0, "embedding": [0.5] }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let vectors = embedder(&server)
            .embed_batch(&["what is rust".to_owned()], EmbedRole::Query)
            .await
            .expect("embedding succeeds");
        assert_eq!(vectors.len(), 1);
    }

    #[tokio::test]
    async fn count_mismatch_is_embedding_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "index": 0, "embedding": [0.5] }]
            })))
            .mount(&server)
            .await;

        let err = embedder(&server)
            .embed_batch(&["a".to_owned(), "b".to_owned()], EmbedRole::Passage)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Embedding(_)));
        assert!(err.to_string().contains("1 embeddings returned for 2 inputs"));
    }

    #[tokio::test]
    async fn malformed_body_is_embedding_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = embedder(&server)
            .embed_batch(&["a".to_owned()], EmbedRole::Passage)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Embedding(_)));
    }
}
