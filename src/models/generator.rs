//! OpenAI-compatible chat completions client (non-streaming).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, HttpEndpoint, TextGenerator};
use crate::config::ModelEndpoint;
use crate::error::{PipelineError, Result};

/// Text generator that calls `POST {base_url}/chat/completions`.
#[derive(Clone)]
pub struct OpenAiChatGenerator {
    endpoint: HttpEndpoint,
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChatGenerator {
    /// Build a generator from endpoint configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] if the API key cannot be resolved
    /// or the HTTP client cannot be built.
    pub fn new(config: &ModelEndpoint) -> Result<Self> {
        Ok(Self {
            endpoint: HttpEndpoint::from_config(config)?,
            temperature: None,
        })
    }

    /// Set the sampling temperature sent with each request.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[async_trait]
impl TextGenerator for OpenAiChatGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let request = ChatRequest {
            model: &self.endpoint.model,
            messages,
            stream: false,
            temperature: self.temperature,
        };
        let response: ChatResponse = self
            .endpoint
            .post_json("chat/completions", &request)
            .await
            .map_err(PipelineError::Generation)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PipelineError::Generation("response has no message content".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecretRef;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator(server: &MockServer) -> OpenAiChatGenerator {
        OpenAiChatGenerator::new(&ModelEndpoint {
            base_url: format!("{}/v1", server.uri()),
            model: "chat-model".into(),
            api_key: SecretRef::None,
            timeout_seconds: 5,
        })
        .expect("generator builds")
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "model": "chat-model",
                "stream": false,
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "hi" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "hello" } },
                    { "message": { "role": "assistant", "content": "ignored" } }
                ]
            })))
            .mount(&server)
            .await;

        let reply = generator(&server)
            .generate(&[ChatMessage::system("be brief"), ChatMessage::user("hi")])
            .await
            .expect("generation succeeds");
        assert_eq!(reply, "hello");
    }

    #[tokio::test]
    async fn temperature_is_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "temperature": 0.25 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "ok" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = generator(&server)
            .with_temperature(0.25)
            .generate(&[ChatMessage::user("hi")])
            .await
            .expect("generation succeeds");
        assert_eq!(reply, "ok");
    }

    #[tokio::test]
    async fn empty_choices_is_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let err = generator(&server)
            .generate(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Generation(_)));
    }

    #[tokio::test]
    async fn http_error_is_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = generator(&server)
            .generate(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}
