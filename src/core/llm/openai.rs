//! OpenAI-compatible chat completions client.
//!
//! # API Reference
//!
//! - Endpoint: `POST https://api.openai.com/v1/chat/completions`
//! - Auth: `Authorization: Bearer <key>`
//! - Reply: `choices[0].message.content`

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::Zeroize;

use super::base::{GeneratorError, ReplyGenerator};
use crate::core::session::DialogueTurn;

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Clone)]
pub struct OpenAIChatConfig {
    pub url: String,
    pub api_key: String,
    pub model: String,
    /// Sent as the first message of every request.
    pub system_prompt: String,
}

impl fmt::Debug for OpenAIChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAIChatConfig")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("system_prompt_len", &self.system_prompt.len())
            .finish()
    }
}

impl Drop for OpenAIChatConfig {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAIChatGenerator {
    client: reqwest::Client,
    config: OpenAIChatConfig,
}

impl OpenAIChatGenerator {
    pub fn new(client: reqwest::Client, config: OpenAIChatConfig) -> Self {
        Self { client, config }
    }

    fn build_request<'a>(&'a self, transcript: &'a [DialogueTurn]) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        if !self.config.system_prompt.is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &self.config.system_prompt,
            });
        }
        // Failed generations leave empty assistant turns behind.
        messages.extend(
            transcript
                .iter()
                .filter(|turn| !turn.text.is_empty())
                .map(|turn| ChatMessage {
                    role: turn.role.as_chat_role(),
                    content: &turn.text,
                }),
        );
        ChatRequest {
            model: &self.config.model,
            messages,
        }
    }
}

#[async_trait]
impl ReplyGenerator for OpenAIChatGenerator {
    async fn generate(&self, transcript: &[DialogueTurn]) -> Result<String, GeneratorError> {
        let request = self.build_request(transcript);
        debug!(
            "Sending {} messages to {}",
            request.messages.len(),
            self.config.model
        );

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeneratorError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Chat completion failed with {}", status);
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::MalformedPayload(e.to_string()))?;

        payload
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| GeneratorError::MalformedPayload("no choices in response".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator(url: String) -> OpenAIChatGenerator {
        OpenAIChatGenerator::new(
            reqwest::Client::new(),
            OpenAIChatConfig {
                url,
                api_key: "sk-test".to_string(),
                model: "gpt-test".to_string(),
                system_prompt: "You are a bank representative.".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_generate_sends_prompt_and_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-test",
                "messages": [
                    {"role": "system", "content": "You are a bank representative."},
                    {"role": "user", "content": "hi"},
                    {"role": "assistant", "content": "hello"},
                    {"role": "user", "content": "balance please"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "  Sure.  "}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let generator = generator(format!("{}/v1/chat/completions", server.uri()));
        let transcript = vec![
            DialogueTurn::caller("hi"),
            DialogueTurn::assistant("hello"),
            DialogueTurn::assistant(""),
            DialogueTurn::caller("balance please"),
        ];
        assert_eq!(generator.generate(&transcript).await.unwrap(), "Sure.");
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = generator(server.uri())
            .generate(&[DialogueTurn::caller("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_missing_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": []
            })))
            .mount(&server)
            .await;

        let err = generator(server.uri())
            .generate(&[DialogueTurn::caller("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, GeneratorError::MalformedPayload(_)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let generator = generator(OPENAI_CHAT_URL.to_string());
        assert!(!format!("{:?}", generator.config).contains("sk-test"));
    }
}
