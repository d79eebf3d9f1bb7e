//! ElevenLabs streaming synthesis for pending call replies.
//!
//! # API Reference
//!
//! - Endpoint: `POST {base}/v1/text-to-speech/{voice_id}/stream`
//! - Auth: `xi-api-key` header
//! - Output: chunked `audio/mpeg`

use std::sync::Arc;

use futures::StreamExt;
use serde_json::json;
use tracing::{debug, error, info};

use super::config::ElevenLabsTTSConfig;
use crate::core::session::SessionRegistry;
use crate::core::tts::base::{AudioStream, TTSError};

pub struct ElevenLabsTTS {
    client: reqwest::Client,
    config: ElevenLabsTTSConfig,
    registry: Arc<SessionRegistry>,
}

impl ElevenLabsTTS {
    pub fn new(
        client: reqwest::Client,
        config: ElevenLabsTTSConfig,
        registry: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            client,
            config,
            registry,
        }
    }

    /// Synthesize the call's pending reply with `voice_id`.
    ///
    /// Lookup failures are returned immediately. Vendor failures surface as
    /// the stream's first and only item, so an empty stream never stands in
    /// for an error. The vendor response lives inside the returned stream and
    /// is released when the stream finishes or is dropped.
    pub fn stream(&self, call_id: &str, voice_id: &str) -> Result<AudioStream, TTSError> {
        let session = self
            .registry
            .get(call_id)
            .map_err(|_| TTSError::SessionNotFound(call_id.to_string()))?;
        session.touch();
        let text = session
            .pending_reply()
            .ok_or_else(|| TTSError::NoPendingReply(call_id.to_string()))?;

        let url = self.config.stream_url(voice_id);
        let request = self
            .client
            .post(&url)
            .header("xi-api-key", &self.config.api_key)
            .header("Accept", "audio/mpeg")
            .json(&json!({
                "text": text,
                "model_id": self.config.model_id,
                "voice_settings": self.config.voice_settings,
            }));

        info!(call_id = %call_id, voice_id = %voice_id, "Streaming TTS ({} chars)", text.len());
        let call_id = call_id.to_string();

        let stream = async_stream::try_stream! {
            let response = request
                .send()
                .await
                .map_err(|e| TTSError::VendorConnectionFailure(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                error!(call_id = %call_id, "ElevenLabs returned {}: {}", status, body);
                Err::<(), TTSError>(TTSError::VendorStatus {
                    status: status.as_u16(),
                    body,
                })?;
            } else {
                let mut chunks = response.bytes_stream();
                let mut total = 0usize;
                while let Some(chunk) = chunks.next().await {
                    let chunk = chunk.map_err(|e| TTSError::StreamInterrupted(e.to_string()))?;
                    total += chunk.len();
                    yield chunk;
                }
                debug!(call_id = %call_id, "TTS stream complete ({} bytes)", total);
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: String) -> (Arc<SessionRegistry>, ElevenLabsTTS) {
        let registry = Arc::new(SessionRegistry::new(4, Duration::from_secs(60)));
        let mut config = ElevenLabsTTSConfig::new("xi-test");
        config.base_url = base_url;
        let tts = ElevenLabsTTS::new(reqwest::Client::new(), config, registry.clone());
        (registry, tts)
    }

    async fn collect(mut stream: AudioStream) -> Vec<Result<bytes::Bytes, TTSError>> {
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn test_streams_vendor_audio() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/text-to-speech/voice-1/stream"))
            .and(header("xi-api-key", "xi-test"))
            .and(body_partial_json(serde_json::json!({
                "text": "Your balance is 10 dollars.",
                "model_id": "eleven_multilingual_v2",
                "voice_settings": {"stability": 0.1, "similarity_boost": 0.3, "style": 0.2}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "audio/mpeg")
                    .set_body_bytes(vec![0xFFu8; 4096]),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (registry, tts) = provider(server.uri());
        let session = registry.create("CA1").unwrap();
        session.set_pending_reply("Your balance is 10 dollars.");

        let items = collect(tts.stream("CA1", "voice-1").unwrap()).await;
        let total: usize = items.iter().map(|item| item.as_ref().unwrap().len()).sum();
        assert_eq!(total, 4096);
    }

    #[tokio::test]
    async fn test_vendor_error_is_single_terminal_item() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let (registry, tts) = provider(server.uri());
        registry.create("CA1").unwrap().set_pending_reply("hi");

        let items = collect(tts.stream("CA1", "voice-1").unwrap()).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(
            &items[0],
            Err(TTSError::VendorStatus { status: 401, body }) if body == "invalid key"
        ));
    }

    #[tokio::test]
    async fn test_unreachable_vendor() {
        let (registry, tts) = provider("http://127.0.0.1:9".to_string());
        registry.create("CA1").unwrap().set_pending_reply("hi");

        let items = collect(tts.stream("CA1", "voice-1").unwrap()).await;
        assert!(matches!(
            items.as_slice(),
            [Err(TTSError::VendorConnectionFailure(_))]
        ));
    }

    #[test]
    fn test_unknown_session_and_missing_reply() {
        let (registry, tts) = provider("http://unused".to_string());
        assert!(matches!(
            tts.stream("CA404", "voice-1"),
            Err(TTSError::SessionNotFound(_))
        ));

        registry.create("CA1").unwrap();
        assert!(matches!(
            tts.stream("CA1", "voice-1"),
            Err(TTSError::NoPendingReply(_))
        ));
    }

    #[test]
    fn test_stream_url() {
        let mut config = ElevenLabsTTSConfig::new("k");
        config.base_url = "https://api.elevenlabs.io/".to_string();
        assert_eq!(
            config.stream_url("abc"),
            "https://api.elevenlabs.io/v1/text-to-speech/abc/stream"
        );
        assert!(!format!("{config:?}").contains("\"k\""));
    }
}
