//! Mock vendors for integration tests
//!
//! - `rtzr` - streaming STT websocket server
//! - `ScriptedGenerator` - in-process reply generator
//! - `test_config` - configuration pointing at the mocks

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod rtzr;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use voip_relay::{DialogueTurn, GeneratorError, ReplyGenerator, ServerConfig};

/// Configuration with every vendor pointed at unreachable or mock endpoints.
pub fn test_config(stt_url: &str, tts_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        public_url: Some("https://relay.example.com".to_string()),
        cors_allowed_origins: None,
        rtzr_client_id: None,
        rtzr_client_secret: None,
        rtzr_token: Some("test-token".to_string()),
        rtzr_stt_url: stt_url.to_string(),
        rtzr_auth_url: "http://127.0.0.1:9/v1/authenticate".to_string(),
        openai_api_key: Some("sk-test".to_string()),
        llm_url: "http://127.0.0.1:9/v1/chat/completions".to_string(),
        llm_model: "gpt-test".to_string(),
        llm_timeout_seconds: 2,
        system_prompt: "You are a bank assistant.".to_string(),
        elevenlabs_api_key: Some("xi-test".to_string()),
        elevenlabs_url: tts_url.to_string(),
        tts_voice_id: "voice1".to_string(),
        tts_model_id: "eleven_multilingual_v2".to_string(),
        greeting: "Hello, how can I help?".to_string(),
        goodbye: "Goodbye!".to_string(),
        say_voice: "Polly.Amy".to_string(),
        say_language: "en-US".to_string(),
        audio_queue_capacity: 16,
        response_queue_capacity: 4,
        session_linger_seconds: 30,
        blocked_terms: vec!["password".to_string()],
        blocked_terms_warning: "I can't help with that.".to_string(),
    }
}

/// Answers each transcript with `"reply N: <last caller text>"`.
#[derive(Default)]
pub struct ScriptedGenerator {
    pub seen: Mutex<Vec<Vec<DialogueTurn>>>,
    pub delay: Duration,
}

impl ScriptedGenerator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }
}

#[async_trait]
impl ReplyGenerator for ScriptedGenerator {
    async fn generate(&self, transcript: &[DialogueTurn]) -> Result<String, GeneratorError> {
        let n = {
            let mut seen = self.seen.lock();
            seen.push(transcript.to_vec());
            seen.len()
        };
        tokio::time::sleep(self.delay).await;
        let last = transcript
            .last()
            .map(|turn| turn.text.clone())
            .unwrap_or_default();
        Ok(format!("reply {n}: {last}"))
    }
}
