//! Merge environment variables with optional YAML overrides.
//!
//! Priority (highest first): YAML value, environment variable, default.

use super::ServerConfig;
use super::env::{self, *};
use super::yaml::YamlConfig;
use crate::core::llm::OPENAI_CHAT_URL;
use crate::core::stt::{RTZR_AUTH_URL, RTZR_STT_URL};
use crate::core::tts::elevenlabs::{DEFAULT_MODEL_ID, DEFAULT_VOICE_ID, ELEVENLABS_API_URL};
use crate::core::turn::DEFAULT_BLOCKED_WARNING;

pub(super) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let yaml = yaml.unwrap_or_default();
    let server = yaml.server.unwrap_or_default();
    let stt = yaml.stt.unwrap_or_default();
    let llm = yaml.llm.unwrap_or_default();
    let tts = yaml.tts.unwrap_or_default();
    let call = yaml.call.unwrap_or_default();
    let relay = yaml.relay.unwrap_or_default();
    let guard = yaml.guard.unwrap_or_default();

    Ok(ServerConfig {
        host: server
            .host
            .or_else(|| env::var("HOST"))
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: match server.port {
            Some(port) => port,
            None => env::parse("PORT")?.unwrap_or(DEFAULT_PORT),
        },
        public_url: server
            .public_url
            .or_else(|| env::var("PUBLIC_URL"))
            .map(|url| url.trim_end_matches('/').to_string()),
        cors_allowed_origins: server
            .cors_allowed_origins
            .or_else(|| env::var("CORS_ALLOWED_ORIGINS")),

        rtzr_client_id: stt.client_id.or_else(|| env::var("RTZR_CLIENT_ID")),
        rtzr_client_secret: stt
            .client_secret
            .or_else(|| env::var("RTZR_CLIENT_SECRET")),
        rtzr_token: stt.token.or_else(|| env::var("RTZR_TOKEN")),
        rtzr_stt_url: stt
            .url
            .or_else(|| env::var("RTZR_STT_URL"))
            .unwrap_or_else(|| RTZR_STT_URL.to_string()),
        rtzr_auth_url: stt
            .auth_url
            .or_else(|| env::var("RTZR_AUTH_URL"))
            .unwrap_or_else(|| RTZR_AUTH_URL.to_string()),

        openai_api_key: llm.api_key.or_else(|| env::var("OPENAI_API_KEY")),
        llm_url: llm
            .url
            .or_else(|| env::var("LLM_URL"))
            .unwrap_or_else(|| OPENAI_CHAT_URL.to_string()),
        llm_model: llm
            .model
            .or_else(|| env::var("LLM_MODEL"))
            .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
        llm_timeout_seconds: match llm.timeout_seconds {
            Some(seconds) => seconds,
            None => env::parse("LLM_TIMEOUT_SECONDS")?.unwrap_or(DEFAULT_LLM_TIMEOUT_SECONDS),
        },
        system_prompt: llm
            .system_prompt
            .or_else(|| env::var("SYSTEM_PROMPT"))
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),

        elevenlabs_api_key: tts.api_key.or_else(|| env::var("ELEVENLABS_API_KEY")),
        elevenlabs_url: tts
            .url
            .or_else(|| env::var("ELEVENLABS_URL"))
            .unwrap_or_else(|| ELEVENLABS_API_URL.to_string()),
        tts_voice_id: tts
            .voice_id
            .or_else(|| env::var("TTS_VOICE_ID"))
            .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string()),
        tts_model_id: tts
            .model_id
            .or_else(|| env::var("TTS_MODEL_ID"))
            .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),

        greeting: call
            .greeting
            .or_else(|| env::var("GREETING"))
            .unwrap_or_else(|| DEFAULT_GREETING.to_string()),
        goodbye: call
            .goodbye
            .or_else(|| env::var("GOODBYE"))
            .unwrap_or_else(|| DEFAULT_GOODBYE.to_string()),
        say_voice: call
            .say_voice
            .or_else(|| env::var("SAY_VOICE"))
            .unwrap_or_else(|| DEFAULT_SAY_VOICE.to_string()),
        say_language: call
            .say_language
            .or_else(|| env::var("SAY_LANGUAGE"))
            .unwrap_or_else(|| DEFAULT_SAY_LANGUAGE.to_string()),

        audio_queue_capacity: match relay.audio_queue_capacity {
            Some(capacity) => capacity,
            None => env::parse("AUDIO_QUEUE_CAPACITY")?.unwrap_or(DEFAULT_AUDIO_QUEUE_CAPACITY),
        },
        response_queue_capacity: match relay.response_queue_capacity {
            Some(capacity) => capacity,
            None => {
                env::parse("RESPONSE_QUEUE_CAPACITY")?.unwrap_or(DEFAULT_RESPONSE_QUEUE_CAPACITY)
            }
        },
        session_linger_seconds: match relay.session_linger_seconds {
            Some(seconds) => seconds,
            None => {
                env::parse("SESSION_LINGER_SECONDS")?.unwrap_or(DEFAULT_SESSION_LINGER_SECONDS)
            }
        },

        blocked_terms: guard
            .blocked_terms
            .or_else(|| env::list("BLOCKED_TERMS"))
            .unwrap_or_else(|| {
                DEFAULT_BLOCKED_TERMS
                    .iter()
                    .map(|term| term.to_string())
                    .collect()
            }),
        blocked_terms_warning: guard
            .warning
            .or_else(|| env::var("BLOCKED_TERMS_WARNING"))
            .unwrap_or_else(|| DEFAULT_BLOCKED_WARNING.to_string()),
    })
}
