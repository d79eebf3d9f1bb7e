//! Configuration module for the voip relay
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading and defaults
//! - `merge`: Merging YAML and environment configurations
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use voip_relay::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod merge;
mod validation;
mod yaml;

pub use env::{
    DEFAULT_AUDIO_QUEUE_CAPACITY, DEFAULT_BLOCKED_TERMS, DEFAULT_GOODBYE, DEFAULT_GREETING,
    DEFAULT_HOST, DEFAULT_LLM_MODEL, DEFAULT_PORT, DEFAULT_RESPONSE_QUEUE_CAPACITY,
    DEFAULT_SESSION_LINGER_SECONDS, DEFAULT_SYSTEM_PROMPT,
};

use crate::core::llm::OpenAIChatConfig;
use crate::core::stt::RtzrSTTConfig;
use crate::core::tts::{ElevenLabsTTSConfig, VoiceSettings};
use crate::core::turn::ContentGuard;
use crate::core::twiml::SayOptions;

/// Server configuration
///
/// Contains everything needed to run the relay:
/// - Server settings (host, port, public URL, CORS)
/// - Vendor credentials and endpoints (RTZR, OpenAI-compatible chat, ElevenLabs)
/// - Call script (greeting, goodbye, `<Say>` voice)
/// - Relay sizing (queue capacities, session linger)
/// - Blocked-terms guard
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,
    /// Externally reachable base URL (e.g. `https://relay.example.com`).
    /// When unset, callback URLs are derived from the request's `Host` header.
    pub public_url: Option<String>,
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,

    // Streaming STT (RTZR)
    pub rtzr_client_id: Option<String>,
    pub rtzr_client_secret: Option<String>,
    /// Pre-issued access token; when set, no credential exchange happens at startup
    pub rtzr_token: Option<String>,
    pub rtzr_stt_url: String,
    pub rtzr_auth_url: String,

    // Reply generator
    pub openai_api_key: Option<String>,
    pub llm_url: String,
    pub llm_model: String,
    pub llm_timeout_seconds: u64,
    pub system_prompt: String,

    // TTS (ElevenLabs)
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_url: String,
    pub tts_voice_id: String,
    pub tts_model_id: String,

    // Call script
    pub greeting: String,
    pub goodbye: String,
    pub say_voice: String,
    pub say_language: String,

    // Relay sizing
    pub audio_queue_capacity: usize,
    pub response_queue_capacity: usize,
    /// How long an ended session stays resolvable before removal
    pub session_linger_seconds: u64,

    // Guard
    pub blocked_terms: Vec<String>,
    pub blocked_terms_warning: String,
}

/// Implement Drop to zeroize all secret fields when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut secret) = self.rtzr_client_secret {
            secret.zeroize();
        }
        if let Some(ref mut token) = self.rtzr_token {
            token.zeroize();
        }
        if let Some(ref mut key) = self.openai_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.elevenlabs_api_key {
            key.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables and defaults
    ///
    /// The .env file is loaded in main.rs, so its values are visible here as
    /// ordinary environment variables.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_stt_credentials(
            &self.rtzr_token,
            &self.rtzr_client_id,
            &self.rtzr_client_secret,
        )?;
        validation::validate_capacity("AUDIO_QUEUE_CAPACITY", self.audio_queue_capacity)?;
        validation::validate_capacity("RESPONSE_QUEUE_CAPACITY", self.response_queue_capacity)?;
        validation::validate_public_url(&self.public_url)?;
        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_seconds)
    }

    pub fn session_linger(&self) -> Duration {
        Duration::from_secs(self.session_linger_seconds)
    }

    /// Streaming STT parameters for an access token.
    pub fn rtzr_stt_config(&self, token: &str) -> RtzrSTTConfig {
        RtzrSTTConfig::new(self.rtzr_stt_url.clone(), token)
    }

    pub fn openai_chat_config(&self) -> OpenAIChatConfig {
        OpenAIChatConfig {
            url: self.llm_url.clone(),
            api_key: self.openai_api_key.clone().unwrap_or_default(),
            model: self.llm_model.clone(),
            system_prompt: self.system_prompt.clone(),
        }
    }

    pub fn elevenlabs_config(&self) -> ElevenLabsTTSConfig {
        ElevenLabsTTSConfig {
            base_url: self.elevenlabs_url.clone(),
            api_key: self.elevenlabs_api_key.clone().unwrap_or_default(),
            model_id: self.tts_model_id.clone(),
            voice_settings: VoiceSettings::default(),
        }
    }

    pub fn say_options(&self) -> SayOptions {
        SayOptions {
            voice: Some(self.say_voice.clone()).filter(|v| !v.is_empty()),
            language: Some(self.say_language.clone()).filter(|l| !l.is_empty()),
        }
    }

    pub fn content_guard(&self) -> ContentGuard {
        ContentGuard::new(&self.blocked_terms, self.blocked_terms_warning.clone())
    }
}
