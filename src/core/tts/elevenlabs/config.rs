use std::fmt;

use serde::Serialize;
use zeroize::Zeroize;

/// Default API host.
pub const ELEVENLABS_API_URL: &str = "https://api.elevenlabs.io";

pub const DEFAULT_VOICE_ID: &str = "pMsXgVXv3BLzUgSXRplE";

pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";

/// Voice tuning sent with every synthesis request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.1,
            similarity_boost: 0.3,
            style: 0.2,
        }
    }
}

#[derive(Clone)]
pub struct ElevenLabsTTSConfig {
    /// API host, without the `/v1/...` path.
    pub base_url: String,
    pub api_key: String,
    pub model_id: String,
    pub voice_settings: VoiceSettings,
}

impl ElevenLabsTTSConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: ELEVENLABS_API_URL.to_string(),
            api_key: api_key.into(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            voice_settings: VoiceSettings::default(),
        }
    }

    /// Streaming synthesis endpoint for a voice.
    pub fn stream_url(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}/stream",
            self.base_url.trim_end_matches('/'),
            voice_id
        )
    }
}

impl fmt::Debug for ElevenLabsTTSConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElevenLabsTTSConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model_id", &self.model_id)
            .field("voice_settings", &self.voice_settings)
            .finish()
    }
}

impl Drop for ElevenLabsTTSConfig {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}
