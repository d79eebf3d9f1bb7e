mod config;
mod provider;

pub use config::{
    DEFAULT_MODEL_ID, DEFAULT_VOICE_ID, ELEVENLABS_API_URL, ElevenLabsTTSConfig, VoiceSettings,
};
pub use provider::ElevenLabsTTS;
