//! Text-to-speech streaming for call replies.

mod base;
pub mod elevenlabs;

pub use base::{AudioStream, TTSError};
pub use elevenlabs::{ElevenLabsTTS, ElevenLabsTTSConfig, VoiceSettings};
