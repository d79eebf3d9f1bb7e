//! Twilio Media Streams wire format.
//!
//! Every frame on the media websocket is a JSON object tagged by its `event`
//! field. Only `start`, `media` and `stop` drive the relay; `connected` and
//! `mark` are accepted and ignored, and anything else decodes as
//! [`MediaEvent::Unknown`].
//!
//! ```json
//! {"event":"start","start":{"callSid":"CA..","streamSid":"MZ..",
//!   "mediaFormat":{"encoding":"audio/x-mulaw","sampleRate":8000,"channels":1}}}
//! {"event":"media","media":{"payload":"<base64 mu-law>"}}
//! {"event":"stop"}
//! ```

use axum::extract::ws::Message;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde::Deserialize;

/// Encoding Twilio uses for inbound call audio.
pub const MULAW_ENCODING: &str = "audio/x-mulaw";

/// Sample rate of telephony audio.
pub const TELEPHONY_SAMPLE_RATE: u32 = 8000;

/// Errors raised while decoding or relaying media frames.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("Unsupported media format: {encoding} at {sample_rate} Hz")]
    UnsupportedMediaFormat { encoding: String, sample_rate: u32 },
}

/// A decoded media websocket event.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum MediaEvent {
    Connected,
    Start { start: StartMetadata },
    Media { media: MediaPayload },
    Stop,
    Mark,
    #[serde(other)]
    Unknown,
}

impl MediaEvent {
    /// Parse a text frame.
    pub fn parse(text: &str) -> Result<Self, MediaError> {
        serde_json::from_str(text)
            .map_err(|e| MediaError::ProtocolViolation(format!("malformed media event: {e}")))
    }

    pub fn name(&self) -> &'static str {
        match self {
            MediaEvent::Connected => "connected",
            MediaEvent::Start { .. } => "start",
            MediaEvent::Media { .. } => "media",
            MediaEvent::Stop => "stop",
            MediaEvent::Mark => "mark",
            MediaEvent::Unknown => "unknown",
        }
    }
}

/// Payload of the `start` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMetadata {
    pub call_sid: String,
    #[serde(default)]
    pub stream_sid: Option<String>,
    #[serde(default)]
    pub account_sid: Option<String>,
    #[serde(default)]
    pub tracks: Vec<String>,
    pub media_format: MediaFormat,
}

/// Audio format announced by the `start` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFormat {
    pub encoding: String,
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub channels: u16,
}

fn default_channels() -> u16 {
    1
}

impl MediaFormat {
    /// Only 8 kHz mu-law is relayed.
    pub fn validate(&self) -> Result<(), MediaError> {
        if self.encoding == MULAW_ENCODING && self.sample_rate == TELEPHONY_SAMPLE_RATE {
            Ok(())
        } else {
            Err(MediaError::UnsupportedMediaFormat {
                encoding: self.encoding.clone(),
                sample_rate: self.sample_rate,
            })
        }
    }
}

/// Payload of the `media` event.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaPayload {
    pub payload: String,
    #[serde(default)]
    pub track: Option<String>,
}

impl MediaPayload {
    /// Decode the base64 audio payload.
    pub fn decode(&self) -> Result<Bytes, MediaError> {
        BASE64
            .decode(self.payload.as_bytes())
            .map(Bytes::from)
            .map_err(|e| MediaError::ProtocolViolation(format!("invalid media payload: {e}")))
    }
}

/// Item on the audio queue between the ingest loop and the STT relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioChunk {
    Audio(Bytes),
    EndOfStream,
}

/// Transport-level frame read from the media websocket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Binary(Bytes),
    /// Ping/pong, handled by the transport.
    Control,
    Close,
}

impl From<Message> for InboundFrame {
    fn from(message: Message) -> Self {
        match message {
            Message::Text(text) => InboundFrame::Text(text.to_string()),
            Message::Binary(data) => InboundFrame::Binary(data),
            Message::Ping(_) | Message::Pong(_) => InboundFrame::Control,
            Message::Close(_) => InboundFrame::Close,
        }
    }
}
