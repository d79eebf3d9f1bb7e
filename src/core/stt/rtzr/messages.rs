//! RTZR streaming recognition messages.
//!
//! The vendor sends one JSON object per text frame:
//!
//! ```json
//! {"seq":0,"start_at":120,"duration":980,"final":true,
//!  "alternatives":[{"text":"hello there","confidence":0.93}]}
//! ```

use serde::Deserialize;

use crate::core::stt::base::{STTError, TranscriptEvent};

/// Text frame that tells the vendor no more audio will follow.
pub const END_OF_STREAM: &str = "EOS";

#[derive(Debug, Clone, Deserialize)]
pub struct RtzrMessage {
    #[serde(default)]
    pub seq: u64,
    #[serde(default)]
    pub start_at: u64,
    #[serde(default)]
    pub duration: u64,
    #[serde(rename = "final", default)]
    pub is_final: bool,
    #[serde(default)]
    pub alternatives: Vec<RtzrAlternative>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RtzrAlternative {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl RtzrMessage {
    pub fn parse(text: &str) -> Result<Self, STTError> {
        serde_json::from_str(text)
            .map_err(|e| STTError::ProtocolViolation(format!("malformed RTZR frame: {e}")))
    }

    /// Best hypothesis, trimmed.
    pub fn best_text(&self) -> &str {
        self.alternatives
            .first()
            .map(|alt| alt.text.trim())
            .unwrap_or("")
    }

    /// Map to a transcript event. Finals with no text carry nothing actionable.
    pub fn into_event(self) -> Option<TranscriptEvent> {
        let text = self.best_text().to_string();
        if self.is_final {
            (!text.is_empty()).then_some(TranscriptEvent::Final(text))
        } else {
            Some(TranscriptEvent::Interim(text))
        }
    }
}
