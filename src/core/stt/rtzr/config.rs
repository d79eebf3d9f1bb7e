//! Configuration for the RTZR (VITO) streaming recognizer.

use std::fmt;
use std::str::FromStr;

use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use zeroize::Zeroize;

use crate::core::stt::base::STTError;

/// Default streaming endpoint.
pub const RTZR_STT_URL: &str = "wss://openapi.vito.ai/v1/transcribe:streaming";

/// Default credential exchange endpoint.
pub const RTZR_AUTH_URL: &str = "https://openapi.vito.ai/v1/authenticate";

/// Audio encodings accepted by the streaming endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RtzrEncoding {
    /// 8-bit mu-law, as delivered by telephony.
    #[default]
    Mulaw,
    /// 16-bit little-endian PCM.
    Linear16,
}

impl RtzrEncoding {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mulaw => "MULAW",
            Self::Linear16 => "LINEAR16",
        }
    }
}

impl FromStr for RtzrEncoding {
    type Err = STTError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mulaw" | "ulaw" | "audio/x-mulaw" => Ok(Self::Mulaw),
            "linear16" | "pcm" | "pcm_s16le" => Ok(Self::Linear16),
            other => Err(STTError::ConfigurationError(format!(
                "unsupported RTZR encoding: {other}"
            ))),
        }
    }
}

/// Streaming session parameters.
#[derive(Clone)]
pub struct RtzrSTTConfig {
    /// Streaming endpoint, without query string.
    pub url: String,
    /// Bearer token obtained from the authenticate endpoint.
    pub token: String,
    pub sample_rate: u32,
    pub encoding: RtzrEncoding,
    /// Inverse text normalization (digits, dates).
    pub use_itn: bool,
    pub use_disfluency_filter: bool,
    pub use_profanity_filter: bool,
}

impl fmt::Debug for RtzrSTTConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtzrSTTConfig")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .field("sample_rate", &self.sample_rate)
            .field("encoding", &self.encoding)
            .field("use_itn", &self.use_itn)
            .field("use_disfluency_filter", &self.use_disfluency_filter)
            .field("use_profanity_filter", &self.use_profanity_filter)
            .finish()
    }
}

impl Drop for RtzrSTTConfig {
    fn drop(&mut self) {
        self.token.zeroize();
    }
}

impl Default for RtzrSTTConfig {
    fn default() -> Self {
        Self {
            url: RTZR_STT_URL.to_string(),
            token: String::new(),
            sample_rate: 8000,
            encoding: RtzrEncoding::Mulaw,
            use_itn: true,
            use_disfluency_filter: false,
            use_profanity_filter: false,
        }
    }
}

impl RtzrSTTConfig {
    /// Telephony defaults with the given endpoint and token.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.url = url.into();
        config.token = token.into();
        config
    }

    /// Full websocket URL including the recognition parameters.
    pub fn build_websocket_url(&self) -> String {
        let mut url = String::with_capacity(self.url.len() + 128);
        url.push_str(&self.url);
        url.push(if self.url.contains('?') { '&' } else { '?' });
        url.push_str("sample_rate=");
        url.push_str(&self.sample_rate.to_string());
        url.push_str("&encoding=");
        url.push_str(self.encoding.as_str());
        url.push_str("&use_itn=");
        url.push_str(bool_param(self.use_itn));
        url.push_str("&use_disfluency_filter=");
        url.push_str(bool_param(self.use_disfluency_filter));
        url.push_str("&use_profanity_filter=");
        url.push_str(bool_param(self.use_profanity_filter));
        url
    }

    /// Websocket handshake request carrying the bearer token.
    pub fn build_request(&self) -> Result<Request, STTError> {
        let mut request = self
            .build_websocket_url()
            .into_client_request()
            .map_err(|e| STTError::ConfigurationError(format!("invalid RTZR URL: {e}")))?;

        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|e| STTError::ConfigurationError(format!("invalid RTZR token: {e}")))?;
        request.headers_mut().insert("Authorization", auth);
        Ok(request)
    }
}

#[inline]
fn bool_param(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
