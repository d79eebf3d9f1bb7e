//! TwiML webhooks.
//!
//! The platform drives the call by fetching TwiML: the start webhook opens the
//! media stream and greets the caller, then every continuation request
//! long-polls the call's response queue and answers with either a reply to
//! play (plus a redirect back here) or a goodbye.

use axum::{
    Form,
    extract::{Path, State, rejection::FormRejection},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::ServerConfig;
use crate::core::continuation::Instruction;
use crate::core::twiml::{TWIML_CONTENT_TYPE, VoiceResponse};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Said when the platform calls without identifying the call.
const WEBHOOK_FAILURE_MESSAGE: &str = "Something went wrong! Please try again later.";

/// Form fields posted by the platform's voice webhooks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TwilioWebhook {
    pub call_sid: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub call_status: Option<String>,
}

pub(crate) fn is_valid_identifier(call_id: &str) -> bool {
    !call_id.is_empty()
        && call_id.len() <= 64
        && call_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Base URL the platform can reach us on.
///
/// The configured public URL wins; otherwise it is derived from the `Host`
/// header (and `X-Forwarded-Proto`, defaulting to https).
pub(crate) fn public_base_url(config: &ServerConfig, headers: &HeaderMap) -> String {
    if let Some(url) = &config.public_url {
        return url.clone();
    }
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("https");
    format!("{scheme}://{host}")
}

/// Websocket counterpart of an http(s) base URL.
pub(crate) fn websocket_base_url(base: &str) -> String {
    if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        format!("wss://{base}")
    }
}

fn continue_url(base: &str, call_id: &str) -> String {
    format!("{base}/twilio/twiml/continue/{call_id}")
}

fn twiml(response: VoiceResponse) -> Response {
    ([(header::CONTENT_TYPE, TWIML_CONTENT_TYPE)], response.to_xml()).into_response()
}

/// `POST /twilio/twiml/start`
///
/// Registers the call, starts the inbound media stream, greets the caller and
/// redirects to the first continuation poll.
pub async fn twiml_start(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    form: Result<Form<TwilioWebhook>, FormRejection>,
) -> Response {
    let webhook = match form {
        Ok(Form(webhook)) => webhook,
        Err(e) => {
            error!("Unreadable start webhook: {}", e);
            TwilioWebhook::default()
        }
    };

    let Some(call_sid) = webhook.call_sid.filter(|sid| is_valid_identifier(sid)) else {
        error!("Expected a CallSid in the start webhook");
        return twiml(VoiceResponse::new().say(WEBHOOK_FAILURE_MESSAGE, &Default::default()));
    };

    let (_, created) = state.registry.ensure(&call_sid);
    info!(
        call_id = %call_sid,
        from = ?webhook.from,
        created,
        "Incoming call"
    );

    let base = public_base_url(&state.config, &headers);
    let stream_url = format!("{}/twilio/stream", websocket_base_url(&base));
    let say = state.config.say_options();

    twiml(
        VoiceResponse::new()
            .start_stream(&stream_url, "inbound_track")
            .say(&state.config.greeting, &say)
            .redirect(&continue_url(&base, &call_sid)),
    )
}

/// `POST /twilio/twiml/continue/{call_sid}`
///
/// Long-polls the call's response queue for exactly one item.
pub async fn twiml_continue(
    State(state): State<Arc<AppState>>,
    Path(call_sid): Path<String>,
    headers: HeaderMap,
) -> AppResult<Response> {
    if !is_valid_identifier(&call_sid) {
        return Err(AppError::BadRequest(format!("invalid call id: {call_sid}")));
    }

    let instruction = state.responder.await_next(&call_sid).await?;
    let base = public_base_url(&state.config, &headers);

    let response = match instruction {
        Instruction::Play {
            call_id, voice_id, ..
        } => VoiceResponse::new()
            .play(&format!("{base}/tts/stream/{call_id}/{voice_id}"))
            .redirect(&continue_url(&base, &call_id)),
        Instruction::Hangup => VoiceResponse::new()
            .say(&state.config.goodbye, &state.config.say_options())
            .hangup(),
    };
    Ok(twiml(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    /// Configuration for handler tests without touching the environment.
    fn config(public_url: Option<&str>) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            public_url: public_url.map(str::to_string),
            cors_allowed_origins: None,
            rtzr_client_id: None,
            rtzr_client_secret: None,
            rtzr_token: Some("tok".to_string()),
            rtzr_stt_url: "ws://127.0.0.1:9/stream".to_string(),
            rtzr_auth_url: "http://127.0.0.1:9/auth".to_string(),
            openai_api_key: None,
            llm_url: "http://127.0.0.1:9/chat".to_string(),
            llm_model: "test".to_string(),
            llm_timeout_seconds: 1,
            system_prompt: String::new(),
            elevenlabs_api_key: None,
            elevenlabs_url: "http://127.0.0.1:9".to_string(),
            tts_voice_id: "voice-1".to_string(),
            tts_model_id: "model-1".to_string(),
            greeting: "Hello?".to_string(),
            goodbye: "Goodbye!".to_string(),
            say_voice: "Polly.Amy".to_string(),
            say_language: "en-US".to_string(),
            audio_queue_capacity: 8,
            response_queue_capacity: 4,
            session_linger_seconds: 1,
            blocked_terms: Vec::new(),
            blocked_terms_warning: String::new(),
        }
    }

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("CA0123456789abcdef"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("../etc"));
        assert!(!is_valid_identifier(&"a".repeat(65)));
    }

    #[test]
    fn test_websocket_base_url() {
        assert_eq!(
            websocket_base_url("https://relay.example.com"),
            "wss://relay.example.com"
        );
        assert_eq!(websocket_base_url("http://localhost:3001"), "ws://localhost:3001");
    }

    #[test]
    fn test_public_base_url_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("abc.ngrok.io"));
        let host_only = config(None);
        assert_eq!(
            public_base_url(&host_only, &headers),
            "https://abc.ngrok.io"
        );

        headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));
        assert_eq!(public_base_url(&host_only, &headers), "http://abc.ngrok.io");

        let configured = config(Some("https://relay.example.com"));
        assert_eq!(
            public_base_url(&configured, &headers),
            "https://relay.example.com"
        );
    }
}
