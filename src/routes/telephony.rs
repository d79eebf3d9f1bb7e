//! Telephony route configuration
//!
//! Every endpoint here is called by the voice platform, never by a browser.
//!
//! # Endpoints
//!
//! - `POST /twilio/twiml/start` - call webhook; starts the media stream
//! - `POST /twilio/twiml/continue/{call_sid}` - long-polls the next reply
//! - `GET /twilio/stream` - media stream websocket
//! - `GET /tts/stream/{call_sid}/{voice_id}` - synthesized reply audio

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{media, tts, twilio};
use crate::state::AppState;
use std::sync::Arc;

pub fn create_telephony_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/twilio/twiml/start", post(twilio::twiml_start))
        .route(
            "/twilio/twiml/continue/{call_sid}",
            post(twilio::twiml_continue),
        )
        .route("/twilio/stream", get(media::media_stream_handler))
        .route("/tts/stream/{call_sid}/{voice_id}", get(tts::tts_stream))
        .layer(TraceLayer::new_for_http())
}
