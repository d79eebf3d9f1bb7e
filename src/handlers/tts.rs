//! Streaming TTS endpoint fetched by `<Play>`.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::{StreamExt, stream};
use std::sync::Arc;
use tracing::debug;

use super::twilio::is_valid_identifier;
use crate::core::tts::TTSError;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// `GET /tts/stream/{call_sid}/{voice_id}`
///
/// Streams the call's pending reply as `audio/mpeg`. The first chunk is
/// awaited before the response is committed so vendor failures still map to
/// an error status instead of a truncated 200.
pub async fn tts_stream(
    State(state): State<Arc<AppState>>,
    Path((call_sid, voice_id)): Path<(String, String)>,
) -> AppResult<Response> {
    if !is_valid_identifier(&call_sid) {
        return Err(AppError::BadRequest(format!("invalid call id: {call_sid}")));
    }
    if !is_valid_identifier(&voice_id) {
        return Err(AppError::BadRequest(format!("invalid voice id: {voice_id}")));
    }

    let mut audio = state.tts.stream(&call_sid, &voice_id)?;
    let first = match audio.next().await {
        Some(Ok(chunk)) => chunk,
        Some(Err(e)) => return Err(e.into()),
        None => {
            return Err(TTSError::StreamInterrupted("vendor returned no audio".into()).into());
        }
    };
    debug!(call_id = %call_sid, "First TTS chunk: {} bytes", first.len());

    let body = Body::from_stream(stream::once(async move { Ok::<_, TTSError>(first) }).chain(audio));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "audio/mpeg"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
        .into_response())
}
