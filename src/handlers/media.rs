//! Media stream websocket.
//!
//! Each accepted socket gets its own audio queue and STT relay. The ingest
//! loop reads the socket on the handler task while the relay runs on a
//! spawned task; the handler waits for both before the connection is dropped.

use axum::{
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::core::media::{AudioIngest, InboundFrame};
use crate::state::AppState;

/// Maximum inbound websocket message size (1 MB). Media frames are ~200 bytes.
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// `GET /twilio/stream`
///
/// Upgrades the connection and relays the call's inbound audio to STT.
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("Media stream upgrade requested");
    ws.max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_media_socket(socket, state))
}

async fn handle_media_socket(socket: WebSocket, state: Arc<AppState>) {
    let (audio_tx, audio_rx) = mpsc::channel(state.config.audio_queue_capacity);
    let (call_id_tx, call_id_rx) = oneshot::channel();

    let relay = state.stt_relay();
    let relay_task = tokio::spawn(async move { relay.run(audio_rx, call_id_rx).await });

    let frames = socket.map(|frame| frame.map(InboundFrame::from));
    match AudioIngest::new(state.registry.clone(), audio_tx, call_id_tx)
        .run(frames)
        .await
    {
        Ok(summary) => info!(
            call_id = ?summary.call_id,
            chunks = summary.chunks_forwarded,
            "Ingest finished: {:?}",
            summary.exit
        ),
        Err(e) => warn!("Media stream rejected: {}", e),
    }

    match relay_task.await {
        Ok(Ok(summary)) => debug!(call_id = ?summary.call_id, "Media socket closed"),
        Ok(Err(e)) => error!("STT relay failed: {}", e),
        Err(e) => error!("STT relay task panicked: {}", e),
    }
}
