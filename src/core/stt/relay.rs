//! STT relay: bridges one call's audio queue to the streaming recognizer.
//!
//! ```text
//! ┌──────────────┐ AudioChunk ┌───────────────┐  binary / EOS  ┌────────┐
//! │ AudioIngest  │───────────▶│  sender task  │───────────────▶│        │
//! └──────┬───────┘  (mpsc)    └───────────────┘                │  RTZR  │
//!        │ call id (oneshot)                                   │        │
//!        ▼                    ┌───────────────┐  JSON frames   │        │
//!                             │   receiver    │◀───────────────│        │
//!                             └───────┬───────┘                └────────┘
//!                                     │ final utterance
//!                                     ▼
//!                          TurnOrchestrator ──▶ session response queue
//! ```
//!
//! Shutdown is message driven: the ingest loop forwards `EndOfStream`, the
//! sender turns it into `EOS`, the vendor flushes its last finals and closes,
//! and the receiver publishes the end-of-call sentinel.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

use super::base::{STTError, TranscriptEvent};
use super::rtzr::{END_OF_STREAM, RtzrMessage, RtzrSTTConfig};
use crate::core::media::AudioChunk;
use crate::core::session::{CallSession, DialogueTurn, SessionRegistry};
use crate::core::turn::TurnOrchestrator;

/// How long the sender may take to finish once the vendor stream has ended.
const SENDER_GRACE: Duration = Duration::from_millis(200);

type VendorSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type VendorSink = SplitSink<VendorSocket, Message>;
type VendorStream = SplitStream<VendorSocket>;

/// Counters reported when a relay finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelaySummary {
    pub call_id: Option<String>,
    pub chunks_sent: u64,
    pub utterances: u64,
    pub replies: u64,
}

pub struct SttRelay {
    config: RtzrSTTConfig,
    registry: Arc<SessionRegistry>,
    orchestrator: Arc<TurnOrchestrator>,
}

impl SttRelay {
    pub fn new(
        config: RtzrSTTConfig,
        registry: Arc<SessionRegistry>,
        orchestrator: Arc<TurnOrchestrator>,
    ) -> Self {
        Self {
            config,
            registry,
            orchestrator,
        }
    }

    /// Relay one call until the vendor closes its stream.
    ///
    /// If the vendor cannot be reached, the call is still released: the relay
    /// waits for the call id and publishes the end-of-call sentinel before
    /// returning [`STTError::VendorConnectionFailure`].
    pub async fn run(
        &self,
        audio_rx: mpsc::Receiver<AudioChunk>,
        call_id_rx: oneshot::Receiver<String>,
    ) -> Result<RelaySummary, STTError> {
        let socket = match self.connect().await {
            Ok(socket) => socket,
            Err(e) => {
                error!("Failed to connect to RTZR: {}", e);
                // Unblocks the ingest loop.
                drop(audio_rx);
                self.release_without_vendor(call_id_rx).await;
                return Err(e);
            }
        };
        info!("Connected to RTZR streaming STT");

        let (sink, stream) = socket.split();
        let mut sender = tokio::spawn(send_audio(sink, audio_rx));

        let mut summary = self.receive(stream, call_id_rx).await;

        // The sender normally finished with EOS already; stop it if the
        // vendor closed first.
        let joined = match tokio::time::timeout(SENDER_GRACE, &mut sender).await {
            Ok(joined) => joined,
            Err(_) => {
                sender.abort();
                sender.await
            }
        };
        match joined {
            Ok((mut sink, chunks_sent)) => {
                summary.chunks_sent = chunks_sent;
                if let Err(e) = sink.close().await {
                    debug!("Closing RTZR connection: {}", e);
                }
            }
            Err(e) if e.is_cancelled() => debug!("RTZR sender cancelled"),
            Err(e) => warn!("RTZR sender task failed: {}", e),
        }

        info!(
            call_id = ?summary.call_id,
            chunks = summary.chunks_sent,
            utterances = summary.utterances,
            replies = summary.replies,
            "STT relay finished"
        );
        Ok(summary)
    }

    async fn connect(&self) -> Result<VendorSocket, STTError> {
        let request = self
            .config
            .build_request()
            .map_err(|e| STTError::VendorConnectionFailure(e.to_string()))?;
        let (socket, _response) = connect_async(request)
            .await
            .map_err(|e| STTError::VendorConnectionFailure(e.to_string()))?;
        Ok(socket)
    }

    async fn release_without_vendor(&self, call_id_rx: oneshot::Receiver<String>) {
        let Ok(call_id) = call_id_rx.await else {
            return;
        };
        match self.registry.get(&call_id) {
            Ok(session) => {
                self.registry.end_call(&session);
            }
            Err(e) => warn!("Cannot release call after STT failure: {}", e),
        }
    }

    async fn receive(
        &self,
        mut stream: VendorStream,
        call_id_rx: oneshot::Receiver<String>,
    ) -> RelaySummary {
        let mut summary = RelaySummary::default();

        let Ok(call_id) = call_id_rx.await else {
            info!("Media stream ended before the call was identified");
            return summary;
        };
        summary.call_id = Some(call_id.clone());

        let session = match self.registry.get(&call_id) {
            Ok(session) => session,
            Err(e) => {
                warn!("STT relay has no session: {}", e);
                return summary;
            }
        };

        loop {
            let message = match stream.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    warn!(call_id = %call_id, "RTZR transport error: {}", e);
                    break;
                }
                None => break,
            };

            match Self::decode_frame(message) {
                Ok(Some(TranscriptEvent::Final(text))) => {
                    summary.utterances += 1;
                    if !self.answer(&session, &text).await {
                        break;
                    }
                    summary.replies += 1;
                }
                Ok(Some(TranscriptEvent::Interim(text))) => {
                    debug!(call_id = %call_id, "Interim: {}", text);
                }
                Ok(Some(TranscriptEvent::Closed)) => {
                    debug!(call_id = %call_id, "RTZR closed the stream");
                    break;
                }
                Ok(None) => {}
                Err(e) => warn!(call_id = %call_id, "{}", e),
            }
        }

        self.registry.end_call(&session);
        summary
    }

    /// Run one turn and queue the reply. Returns `false` once the session has ended.
    async fn answer(&self, session: &Arc<CallSession>, text: &str) -> bool {
        let reply = self.orchestrator.respond(session, text).await;
        if reply.is_empty() {
            return true;
        }
        match session.publish_reply(DialogueTurn::assistant(reply)).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropping reply: {}", e);
                false
            }
        }
    }

    /// Decode one vendor frame. `Ok(None)` means nothing to act on.
    pub(crate) fn decode_frame(message: Message) -> Result<Option<TranscriptEvent>, STTError> {
        match message {
            Message::Text(text) => Ok(RtzrMessage::parse(&text)?.into_event()),
            Message::Close(frame) => {
                debug!("RTZR close frame: {:?}", frame);
                Ok(Some(TranscriptEvent::Closed))
            }
            Message::Binary(data) => Err(STTError::ProtocolViolation(format!(
                "unexpected binary frame of {} bytes",
                data.len()
            ))),
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Ok(None),
        }
    }
}

/// Drain the audio queue into the vendor socket.
///
/// Stops after sending `EOS` without closing the socket; the sink is handed
/// back so the relay can close it once the vendor is done.
async fn send_audio(
    mut sink: VendorSink,
    mut audio_rx: mpsc::Receiver<AudioChunk>,
) -> (VendorSink, u64) {
    let mut sent = 0u64;
    loop {
        match audio_rx.recv().await {
            Some(AudioChunk::Audio(data)) => {
                if let Err(e) = sink.send(Message::Binary(data)).await {
                    warn!("Failed to send audio to RTZR: {}", e);
                    break;
                }
                sent += 1;
            }
            // A dropped producer means the same as an explicit end.
            Some(AudioChunk::EndOfStream) | None => {
                debug!("Sending {} to RTZR after {} chunks", END_OF_STREAM, sent);
                if let Err(e) = sink.send(Message::Text(END_OF_STREAM.into())).await {
                    warn!("Failed to send {} to RTZR: {}", END_OF_STREAM, e);
                }
                break;
            }
        }
    }
    (sink, sent)
}
