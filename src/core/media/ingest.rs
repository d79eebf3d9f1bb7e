//! Audio ingest loop.
//!
//! One [`AudioIngest`] runs per accepted media websocket. It decodes inbound
//! frames, registers the call on `start`, hands the call id to the STT relay
//! exactly once and pushes decoded audio onto the bounded audio queue. A full
//! queue suspends the loop, which in turn stops reading from the socket.
//!
//! Whatever ends the loop (`stop`, the socket closing, or the relay dropping
//! its end of the queue), [`AudioChunk::EndOfStream`] is forwarded at most once.

use std::fmt::Display;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::messages::{AudioChunk, InboundFrame, MediaError, MediaEvent, StartMetadata};
use crate::core::session::SessionRegistry;

/// Why the ingest loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestExit {
    /// The platform sent `stop`.
    Stopped,
    /// The socket closed or failed.
    Disconnected,
    /// The audio consumer went away.
    DownstreamClosed,
}

/// Outcome of a completed ingest loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub call_id: Option<String>,
    pub chunks_forwarded: u64,
    pub exit: IngestExit,
}

pub struct AudioIngest {
    registry: Arc<SessionRegistry>,
    audio_tx: mpsc::Sender<AudioChunk>,
    call_id_tx: Option<oneshot::Sender<String>>,
    call_id: Option<String>,
    chunks_forwarded: u64,
    end_sent: bool,
}

impl AudioIngest {
    pub fn new(
        registry: Arc<SessionRegistry>,
        audio_tx: mpsc::Sender<AudioChunk>,
        call_id_tx: oneshot::Sender<String>,
    ) -> Self {
        Self {
            registry,
            audio_tx,
            call_id_tx: Some(call_id_tx),
            call_id: None,
            chunks_forwarded: 0,
            end_sent: false,
        }
    }

    /// Drive the loop until the stream ends.
    ///
    /// Only an unsupported media format is returned as an error; every other
    /// bad frame is logged and dropped.
    pub async fn run<S, E>(mut self, mut frames: S) -> Result<IngestSummary, MediaError>
    where
        S: Stream<Item = Result<InboundFrame, E>> + Unpin,
        E: Display,
    {
        let exit = loop {
            let frame = match frames.next().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    warn!("Media stream transport error: {}", e);
                    break IngestExit::Disconnected;
                }
                None => break IngestExit::Disconnected,
            };

            let text = match frame {
                InboundFrame::Text(text) => text,
                InboundFrame::Close => break IngestExit::Disconnected,
                InboundFrame::Control => continue,
                InboundFrame::Binary(data) => {
                    warn!(
                        "{}",
                        MediaError::ProtocolViolation(format!(
                            "unexpected binary frame of {} bytes",
                            data.len()
                        ))
                    );
                    continue;
                }
            };

            let event = match MediaEvent::parse(&text) {
                Ok(event) => event,
                Err(e) => {
                    warn!("{}", e);
                    continue;
                }
            };

            match event {
                MediaEvent::Start { start } => {
                    if let Err(e) = self.handle_start(start) {
                        if matches!(e, MediaError::UnsupportedMediaFormat { .. }) {
                            self.finish().await;
                            return Err(e);
                        }
                        warn!("{}", e);
                    }
                }
                MediaEvent::Media { media } => {
                    if self.call_id.is_none() {
                        warn!("Dropping media frame received before start");
                        continue;
                    }
                    let audio = match media.decode() {
                        Ok(audio) => audio,
                        Err(e) => {
                            warn!("{}", e);
                            continue;
                        }
                    };
                    if self.audio_tx.send(AudioChunk::Audio(audio)).await.is_err() {
                        break IngestExit::DownstreamClosed;
                    }
                    self.chunks_forwarded += 1;
                }
                MediaEvent::Stop => break IngestExit::Stopped,
                MediaEvent::Connected | MediaEvent::Mark => {
                    debug!("Ignoring {} event", event.name());
                }
                MediaEvent::Unknown => {
                    warn!("{}", MediaError::ProtocolViolation("unknown media event".into()));
                }
            }
        };

        self.finish().await;
        info!(
            call_id = ?self.call_id,
            chunks = self.chunks_forwarded,
            "Media stream ended: {:?}",
            exit
        );

        Ok(IngestSummary {
            call_id: self.call_id.take(),
            chunks_forwarded: self.chunks_forwarded,
            exit,
        })
    }

    fn handle_start(&mut self, start: StartMetadata) -> Result<(), MediaError> {
        if self.call_id.is_some() {
            return Err(MediaError::ProtocolViolation(format!(
                "duplicate start for {}",
                start.call_sid
            )));
        }

        if let Err(e) = start.media_format.validate() {
            // Release anyone already polling this call.
            if let Ok(session) = self.registry.get(&start.call_sid) {
                self.registry.end_call(&session);
            }
            return Err(e);
        }

        let (_, created) = self.registry.ensure(&start.call_sid);
        info!(
            call_id = %start.call_sid,
            stream_sid = ?start.stream_sid,
            created,
            "Media stream started"
        );

        if let Some(tx) = self.call_id_tx.take()
            && tx.send(start.call_sid.clone()).is_err()
        {
            debug!("STT relay no longer waiting for call id");
        }
        self.call_id = Some(start.call_sid);
        Ok(())
    }

    async fn finish(&mut self) {
        if self.end_sent {
            return;
        }
        self.end_sent = true;
        if self.audio_tx.send(AudioChunk::EndOfStream).await.is_err() {
            debug!("Audio consumer closed before end of stream");
        }
    }
}
