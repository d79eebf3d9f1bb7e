//! RTZR streaming STT mock
//!
//! Accepts any number of connections. Binary frames are counted; after every
//! `final_every` frames the next scripted utterance is sent as a final
//! result. On `EOS` the remaining utterances are flushed and the socket
//! closed, the way the vendor does. Frames that arrive before the client
//! acknowledges the close are still counted.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};

#[derive(Default)]
pub struct RtzrMockStats {
    pub connections: AtomicU64,
    pub audio_frames: AtomicU64,
    pub audio_bytes: AtomicU64,
    pub eos_frames: AtomicU64,
    /// Binary payloads in arrival order.
    pub audio: Mutex<Vec<Vec<u8>>>,
}

pub struct RtzrMock {
    pub url: String,
    pub stats: Arc<RtzrMockStats>,
}

struct Script {
    utterances: Mutex<VecDeque<String>>,
    final_every: u64,
}

impl RtzrMock {
    /// Start a mock that emits `utterances` in order.
    ///
    /// `final_every == 0` holds every utterance until `EOS`.
    pub async fn start(utterances: &[&str], final_every: u64) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock RTZR server");
        let addr = listener.local_addr().expect("mock address");
        let stats = Arc::new(RtzrMockStats::default());
        let script = Arc::new(Script {
            utterances: Mutex::new(utterances.iter().map(|u| u.to_string()).collect()),
            final_every,
        });

        let accept_stats = stats.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(handle_connection(
                    stream,
                    accept_stats.clone(),
                    script.clone(),
                ));
            }
        });

        Self {
            url: format!("ws://{addr}/v1/transcribe:streaming"),
            stats,
        }
    }
}

fn final_frame(seq: u64, text: &str) -> Message {
    Message::Text(
        json!({
            "seq": seq,
            "start_at": seq * 1000,
            "duration": 900,
            "final": true,
            "alternatives": [{"text": text, "confidence": 0.93}]
        })
        .to_string()
        .into(),
    )
}

async fn handle_connection(stream: TcpStream, stats: Arc<RtzrMockStats>, script: Arc<Script>) {
    let Ok(socket) = accept_async(stream).await else {
        return;
    };
    stats.connections.fetch_add(1, Ordering::SeqCst);
    let (mut write, mut read) = socket.split();
    let mut seq = 0u64;
    let mut frames = 0u64;
    let mut closing = false;

    while let Some(Ok(message)) = read.next().await {
        match message {
            Message::Binary(data) => {
                frames += 1;
                stats.audio_frames.fetch_add(1, Ordering::SeqCst);
                stats
                    .audio_bytes
                    .fetch_add(data.len() as u64, Ordering::SeqCst);
                stats.audio.lock().push(data.to_vec());

                if !closing && script.final_every > 0 && frames % script.final_every == 0 {
                    let next = script.utterances.lock().pop_front();
                    if let Some(text) = next {
                        seq += 1;
                        if write.send(final_frame(seq, &text)).await.is_err() {
                            return;
                        }
                    }
                }
            }
            Message::Text(text) if text.as_str() == "EOS" => {
                stats.eos_frames.fetch_add(1, Ordering::SeqCst);
                if closing {
                    continue;
                }
                closing = true;
                let rest: Vec<String> = script.utterances.lock().drain(..).collect();
                for text in rest {
                    seq += 1;
                    if write.send(final_frame(seq, &text)).await.is_err() {
                        return;
                    }
                }
                let _ = write.send(Message::Close(None)).await;
            }
            _ => {}
        }
    }
}
