//! Per-call session state.
//!
//! A [`CallSession`] is the only state shared between the tasks that serve a
//! single call: the audio ingest loop, the STT relay, the turn orchestrator and
//! the continuation webhook. Sessions are owned by the [`SessionRegistry`];
//! everything else refers to a call by its id and resolves it through the
//! registry.
//!
//! # Response queue
//!
//! Each session owns a bounded FIFO of [`ResponseItem`]s. The relay publishes
//! replies into it and the continuation webhook drains it one item per poll.
//! The queue is closed logically by [`ResponseItem::EndOfCall`]: it is published
//! at most once and nothing is accepted after it.

mod registry;

pub use registry::{RegistryStats, SessionRegistry};

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::time::Instant;
use tracing::debug;

/// Errors raised by session lookups and the response queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Session already exists: {0}")]
    AlreadyExists(String),
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Session already ended: {0}")]
    Ended(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Speaker of a dialogue turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Caller,
    Assistant,
}

impl Role {
    /// Role name used by chat-completion APIs.
    pub fn as_chat_role(&self) -> &'static str {
        match self {
            Role::Caller => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry of the call transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueTurn {
    pub role: Role,
    pub text: String,
}

impl DialogueTurn {
    pub fn caller(text: impl Into<String>) -> Self {
        Self {
            role: Role::Caller,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Item carried by a session's response queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseItem {
    Reply(DialogueTurn),
    EndOfCall,
}

/// End-of-call bookkeeping, guarded together with every enqueue.
#[derive(Debug, Default)]
struct EndState {
    ended: bool,
    /// The sentinel is in the channel or already handed out.
    sentinel_queued: bool,
}

/// State of a single live call.
pub struct CallSession {
    call_id: String,
    transcript: Mutex<Vec<DialogueTurn>>,
    pending_reply: Mutex<Option<String>>,
    response_tx: mpsc::Sender<ResponseItem>,
    response_rx: AsyncMutex<mpsc::Receiver<ResponseItem>>,
    /// Held (never across an await) while checking for the end and enqueueing,
    /// so no reply can land behind the sentinel.
    end: Mutex<EndState>,
    last_activity: Mutex<Instant>,
}

impl std::fmt::Debug for CallSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSession")
            .field("call_id", &self.call_id)
            .field("turns", &self.transcript.lock().len())
            .finish()
    }
}

impl CallSession {
    /// Create a session whose response queue holds at most `response_capacity` items.
    ///
    /// A capacity of zero is bumped to one; tokio channels reject zero.
    pub fn new(call_id: impl Into<String>, response_capacity: usize) -> Self {
        let (response_tx, response_rx) = mpsc::channel(response_capacity.max(1));
        Self {
            call_id: call_id.into(),
            transcript: Mutex::new(Vec::new()),
            pending_reply: Mutex::new(None),
            response_tx,
            response_rx: AsyncMutex::new(response_rx),
            end: Mutex::new(EndState::default()),
            last_activity: Mutex::new(Instant::now()),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Append a turn to the transcript.
    pub fn append_turn(&self, turn: DialogueTurn) {
        self.transcript.lock().push(turn);
    }

    /// Snapshot of the transcript in chronological order.
    pub fn transcript(&self) -> Vec<DialogueTurn> {
        self.transcript.lock().clone()
    }

    pub fn set_pending_reply(&self, text: impl Into<String>) {
        *self.pending_reply.lock() = Some(text.into());
    }

    /// The reply most recently released to the platform, if any.
    pub fn pending_reply(&self) -> Option<String> {
        self.pending_reply.lock().clone()
    }

    /// Record that the platform is still working through this call.
    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Time since the platform last polled or fetched audio for this call.
    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    /// Whether anything, replies or the end-of-call sentinel, is still
    /// waiting to be handed to a poll.
    pub fn has_undelivered(&self) -> bool {
        let end = self.end.lock();
        self.response_tx.capacity() < self.response_tx.max_capacity()
            || (end.ended && !end.sentinel_queued)
    }

    /// Enqueue a reply.
    ///
    /// Waits for room when the queue is full. Fails with
    /// [`SessionError::Ended`] once the end-of-call sentinel has been published.
    pub async fn publish_reply(&self, turn: DialogueTurn) -> SessionResult<()> {
        if self.end.lock().ended {
            return Err(SessionError::Ended(self.call_id.clone()));
        }
        let permit = self
            .response_tx
            .reserve()
            .await
            .map_err(|_| SessionError::Ended(self.call_id.clone()))?;

        let end = self.end.lock();
        if end.ended {
            return Err(SessionError::Ended(self.call_id.clone()));
        }
        permit.send(ResponseItem::Reply(turn));
        Ok(())
    }

    /// Publish the end-of-call sentinel.
    ///
    /// Never waits: when the queue is full the sentinel is handed out by
    /// [`next_response`](Self::next_response) once the queued replies drain.
    /// Returns `true` for the call that actually published it and `false` for
    /// every later call.
    pub fn publish_end_of_call(&self) -> bool {
        let mut end = self.end.lock();
        if end.ended {
            return false;
        }
        end.ended = true;
        match self.response_tx.try_send(ResponseItem::EndOfCall) {
            Ok(()) => end.sentinel_queued = true,
            Err(TrySendError::Full(_)) => {
                debug!("Response queue for {} full; end of call deferred", self.call_id)
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Response queue for {} already closed", self.call_id)
            }
        }
        drop(end);
        self.touch();
        true
    }

    /// Wait for the next queued item.
    ///
    /// Cancel-safe: dropping the returned future before it completes removes
    /// nothing from the queue.
    pub async fn next_response(&self) -> ResponseItem {
        self.touch();
        let mut rx = self.response_rx.lock().await;
        let ready = {
            let mut end = self.end.lock();
            match rx.try_recv() {
                Ok(item) => Some(item),
                Err(_) if end.ended && !end.sentinel_queued => {
                    end.sentinel_queued = true;
                    Some(ResponseItem::EndOfCall)
                }
                Err(_) => None,
            }
        };
        let item = match ready {
            Some(item) => item,
            // The session owns the sender, so the channel cannot close under us.
            None => rx.recv().await.unwrap_or(ResponseItem::EndOfCall),
        };
        self.touch();
        item
    }
}
