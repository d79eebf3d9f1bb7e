//! Continuation responder behind the platform's long-poll webhook.
//!
//! Every poll releases exactly one item from the call's response queue: a
//! reply to play, or the end of the call. Replies are parked on the session as
//! the pending reply so the TTS proxy can fetch the text when the platform
//! requests the audio.

use std::sync::Arc;

use tracing::{debug, info};

use crate::core::session::{ResponseItem, SessionRegistry, SessionResult};

/// What the platform should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Play the synthesized reply, then poll again.
    Play {
        call_id: String,
        voice_id: String,
        text: String,
    },
    /// Say goodbye and hang up.
    Hangup,
}

pub struct ContinuationResponder {
    registry: Arc<SessionRegistry>,
    voice_id: String,
}

impl ContinuationResponder {
    pub fn new(registry: Arc<SessionRegistry>, voice_id: impl Into<String>) -> Self {
        Self {
            registry,
            voice_id: voice_id.into(),
        }
    }

    /// Wait for the next reply or the end of the call.
    ///
    /// Unknown call ids fail with `NotFound`. Cancel-safe: a dropped poll
    /// consumes nothing. After `Hangup` the session is gone, so any later
    /// poll fails with `NotFound`.
    pub async fn await_next(&self, call_id: &str) -> SessionResult<Instruction> {
        let session = self.registry.get(call_id)?;
        debug!(call_id = %call_id, "Waiting for next response");

        match session.next_response().await {
            ResponseItem::Reply(turn) => {
                session.set_pending_reply(turn.text.clone());
                info!(call_id = %call_id, "Releasing reply");
                Ok(Instruction::Play {
                    call_id: call_id.to_string(),
                    voice_id: self.voice_id.clone(),
                    text: turn.text,
                })
            }
            ResponseItem::EndOfCall => {
                if !self.registry.remove_session(&session) {
                    debug!(call_id = %call_id, "Session already removed at hangup");
                }
                info!(call_id = %call_id, "Call finished");
                Ok(Instruction::Hangup)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::{DialogueTurn, SessionError};
    use std::time::Duration;

    fn responder() -> (Arc<SessionRegistry>, ContinuationResponder) {
        let registry = Arc::new(SessionRegistry::new(4, Duration::from_secs(60)));
        let responder = ContinuationResponder::new(registry.clone(), "voice-1");
        (registry, responder)
    }

    #[tokio::test]
    async fn test_unknown_call_is_not_found() {
        let (registry, responder) = responder();
        assert_eq!(
            responder.await_next("CA404").await,
            Err(SessionError::NotFound("CA404".to_string()))
        );
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_reply_becomes_pending_and_playable() {
        let (registry, responder) = responder();
        let session = registry.create("CA1").unwrap();
        session
            .publish_reply(DialogueTurn::assistant("Hi there"))
            .await
            .unwrap();

        assert_eq!(
            responder.await_next("CA1").await.unwrap(),
            Instruction::Play {
                call_id: "CA1".to_string(),
                voice_id: "voice-1".to_string(),
                text: "Hi there".to_string(),
            }
        );
        assert_eq!(session.pending_reply().as_deref(), Some("Hi there"));
    }

    #[tokio::test]
    async fn test_end_of_call_hangs_up_and_destroys() {
        let (registry, responder) = responder();
        let session = registry.create("CA1").unwrap();
        registry.end_call(&session);

        assert_eq!(
            responder.await_next("CA1").await.unwrap(),
            Instruction::Hangup
        );
        assert!(!registry.contains("CA1"));
        assert!(matches!(
            responder.await_next("CA1").await,
            Err(SessionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_hangup_leaves_replacement_session() {
        let (registry, responder) = responder();
        let old = registry.create("CA1").unwrap();
        let responder = Arc::new(responder);

        let poll = {
            let responder = responder.clone();
            tokio::spawn(async move { responder.await_next("CA1").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // A new call reuses the id while the old poll is still waiting.
        registry.destroy("CA1").unwrap();
        let fresh = registry.create("CA1").unwrap();
        registry.end_call(&old);

        assert_eq!(poll.await.unwrap().unwrap(), Instruction::Hangup);
        let current = registry.get("CA1").unwrap();
        assert!(Arc::ptr_eq(&current, &fresh));
    }

    #[tokio::test]
    async fn test_poll_waits_until_reply_arrives() {
        let (registry, responder) = responder();
        let session = registry.create("CA1").unwrap();
        let responder = Arc::new(responder);

        let poll = {
            let responder = responder.clone();
            tokio::spawn(async move { responder.await_next("CA1").await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!poll.is_finished());

        session
            .publish_reply(DialogueTurn::assistant("late"))
            .await
            .unwrap();
        assert!(matches!(
            poll.await.unwrap().unwrap(),
            Instruction::Play { text, .. } if text == "late"
        ));
    }
}
