//! Turn orchestration: one caller utterance in, one assistant reply out.
//!
//! The orchestrator owns no per-call state of its own. Each turn reads and
//! extends the session transcript, so two calls never observe each other's
//! dialogue.

mod guard;

pub use guard::{ContentGuard, DEFAULT_BLOCKED_WARNING};

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::core::llm::{GeneratorError, ReplyGenerator};
use crate::core::session::{CallSession, DialogueTurn, SessionRegistry, SessionResult};

pub struct TurnOrchestrator {
    registry: Arc<SessionRegistry>,
    generator: Arc<dyn ReplyGenerator>,
    guard: ContentGuard,
    timeout: Duration,
}

impl TurnOrchestrator {
    pub fn new(
        registry: Arc<SessionRegistry>,
        generator: Arc<dyn ReplyGenerator>,
        guard: ContentGuard,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            generator,
            guard,
            timeout,
        }
    }

    /// Answer one finalized caller utterance.
    ///
    /// Generator failures are recovered to an empty reply; only an unknown call
    /// id is an error.
    pub async fn handle_utterance(&self, call_id: &str, text: &str) -> SessionResult<String> {
        let session = self.registry.get(call_id)?;
        Ok(self.respond(&session, text).await)
    }

    /// Same as [`handle_utterance`](Self::handle_utterance) for a session
    /// handle resolved by the caller.
    pub async fn respond(&self, session: &CallSession, text: &str) -> String {
        let call_id = session.call_id();
        info!(call_id = %call_id, "Caller: {}", text);
        session.append_turn(DialogueTurn::caller(text));

        if let Some(warning) = self.guard.check(text) {
            warn!(call_id = %call_id, "Utterance contains a blocked term");
            let warning = warning.to_string();
            session.append_turn(DialogueTurn::assistant(warning.clone()));
            return warning;
        }

        let transcript = session.transcript();
        let reply = match tokio::time::timeout(self.timeout, self.generator.generate(&transcript))
            .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                error!(call_id = %call_id, "Reply generation failed: {}", e);
                String::new()
            }
            Err(_) => {
                error!(
                    call_id = %call_id,
                    "Reply generation failed: {}",
                    GeneratorError::Timeout(self.timeout)
                );
                String::new()
            }
        };

        info!(call_id = %call_id, "Assistant: {}", reply);
        session.append_turn(DialogueTurn::assistant(reply.clone()));
        reply
    }
}
