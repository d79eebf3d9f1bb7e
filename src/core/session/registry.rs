use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info};

use super::{CallSession, SessionError, SessionResult};

/// Linger periods an ended call with undelivered items may wait for a poll.
pub const ABANDONED_LINGER_FACTOR: u32 = 10;

/// Counters exposed for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub active: usize,
    pub created: u64,
    pub lookups: u64,
    pub destroyed: u64,
}

/// Registry of live call sessions keyed by call id.
///
/// Backed by a sharded map: inserts and removals are atomic per entry and no
/// lock spans more than one call. Lookups never create sessions.
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<CallSession>>,
    response_capacity: usize,
    linger: Duration,
    created: AtomicU64,
    lookups: AtomicU64,
    destroyed: AtomicU64,
}

impl SessionRegistry {
    /// Create a registry.
    ///
    /// `response_capacity` bounds each session's response queue and `linger`
    /// is how long an ended session stays resolvable before it is removed.
    pub fn new(response_capacity: usize, linger: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            response_capacity,
            linger,
            created: AtomicU64::new(0),
            lookups: AtomicU64::new(0),
            destroyed: AtomicU64::new(0),
        }
    }

    /// Register a new session. Fails if the id is already present.
    pub fn create(&self, call_id: &str) -> SessionResult<Arc<CallSession>> {
        match self.sessions.entry(call_id.to_string()) {
            Entry::Occupied(_) => Err(SessionError::AlreadyExists(call_id.to_string())),
            Entry::Vacant(entry) => {
                let session = Arc::new(CallSession::new(call_id, self.response_capacity));
                entry.insert(session.clone());
                self.created.fetch_add(1, Ordering::Relaxed);
                info!(call_id = %call_id, "Session created");
                Ok(session)
            }
        }
    }

    /// Register the session if absent. Returns the handle and whether it was created.
    ///
    /// Used by whichever of the webhook and the media stream observes the call first.
    pub fn ensure(&self, call_id: &str) -> (Arc<CallSession>, bool) {
        match self.sessions.entry(call_id.to_string()) {
            Entry::Occupied(entry) => (entry.get().clone(), false),
            Entry::Vacant(entry) => {
                let session = Arc::new(CallSession::new(call_id, self.response_capacity));
                entry.insert(session.clone());
                self.created.fetch_add(1, Ordering::Relaxed);
                info!(call_id = %call_id, "Session created");
                (session, true)
            }
        }
    }

    /// Resolve a session handle.
    pub fn get(&self, call_id: &str) -> SessionResult<Arc<CallSession>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.sessions
            .get(call_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SessionError::NotFound(call_id.to_string()))
    }

    /// Presence check that is not counted as a lookup.
    pub fn contains(&self, call_id: &str) -> bool {
        self.sessions.contains_key(call_id)
    }

    /// Remove a session. A second destroy of the same id fails with `NotFound`.
    pub fn destroy(&self, call_id: &str) -> SessionResult<()> {
        match self.sessions.remove(call_id) {
            Some(_) => {
                self.destroyed.fetch_add(1, Ordering::Relaxed);
                info!(call_id = %call_id, "Session destroyed");
                Ok(())
            }
            None => Err(SessionError::NotFound(call_id.to_string())),
        }
    }

    /// Remove `session` only if it is still the one registered under its id.
    ///
    /// Returns `false` when it was already removed or replaced by a newer
    /// session with the same id.
    pub fn remove_session(&self, session: &Arc<CallSession>) -> bool {
        let removed = self
            .sessions
            .remove_if(session.call_id(), |_, current| Arc::ptr_eq(current, session));
        if removed.is_some() {
            self.destroyed.fetch_add(1, Ordering::Relaxed);
            info!(call_id = %session.call_id(), "Session destroyed");
            true
        } else {
            false
        }
    }

    /// Publish the end-of-call sentinel and arm the fallback removal.
    ///
    /// Returns `false` if the session had already ended.
    pub fn end_call(self: &Arc<Self>, session: &Arc<CallSession>) -> bool {
        if !session.publish_end_of_call() {
            return false;
        }
        info!(call_id = %session.call_id(), "End of call published");
        self.schedule_destroy(session);
        true
    }

    /// Fallback removal for calls whose final poll never arrives.
    ///
    /// The session goes once the platform has been idle for the linger period
    /// with nothing left to deliver. While replies or the sentinel are still
    /// queued it is kept for up to [`ABANDONED_LINGER_FACTOR`] linger periods
    /// since the last poll, so slow playback never loses the goodbye.
    fn schedule_destroy(self: &Arc<Self>, session: &Arc<CallSession>) {
        let registry = Arc::clone(self);
        let session = Arc::clone(session);
        let linger = self.linger;
        tokio::spawn(async move {
            loop {
                let limit = if session.has_undelivered() {
                    linger * ABANDONED_LINGER_FACTOR
                } else {
                    linger
                };
                let idle = session.idle_for();
                if idle >= limit {
                    break;
                }
                tokio::time::sleep(limit - idle).await;
            }
            if registry.remove_session(&session) {
                info!(call_id = %session.call_id(), "Session removed after linger");
            } else {
                debug!(call_id = %session.call_id(), "Session already gone at linger expiry");
            }
        });
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            active: self.sessions.len(),
            created: self.created.load(Ordering::Relaxed),
            lookups: self.lookups.load(Ordering::Relaxed),
            destroyed: self.destroyed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::{DialogueTurn, ResponseItem};

    fn registry() -> Arc<SessionRegistry> {
        Arc::new(SessionRegistry::new(4, Duration::from_millis(20)))
    }

    #[test]
    fn test_create_then_get() {
        let registry = registry();
        let created = registry.create("CA1").unwrap();
        let fetched = registry.get("CA1").unwrap();
        assert!(Arc::ptr_eq(&created, &fetched));
    }

    #[test]
    fn test_create_twice_fails() {
        let registry = registry();
        registry.create("CA1").unwrap();
        assert_eq!(
            registry.create("CA1").unwrap_err(),
            SessionError::AlreadyExists("CA1".to_string())
        );
    }

    #[test]
    fn test_get_never_creates() {
        let registry = registry();
        assert_eq!(
            registry.get("CA404").unwrap_err(),
            SessionError::NotFound("CA404".to_string())
        );
        assert!(!registry.contains("CA404"));

        let stats = registry.stats();
        assert_eq!(stats.created, 0);
        assert_eq!(stats.lookups, 1);
        assert_eq!(stats.active, 0);
    }

    #[test]
    fn test_destroy_twice_is_not_found() {
        let registry = registry();
        registry.create("CA1").unwrap();
        registry.destroy("CA1").unwrap();
        assert_eq!(
            registry.destroy("CA1").unwrap_err(),
            SessionError::NotFound("CA1".to_string())
        );
        assert_eq!(registry.stats().destroyed, 1);
        assert!(registry.get("CA1").is_err());
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let registry = registry();
        let (first, created) = registry.ensure("CA1");
        assert!(created);
        let (second, created) = registry.ensure("CA1");
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.stats().created, 1);
    }

    #[test]
    fn test_contains_is_not_a_lookup() {
        let registry = registry();
        registry.create("CA1").unwrap();
        assert!(registry.contains("CA1"));
        assert_eq!(registry.stats().lookups, 0);
    }

    #[tokio::test]
    async fn test_end_call_publishes_once_and_lingers() {
        let registry = registry();
        let session = registry.create("CA1").unwrap();

        assert!(registry.end_call(&session));
        assert!(!registry.end_call(&session));
        assert!(registry.contains("CA1"), "session must linger");
        assert_eq!(session.next_response().await, ResponseItem::EndOfCall);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!registry.contains("CA1"));
        assert_eq!(registry.stats().destroyed, 1);
    }

    #[tokio::test]
    async fn test_linger_does_not_remove_replacement() {
        let registry = registry();
        let old = registry.create("CA1").unwrap();
        registry.end_call(&old);
        registry.destroy("CA1").unwrap();
        let fresh = registry.create("CA1").unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;
        let current = registry.get("CA1").unwrap();
        assert!(Arc::ptr_eq(&current, &fresh));
    }

    #[tokio::test]
    async fn test_linger_keeps_queued_replies_and_goodbye() {
        let registry = Arc::new(SessionRegistry::new(4, Duration::from_millis(50)));
        let session = registry.create("CA1").unwrap();
        session
            .publish_reply(DialogueTurn::assistant("one"))
            .await
            .unwrap();
        session
            .publish_reply(DialogueTurn::assistant("two"))
            .await
            .unwrap();
        registry.end_call(&session);

        assert_eq!(
            session.next_response().await,
            ResponseItem::Reply(DialogueTurn::assistant("one"))
        );
        // Playback of "one" outlasts the linger period.
        tokio::time::sleep(Duration::from_millis(120)).await;

        let current = registry.get("CA1").unwrap();
        assert_eq!(
            current.next_response().await,
            ResponseItem::Reply(DialogueTurn::assistant("two"))
        );
        assert_eq!(current.next_response().await, ResponseItem::EndOfCall);
    }

    #[tokio::test]
    async fn test_abandoned_call_is_eventually_removed() {
        let registry = Arc::new(SessionRegistry::new(4, Duration::from_millis(5)));
        let session = registry.create("CA1").unwrap();
        session
            .publish_reply(DialogueTurn::assistant("never played"))
            .await
            .unwrap();
        registry.end_call(&session);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(registry.contains("CA1"), "undelivered items extend the linger");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!registry.contains("CA1"));
    }

    #[test]
    fn test_remove_session_checks_identity() {
        let registry = registry();
        let old = registry.create("CA1").unwrap();
        registry.destroy("CA1").unwrap();
        let fresh = registry.create("CA1").unwrap();

        assert!(!registry.remove_session(&old));
        assert!(registry.contains("CA1"));
        assert!(registry.remove_session(&fresh));
        assert!(!registry.contains("CA1"));
        assert_eq!(registry.stats().destroyed, 2);
    }

    #[tokio::test]
    async fn test_concurrent_calls_are_independent() {
        let registry = registry();
        let mut handles = Vec::new();
        for i in 0..32 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("CA{i}");
                registry.create(&id).unwrap();
                registry.get(&id).unwrap();
                registry.destroy(&id).unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let stats = registry.stats();
        assert_eq!(stats.created, 32);
        assert_eq!(stats.destroyed, 32);
        assert_eq!(stats.active, 0);
    }
}
