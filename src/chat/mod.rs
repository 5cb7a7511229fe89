//! Chat sessions.
//!
//! A [`ChatSession`] holds the history of one conversation. Sessions are
//! created and ended through a [`SessionStore`]; each session sits behind
//! its own async mutex so turns within a session run one at a time while
//! separate sessions proceed independently.
//!
//! Web clients end their session when the page goes away, but a closed
//! laptop never says goodbye. A store built with
//! [`SessionStore::with_idle_timeout`] drops sessions nobody has touched
//! for that long; [`SessionStore::start_cleanup_task`] runs the sweep.

use crate::rag::{Answer, RagPipeline};
use crate::types::{AppError, ChatMessage, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// History of a single conversation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: String,
    created_at: DateTime<Utc>,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Run one turn: answer `message`, then record the question and the
    /// reply together. On error the history is left untouched.
    pub async fn turn(&mut self, pipeline: &RagPipeline, message: &str) -> Result<Answer> {
        if message.trim().is_empty() {
            return Err(AppError::InvalidInput("Message must not be empty".into()));
        }

        let answer = pipeline.answer(message).await?;
        self.messages.push(ChatMessage::user(message));
        self.messages.push(ChatMessage::assistant(answer.text.clone()));
        Ok(answer)
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

struct SessionEntry {
    session: Arc<Mutex<ChatSession>>,
    last_active: parking_lot::Mutex<Instant>,
}

impl SessionEntry {
    fn new(session: ChatSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            last_active: parking_lot::Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self.last_active.lock() = Instant::now();
    }

    /// Idle for at least `timeout` and not held by a turn in flight.
    fn is_idle(&self, timeout: Duration) -> bool {
        Arc::strong_count(&self.session) == 1 && self.last_active.lock().elapsed() >= timeout
    }
}

/// Live sessions keyed by id.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    idle_timeout: Option<Duration>,
}

impl SessionStore {
    /// A store whose sessions live until explicitly ended.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that lets [`evict_idle`](Self::evict_idle) drop sessions
    /// unused for `timeout`.
    pub fn with_idle_timeout(timeout: Duration) -> Self {
        Self {
            idle_timeout: Some(timeout),
            ..Self::default()
        }
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout
    }

    /// Start a session and return its id.
    pub fn create(&self) -> String {
        let session = ChatSession::new();
        let id = session.id().to_string();
        self.sessions
            .write()
            .insert(id.clone(), SessionEntry::new(session));
        info!(session_id = %id, "Session started");
        id
    }

    /// Look up a session, marking it active.
    pub fn get(&self, id: &str) -> Result<Arc<Mutex<ChatSession>>> {
        let sessions = self.sessions.read();
        let entry = sessions
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("Session '{}' not found", id)))?;
        entry.touch();
        Ok(Arc::clone(&entry.session))
    }

    /// End a session, discarding its history.
    pub fn end(&self, id: &str) -> Result<()> {
        self.sessions
            .write()
            .remove(id)
            .map(|_| info!(session_id = %id, "Session ended"))
            .ok_or_else(|| AppError::NotFound(format!("Session '{}' not found", id)))
    }

    /// Drop every session idle for the configured timeout. Sessions with a
    /// turn in progress are kept. Returns how many were removed.
    pub fn evict_idle(&self) -> usize {
        let Some(timeout) = self.idle_timeout else {
            return 0;
        };

        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let idle = entry.is_idle(timeout);
            if idle {
                info!(session_id = %id, "Session expired");
            }
            !idle
        });
        before - sessions.len()
    }

    /// Sweep idle sessions in the background until the runtime shuts down.
    ///
    /// Returns `None` when the store has no idle timeout.
    pub fn start_cleanup_task(self: &Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
        let timeout = self.idle_timeout?;
        let store = Arc::clone(self);
        let period = (timeout / 4).clamp(Duration::from_secs(1), Duration::from_secs(60));

        Some(tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(period);
            loop {
                interval_timer.tick().await;
                let removed = store.evict_idle();
                if removed > 0 {
                    debug!(removed, remaining = store.len(), "Session cleanup");
                }
            }
        }))
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let store = SessionStore::new();
        let id = store.create();

        assert_eq!(store.len(), 1);
        assert!(store.get(&id).is_ok());

        store.end(&id).unwrap();
        assert!(store.is_empty());
        assert!(matches!(store.get(&id), Err(AppError::NotFound(_))));
        assert!(matches!(store.end(&id), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_sessions_are_independent() {
        let store = SessionStore::new();
        let a = store.create();
        let b = store.create();

        assert_ne!(a, b);
        store.end(&a).unwrap();
        assert!(store.get(&b).is_ok());
    }

    #[tokio::test]
    async fn test_new_session_is_empty() {
        let store = SessionStore::new();
        let id = store.create();
        let session = store.get(&id).unwrap();
        let session = session.lock().await;
        assert!(session.is_empty());
        assert_eq!(session.id(), id);
    }

    #[test]
    fn test_idle_sessions_are_evicted() {
        let store = SessionStore::with_idle_timeout(Duration::ZERO);
        let id = store.create();

        assert_eq!(store.evict_idle(), 1);
        assert!(store.is_empty());
        assert!(matches!(store.get(&id), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_recent_sessions_survive_eviction() {
        let store = SessionStore::with_idle_timeout(Duration::from_secs(3600));
        let id = store.create();

        assert_eq!(store.evict_idle(), 0);
        assert!(store.get(&id).is_ok());
    }

    #[test]
    fn test_session_in_use_is_not_evicted() {
        let store = SessionStore::with_idle_timeout(Duration::ZERO);
        let busy = store.create();
        let idle = store.create();
        let handle = store.get(&busy).unwrap();

        assert_eq!(store.evict_idle(), 1);
        assert!(store.get(&busy).is_ok());
        assert!(store.get(&idle).is_err());
        drop(handle);
    }

    #[test]
    fn test_store_without_timeout_never_evicts() {
        let store = SessionStore::new();
        store.create();

        assert_eq!(store.evict_idle(), 0);
        assert_eq!(store.len(), 1);
        assert!(Arc::new(store).start_cleanup_task().is_none());
    }

    #[tokio::test]
    async fn test_cleanup_task_sweeps_in_background() {
        let store = Arc::new(SessionStore::with_idle_timeout(Duration::ZERO));
        store.create();
        let task = store.start_cleanup_task().unwrap();

        // the first interval tick fires immediately
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(store.is_empty());
        task.abort();
    }
}
