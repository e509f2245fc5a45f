//! Chat sessions and the session store
//!
//! A session pairs an immutable identity (captured on page load) with a
//! transcript. Sessions live in a [`SessionStore`] owned by the server
//! process; the default store keeps them in memory until restart.

use crate::chat::models::{Message, MessageRole};
use crate::chat::transcript::Transcript;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Unique identifier for a session
pub type SessionId = String;

/// Who the widget user is, as far as the host page told us
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User email, forwarded upstream as an auth claim
    pub email: Option<String>,
    /// Display name
    pub name: Option<String>,
}

impl Identity {
    /// Create an identity from optional attributes
    ///
    /// Blank values are treated as absent.
    pub fn new(email: Option<String>, name: Option<String>) -> Self {
        Self {
            email: email.filter(|e| !e.trim().is_empty()),
            name: name.filter(|n| !n.trim().is_empty()),
        }
    }
}

/// One widget conversation
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    identity: Identity,
    created_at: DateTime<Utc>,
    transcript: RwLock<Transcript>,
}

impl Session {
    /// Create a session with a freshly generated id
    pub fn new(identity: Identity) -> Self {
        Self {
            id: Self::generate_id(),
            identity,
            created_at: Utc::now(),
            transcript: RwLock::new(Transcript::new()),
        }
    }

    /// Generate a time-based session id
    ///
    /// A short random suffix keeps ids created in the same second distinct.
    pub fn generate_id() -> SessionId {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}-{}", Utc::now().format("%Y%m%d%H%M%S"), &suffix[..8])
    }

    /// Session id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identity captured when the session started
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// When the session was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Append a message to the transcript
    pub async fn append(&self, content: &str, role: MessageRole) {
        self.transcript.write().await.append(content, role);
    }

    /// Ordered copy of the transcript
    pub async fn snapshot(&self) -> Vec<Message> {
        self.transcript.read().await.snapshot()
    }

    /// Clear the transcript, keeping identity
    pub async fn clear(&self) {
        self.transcript.write().await.clear();
    }

    /// Number of messages in the transcript
    pub async fn message_count(&self) -> usize {
        self.transcript.read().await.len()
    }
}

/// Keyed table of live sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create and register a new session
    async fn create(&self, identity: Identity) -> Arc<Session>;

    /// Look up a session by id
    async fn get(&self, id: &str) -> Option<Arc<Session>>;

    /// Remove a session, returning whether it existed
    async fn remove(&self, id: &str) -> bool;

    /// Number of live sessions
    async fn len(&self) -> usize;

    /// Return the known session for `id`, or create an anonymous one
    async fn get_or_create(&self, id: Option<&str>) -> Arc<Session> {
        if let Some(id) = id {
            if let Some(session) = self.get(id).await {
                return session;
            }
            debug!(session_id = %id, "Unknown session id, starting a new session");
        }
        self.create(Identity::default()).await
    }
}

/// Session store backed by an in-process map
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Session>>>,
}

impl InMemorySessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, identity: Identity) -> Arc<Session> {
        let session = Arc::new(Session::new(identity));
        info!(
            session_id = %session.id(),
            email = ?session.identity().email,
            name = ?session.identity().name,
            "Session created"
        );
        self.sessions
            .write()
            .await
            .insert(session.id().to_string(), session.clone());
        session
    }

    async fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().await.get(id).cloned()
    }

    async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_blank_values_are_absent() {
        let identity = Identity::new(Some("  ".to_string()), Some("Ana".to_string()));
        assert_eq!(identity.email, None);
        assert_eq!(identity.name.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_generate_id_is_unique() {
        let id1 = Session::generate_id();
        let id2 = Session::generate_id();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 14 + 1 + 8);
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemorySessionStore::new();
        let identity = Identity::new(Some("a@b.c".to_string()), None);
        let session = store.create(identity.clone()).await;

        let found = store.get(session.id()).await.unwrap();
        assert_eq!(found.identity(), &identity);
        assert_eq!(store.len().await, 1);
        assert!(store.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_known_session() {
        let store = InMemorySessionStore::new();
        let session = store.create(Identity::default()).await;

        let same = store.get_or_create(Some(session.id())).await;
        assert!(Arc::ptr_eq(&session, &same));

        let fresh = store.get_or_create(Some("stale-id")).await;
        assert_ne!(fresh.id(), session.id());

        let anonymous = store.get_or_create(None).await;
        assert_eq!(anonymous.identity(), &Identity::default());
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_clear_keeps_identity() {
        let store = InMemorySessionStore::new();
        let identity = Identity::new(Some("a@b.c".to_string()), Some("Ana".to_string()));
        let session = store.create(identity.clone()).await;

        session.append("hello", MessageRole::User).await;
        session.append("hi [1]", MessageRole::Assistant).await;
        assert_eq!(session.message_count().await, 2);

        session.clear().await;
        assert!(session.snapshot().await.is_empty());
        assert_eq!(session.identity(), &identity);
    }

    #[tokio::test]
    async fn test_remove() {
        let store = InMemorySessionStore::new();
        let session = store.create(Identity::default()).await;
        assert!(store.remove(session.id()).await);
        assert!(!store.remove(session.id()).await);
        assert_eq!(store.len().await, 0);
    }
}
