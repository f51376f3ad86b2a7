//! Per-browser session context and the in-memory store that holds it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use yt_data_client::ChannelRef;
use yt_oauth::{AuthorizationRequest, Credentials};

/// A reference video whose description was looked up for this session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePreview {
    pub url: String,
    pub description: String,
}

/// Everything a signed-in session carries
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub credentials: Credentials,
    pub channel: ChannelRef,
    pub reference: Option<ReferencePreview>,
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// No credentials and no sign-in in progress
    #[default]
    Unauthenticated,
    /// The user was sent to the consent screen and is expected back with a code
    AwaitingCallback { state: String, pkce_verifier: String },
    Authenticated(SignedIn),
}

/// The state of one browser session
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
}

impl Session {
    /// Remember a pending authorization; any previous credentials are dropped
    pub fn await_callback(&mut self, request: &AuthorizationRequest) {
        self.state = SessionState::AwaitingCallback {
            state: request.state.clone(),
            pkce_verifier: request.pkce_verifier.clone(),
        };
    }

    /// Take the pending authorization `(state, pkce_verifier)`, if one exists.
    /// A pending authorization can only be completed once.
    pub fn take_pending(&mut self) -> Option<(String, String)> {
        match std::mem::take(&mut self.state) {
            SessionState::AwaitingCallback {
                state,
                pkce_verifier,
            } => Some((state, pkce_verifier)),
            other => {
                self.state = other;
                None
            }
        }
    }

    pub fn sign_in(&mut self, credentials: Credentials, channel: ChannelRef) {
        self.state = SessionState::Authenticated(SignedIn {
            credentials,
            channel,
            reference: None,
        });
    }

    pub fn signed_in(&self) -> Option<&SignedIn> {
        match &self.state {
            SessionState::Authenticated(signed_in) => Some(signed_in),
            _ => None,
        }
    }

    pub fn signed_in_mut(&mut self) -> Option<&mut SignedIn> {
        match &mut self.state {
            SessionState::Authenticated(signed_in) => Some(signed_in),
            _ => None,
        }
    }

    /// Drop credentials and any pending authorization
    pub fn invalidate(&mut self) {
        self.state = SessionState::Unauthenticated;
    }
}

/// Shared handle to one session. Holding its lock serialises requests of that session.
pub type SessionHandle = Arc<Mutex<Session>>;

struct Entry {
    session: SessionHandle,
    last_seen: Instant,
}

/// In-memory sessions keyed by cookie id. Nothing survives a restart.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Entry>>>,
    idle_timeout: Duration,
}

fn new_session_id() -> String {
    use rand::Rng;
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Look up the session stored under `id`. An unknown, expired or absent id yields
    /// a fresh session that is only kept once passed to [`SessionStore::insert`].
    pub async fn open(&self, id: Option<&str>) -> (Option<String>, SessionHandle) {
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.idle_timeout);
        if sessions.len() < before {
            debug!(pruned = before - sessions.len(), "Pruned idle sessions");
        }

        if let Some(id) = id {
            if let Some(entry) = sessions.get_mut(id) {
                entry.last_seen = now;
                return (Some(id.to_string()), entry.session.clone());
            }
        }
        (None, SessionHandle::default())
    }

    /// Store `session` under a newly generated id and return that id
    pub async fn insert(&self, session: SessionHandle) -> String {
        let id = new_session_id();
        self.sessions.lock().await.insert(
            id.clone(),
            Entry {
                session,
                last_seen: Instant::now(),
            },
        );
        debug!("Started new session");
        id
    }

    /// Move the session stored under `id` to a newly generated id.
    /// The old id stops resolving.
    pub async fn rotate(&self, id: &str) -> Option<String> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.remove(id)?;
        let new_id = new_session_id();
        sessions.insert(
            new_id.clone(),
            Entry {
                session: entry.session,
                last_seen: Instant::now(),
            },
        );
        debug!("Rotated session id");
        Some(new_id)
    }

    /// Forget a session entirely
    pub async fn discard(&self, id: &str) {
        self.sessions.lock().await.remove(id);
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            access_token: "a".to_string(),
            refresh_token: Some("r".to_string()),
            token_type: "Bearer".to_string(),
            expires_at: u64::MAX,
            scopes: vec![],
        }
    }

    fn channel() -> ChannelRef {
        ChannelRef {
            id: "UC1".to_string(),
            title: "Channel".to_string(),
        }
    }

    #[test]
    fn pending_authorization_is_single_use() {
        let mut session = Session::default();
        session.await_callback(&AuthorizationRequest {
            url: "https://auth".to_string(),
            state: "s1".to_string(),
            pkce_verifier: "v1".to_string(),
        });

        assert_eq!(
            session.take_pending(),
            Some(("s1".to_string(), "v1".to_string()))
        );
        assert!(session.take_pending().is_none());
        assert!(matches!(session.state, SessionState::Unauthenticated));
    }

    #[test]
    fn take_pending_leaves_signed_in_sessions_alone() {
        let mut session = Session::default();
        session.sign_in(credentials(), channel());

        assert!(session.take_pending().is_none());
        assert_eq!(session.signed_in().unwrap().channel.id, "UC1");
    }

    #[test]
    fn invalidate_drops_credentials() {
        let mut session = Session::default();
        session.sign_in(credentials(), channel());
        session.invalidate();

        assert!(session.signed_in().is_none());
    }

    #[tokio::test]
    async fn open_reuses_known_ids_and_ignores_unknown_ones() {
        let store = SessionStore::new(Duration::from_secs(60));

        let (none, handle) = store.open(None).await;
        assert!(none.is_none());
        assert!(store.is_empty().await);

        handle.lock().await.sign_in(credentials(), channel());
        let id = store.insert(handle).await;

        let (same_id, same) = store.open(Some(&id)).await;
        assert_eq!(same_id.as_deref(), Some(id.as_str()));
        assert!(same.lock().await.signed_in().is_some());

        let (other_id, other) = store.open(Some("forged")).await;
        assert!(other_id.is_none());
        assert!(other.lock().await.signed_in().is_none());
        assert_eq!(store.len().await, 1);

        store.discard(&id).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn rotate_moves_the_session_to_a_new_id() {
        let store = SessionStore::new(Duration::from_secs(60));
        let handle = SessionHandle::default();
        handle.lock().await.sign_in(credentials(), channel());
        let old_id = store.insert(handle).await;

        let new_id = store.rotate(&old_id).await.unwrap();
        assert_ne!(new_id, old_id);
        assert_eq!(store.len().await, 1);

        let (gone, fresh) = store.open(Some(&old_id)).await;
        assert!(gone.is_none());
        assert!(fresh.lock().await.signed_in().is_none());

        let (_, moved) = store.open(Some(&new_id)).await;
        assert!(moved.lock().await.signed_in().is_some());

        assert!(store.rotate("unknown").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_are_pruned() {
        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.insert(SessionHandle::default()).await;

        tokio::time::advance(Duration::from_secs(61)).await;

        let (found, _) = store.open(Some(&id)).await;
        assert!(found.is_none());
        assert!(store.is_empty().await);
    }
}
