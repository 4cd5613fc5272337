//! Session Store
//!
//! Owns the signed-in identity and its bearer token, persists them across
//! restarts and exposes the current state as an explicit state machine.
//!
//! ```text
//! Anonymous ──begin_restore──▶ Verifying ──finish_restore(ok)──▶ Authenticated
//!                                  │
//!                                  └──finish_restore(err)──▶ Invalid
//!
//! login:  any state ──▶ Authenticated
//! logout: any state ──▶ Anonymous
//! ```
//!
//! Async operations are split into `begin_*`/`finish_*` halves so a UI can
//! hold the store in a reactive cell and only touch it before and after the
//! network call.

use thiserror::Error;

use crate::api::{ApiError, AuthApi, Credentials, UserIdentity, VerifyResponse};
use crate::storage::{KeyValueStore, StoreError};

/// Storage key holding the bearer token
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Storage key holding the serialized [`UserIdentity`]
pub const USER_KEY: &str = "user";

/// An authenticated identity and the credentials that prove it
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: UserIdentity,
    pub credentials: Credentials,
}

/// Where the session lifecycle currently is
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// No token
    Anonymous,
    /// Persisted token found, verification in flight
    Verifying(Credentials),
    /// Token verified or freshly issued
    Authenticated(Session),
    /// Verification failed; persisted data has been cleared
    Invalid { reason: String },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Verifying(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::Verifying(_) => "verifying",
            SessionState::Authenticated(_) => "authenticated",
            SessionState::Invalid { .. } => "invalid",
        }
    }
}

/// Errors from persisting a session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Session lifecycle over a persistent store
#[derive(Debug)]
pub struct SessionStore<S> {
    storage: S,
    state: SessionState,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Create an anonymous store; call [`SessionStore::restore`] to pick up a
    /// persisted session
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            state: SessionState::Anonymous,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn user(&self) -> Option<&UserIdentity> {
        self.state.session().map(|s| &s.user)
    }

    /// Credentials to pass to authenticated backend calls
    pub fn credentials(&self) -> Option<Credentials> {
        self.state.session().map(|s| s.credentials.clone())
    }

    /// Token from storage when both the token and identity entries exist
    pub fn persisted_credentials(&self) -> Option<Credentials> {
        let token = self.read(AUTH_TOKEN_KEY)?;
        self.read(USER_KEY)?;
        Some(Credentials::bearer(token))
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read {} from session storage: {}", key, e);
                None
            }
        }
    }

    /// Start startup verification.
    ///
    /// Returns the credentials to verify, or `None` when nothing is persisted
    /// (the store stays as it is).
    pub fn begin_restore(&mut self) -> Option<Credentials> {
        let credentials = self.persisted_credentials()?;
        tracing::debug!("Persisted session found, verifying");
        self.state = SessionState::Verifying(credentials.clone());
        Some(credentials)
    }

    /// Apply the outcome of startup verification.
    ///
    /// Ignored unless the store is still verifying, so a `login` that happened
    /// meanwhile is never undone by a stale answer.
    pub fn finish_restore(&mut self, outcome: Result<VerifyResponse, ApiError>) -> &SessionState {
        let credentials = match &self.state {
            SessionState::Verifying(credentials) => credentials.clone(),
            other => {
                tracing::debug!("Dropping verification result, session is {}", other.label());
                return &self.state;
            }
        };

        let reason = match outcome {
            Ok(response) => match response.into_verified_user() {
                Some(user) => {
                    tracing::info!("Session verified for {}", user.email);
                    self.state = SessionState::Authenticated(Session { user, credentials });
                    return &self.state;
                }
                None => "verification rejected".to_string(),
            },
            Err(e) => {
                tracing::error!("Session check failed: {}", e);
                e.to_string()
            }
        };

        self.clear_persisted();
        self.state = SessionState::Invalid { reason };
        &self.state
    }

    /// Verify a persisted session against the backend.
    ///
    /// Never fails: rejected or unverifiable sessions end up `Invalid` with
    /// storage cleared.
    pub async fn restore<A: AuthApi + ?Sized>(&mut self, api: &A) -> &SessionState {
        match self.begin_restore() {
            Some(credentials) => {
                let outcome = api.verify(&credentials).await;
                self.finish_restore(outcome)
            }
            None => &self.state,
        }
    }

    /// Persist a freshly issued token and identity and mark the session
    /// authenticated. The backend is not consulted.
    pub fn login(
        &mut self,
        credentials: Credentials,
        user: UserIdentity,
    ) -> Result<(), SessionError> {
        let user_json = serde_json::to_string(&user)?;
        self.storage.set(AUTH_TOKEN_KEY, credentials.token())?;
        self.storage.set(USER_KEY, &user_json)?;

        tracing::info!("Logged in as {}", user.email);
        self.state = SessionState::Authenticated(Session { user, credentials });
        Ok(())
    }

    /// Credentials to send to the logout endpoint, if any are held
    pub fn begin_logout(&self) -> Option<Credentials> {
        self.read(AUTH_TOKEN_KEY)
            .map(Credentials::bearer)
            .or_else(|| self.credentials())
    }

    /// Forget the session locally, whatever the backend said
    pub fn finish_logout(&mut self) {
        self.clear_persisted();
        self.state = SessionState::Anonymous;
        tracing::info!("Logged out");
    }

    /// Best-effort backend logout followed by an unconditional local logout
    pub async fn logout<A: AuthApi + ?Sized>(&mut self, api: &A) {
        if let Some(credentials) = self.begin_logout() {
            if let Err(e) = api.logout(&credentials).await {
                tracing::error!("Logout failed: {}", e);
            }
        }
        self.finish_logout();
    }

    fn clear_persisted(&mut self) {
        for key in [AUTH_TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                tracing::warn!("Failed to remove {} from session storage: {}", key, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::testing::FakeBackend;

    fn ada() -> UserIdentity {
        UserIdentity::new("ada@example.com", "Ada")
    }

    fn persisted_store() -> SessionStore<MemoryStore> {
        let user = serde_json::to_string(&ada()).unwrap();
        SessionStore::new(MemoryStore::with_entries([
            (AUTH_TOKEN_KEY, "stored-token".to_string()),
            (USER_KEY, user),
        ]))
    }

    #[test]
    fn test_login_persists_and_authenticates() {
        let mut store = SessionStore::new(MemoryStore::new());
        assert_eq!(store.state(), &SessionState::Anonymous);

        store.login(Credentials::bearer("t-1"), ada()).unwrap();

        assert!(store.is_authenticated());
        assert_eq!(store.user(), Some(&ada()));
        assert_eq!(store.credentials(), Some(Credentials::bearer("t-1")));
        assert_eq!(
            store.storage().get(AUTH_TOKEN_KEY).unwrap().as_deref(),
            Some("t-1")
        );

        let stored_user: UserIdentity =
            serde_json::from_str(&store.storage().get(USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored_user, ada());
    }

    #[tokio::test]
    async fn test_logout_clears_when_backend_succeeds() {
        let backend = FakeBackend::default();
        let mut store = SessionStore::new(MemoryStore::new());
        store.login(Credentials::bearer("t-1"), ada()).unwrap();

        store.logout(&backend).await;

        assert_eq!(store.state(), &SessionState::Anonymous);
        assert!(store.storage().is_empty());
        assert_eq!(backend.calls(), vec!["logout Bearer t-1"]);
    }

    #[tokio::test]
    async fn test_logout_clears_when_backend_fails() {
        let backend = FakeBackend::default();
        backend.fail_logout(ApiError::Network("connection refused".into()));

        let mut store = SessionStore::new(MemoryStore::new());
        store.login(Credentials::bearer("t-1"), ada()).unwrap();

        store.logout(&backend).await;

        assert!(!store.is_authenticated());
        assert!(store.storage().is_empty());
    }

    #[tokio::test]
    async fn test_logout_without_session_skips_backend() {
        let backend = FakeBackend::default();
        let mut store = SessionStore::new(MemoryStore::new());

        store.logout(&backend).await;

        assert!(backend.calls().is_empty());
        assert_eq!(store.state(), &SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_restore_verified_session() {
        let backend = FakeBackend::default();
        backend.accept_verify(UserIdentity::new("ada@example.com", "Ada Lovelace"));

        let mut store = persisted_store();
        let state = store.restore(&backend).await;

        assert!(state.is_authenticated());
        // Identity comes from the backend, not the stored copy
        assert_eq!(store.user().unwrap().name, "Ada Lovelace");
        assert_eq!(store.credentials(), Some(Credentials::bearer("stored-token")));
        assert_eq!(backend.calls(), vec!["verify Bearer stored-token"]);
    }

    #[tokio::test]
    async fn test_restore_rejected_clears_storage() {
        let backend = FakeBackend::default();
        backend.reject_verify();

        let mut store = persisted_store();
        let state = store.restore(&backend).await;

        assert!(matches!(state, SessionState::Invalid { .. }));
        assert!(!store.is_authenticated());
        assert!(store.storage().is_empty());
    }

    #[tokio::test]
    async fn test_restore_network_failure_clears_storage() {
        let backend = FakeBackend::default();
        backend.fail_verify(ApiError::Status {
            status: 401,
            detail: Some("Token has expired".into()),
        });

        let mut store = persisted_store();
        store.restore(&backend).await;

        match store.state() {
            SessionState::Invalid { reason } => assert!(reason.contains("Token has expired")),
            other => panic!("unexpected state {:?}", other),
        }
        assert!(store.storage().is_empty());
    }

    #[tokio::test]
    async fn test_restore_needs_token_and_user() {
        let backend = FakeBackend::default();
        let mut store = SessionStore::new(MemoryStore::with_entries([(AUTH_TOKEN_KEY, "t")]));

        store.restore(&backend).await;

        assert_eq!(store.state(), &SessionState::Anonymous);
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_verifying_is_loading() {
        let mut store = persisted_store();
        let credentials = store.begin_restore().unwrap();

        assert!(store.is_loading());
        assert!(!store.is_authenticated());
        assert_eq!(credentials.token(), "stored-token");
    }

    #[test]
    fn test_stale_verification_does_not_undo_login() {
        let mut store = persisted_store();
        store.begin_restore().unwrap();
        store.login(Credentials::bearer("fresh"), ada()).unwrap();

        store.finish_restore(Err(ApiError::Timeout));

        assert!(store.is_authenticated());
        assert_eq!(
            store.storage().get(AUTH_TOKEN_KEY).unwrap().as_deref(),
            Some("fresh")
        );
    }
}
