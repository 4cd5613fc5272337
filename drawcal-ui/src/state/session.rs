//! Session Context
//!
//! The shared [`SessionStore`] lives in a signal so every component can react
//! to sign-in and sign-out. Network calls run between `begin_*` and
//! `finish_*` so the signal is never borrowed across an await.

use leptos::*;

use drawcal::api::{AuthApi, Credentials, UserIdentity};
use drawcal::session::{SessionError, SessionStore};

use super::storage::LocalStorage;
use crate::api::{get_api_base, WebBackend};

/// Session state and backend handle provided to all components
#[derive(Clone)]
pub struct SessionContext {
    pub store: RwSignal<SessionStore<LocalStorage>>,
    pub backend: WebBackend,
}

impl SessionContext {
    pub fn is_authenticated(&self) -> bool {
        self.store.with(|s| s.is_authenticated())
    }

    pub fn is_loading(&self) -> bool {
        self.store.with(|s| s.is_loading())
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.store.with(|s| s.user().cloned())
    }

    /// Credentials for a backend call, read without subscribing
    pub fn credentials(&self) -> Option<Credentials> {
        self.store.with_untracked(|s| s.credentials())
    }

    pub fn login(&self, credentials: Credentials, user: UserIdentity) -> Result<(), SessionError> {
        let mut outcome = Ok(());
        self.store.update(|s| outcome = s.login(credentials, user));
        outcome
    }

    pub async fn logout(&self) {
        let credentials = self.store.with_untracked(|s| s.begin_logout());

        if let Some(credentials) = credentials {
            if let Err(e) = self.backend.logout(&credentials).await {
                web_sys::console::error_1(&format!("Logout failed: {}", e).into());
            }
        }

        self.store.update(|s| s.finish_logout());
    }
}

/// Provide the session to the component tree and start verifying any
/// persisted session
pub fn provide_session() {
    let session = SessionContext {
        store: create_rw_signal(SessionStore::new(LocalStorage::new())),
        backend: WebBackend::new(get_api_base()),
    };

    let pending = session.store.try_update(|s| s.begin_restore()).flatten();
    if let Some(credentials) = pending {
        let session = session.clone();
        spawn_local(async move {
            let outcome = session.backend.verify(&credentials).await;
            if let Err(e) = &outcome {
                web_sys::console::error_1(&format!("Session check failed: {}", e).into());
            }
            session.store.update(|s| {
                s.finish_restore(outcome);
            });
        });
    }

    provide_context(session);
}

pub fn use_session() -> SessionContext {
    expect_context::<SessionContext>()
}
