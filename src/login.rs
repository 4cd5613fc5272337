//! Login flow
//!
//! Exchanges an OAuth callback token or a username/password pair for a
//! session. The network half ([`verify_token`], [`authenticate_password`])
//! is separate from the store update so callers holding the store in a
//! reactive cell do not keep it borrowed across the request.

use thiserror::Error;

use crate::api::{endpoints, endpoint_url, ApiError, AuthApi, Credentials, LoginRequest, UserIdentity};
use crate::session::{SessionError, SessionStore};
use crate::storage::KeyValueStore;

/// Message shown for a rejected password login without a server `detail`
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password";

/// User-facing login failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoginError {
    #[error("Failed to verify login token. Please try again.")]
    TokenRejected,

    #[error("{0}")]
    Rejected(String),

    #[error("Unable to connect to the server. Please check your internet connection.")]
    Unreachable,

    #[error("An unexpected error occurred. Please try again.")]
    Unexpected,

    #[error("Could not save session: {0}")]
    Persist(String),
}

impl From<SessionError> for LoginError {
    fn from(e: SessionError) -> Self {
        LoginError::Persist(e.to_string())
    }
}

impl LoginError {
    /// Classify a failed password login
    fn from_api(err: &ApiError) -> Self {
        match err {
            ApiError::Status { detail, .. } => LoginError::Rejected(
                detail
                    .clone()
                    .unwrap_or_else(|| INVALID_CREDENTIALS_MESSAGE.to_string()),
            ),
            ApiError::Network(_) | ApiError::Timeout => LoginError::Unreachable,
            ApiError::Decode(_) => LoginError::Unexpected,
        }
    }
}

/// Where the browser goes to start Google sign-in
pub fn google_login_url(base_url: &str) -> String {
    endpoint_url(base_url, endpoints::GOOGLE_LOGIN)
}

/// Pull a non-empty `token` out of a URL query string (with or without the
/// leading `?`)
pub fn token_from_query(query: &str) -> Option<String> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "token")
        .and_then(|(_, value)| {
            let value = value.replace('+', " ");
            urlencoding::decode(&value).ok().map(|v| v.into_owned())
        })
        .filter(|token| !token.is_empty())
}

/// Check a callback token with the backend
pub async fn verify_token<A: AuthApi + ?Sized>(
    api: &A,
    token: &str,
) -> Result<(Credentials, UserIdentity), LoginError> {
    let credentials = Credentials::bearer(token);

    match api.verify(&credentials).await {
        Ok(response) => match response.into_verified_user() {
            Some(user) => Ok((credentials, user)),
            None => {
                tracing::warn!("Login token was not accepted");
                Err(LoginError::TokenRejected)
            }
        },
        Err(e) => {
            tracing::error!("Token verification error: {}", e);
            Err(LoginError::TokenRejected)
        }
    }
}

/// Verify a callback token and sign in with it
pub async fn complete_token_login<S, A>(
    store: &mut SessionStore<S>,
    api: &A,
    token: &str,
) -> Result<(), LoginError>
where
    S: KeyValueStore,
    A: AuthApi + ?Sized,
{
    let (credentials, user) = verify_token(api, token).await?;
    store.login(credentials, user)?;
    Ok(())
}

/// Exchange a username and password for a token
pub async fn authenticate_password<A: AuthApi + ?Sized>(
    api: &A,
    username: &str,
    password: &str,
) -> Result<(Credentials, UserIdentity), LoginError> {
    let request = LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    };

    let response = api.login(&request).await.map_err(|e| {
        tracing::error!("Login error: {}", e);
        LoginError::from_api(&e)
    })?;

    if !response.success {
        return Err(LoginError::Rejected(INVALID_CREDENTIALS_MESSAGE.to_string()));
    }

    match (response.token, response.user) {
        (Some(token), Some(user)) if !token.is_empty() => Ok((Credentials::bearer(token), user)),
        _ => {
            tracing::error!("Login response is missing the token or user");
            Err(LoginError::Unexpected)
        }
    }
}

/// Sign in with a username and password
pub async fn password_login<S, A>(
    store: &mut SessionStore<S>,
    api: &A,
    username: &str,
    password: &str,
) -> Result<(), LoginError>
where
    S: KeyValueStore,
    A: AuthApi + ?Sized,
{
    let (credentials, user) = authenticate_password(api, username, password).await?;
    store.login(credentials, user)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::LoginResponse;
    use crate::session::AUTH_TOKEN_KEY;
    use crate::storage::MemoryStore;
    use crate::testing::FakeBackend;

    #[test]
    fn test_google_login_url() {
        assert_eq!(
            google_login_url("http://localhost:8900/"),
            "http://localhost:8900/auth/google/login"
        );
    }

    #[test]
    fn test_token_from_query() {
        assert_eq!(token_from_query("?token=abc.def"), Some("abc.def".into()));
        assert_eq!(
            token_from_query("state=x&token=a%2Bb%3D"),
            Some("a+b=".into())
        );
        assert_eq!(token_from_query("?token="), None);
        assert_eq!(token_from_query("?tokens=abc"), None);
        assert_eq!(token_from_query(""), None);
    }

    #[tokio::test]
    async fn test_token_login_success() {
        let backend = FakeBackend::default();
        backend.accept_verify(UserIdentity::new("ada@example.com", "Ada"));
        let mut store = SessionStore::new(MemoryStore::new());

        complete_token_login(&mut store, &backend, "jwt-1").await.unwrap();

        assert!(store.is_authenticated());
        assert_eq!(
            store.storage().get(AUTH_TOKEN_KEY).unwrap().as_deref(),
            Some("jwt-1")
        );
        assert_eq!(backend.calls(), vec!["verify Bearer jwt-1"]);
    }

    #[tokio::test]
    async fn test_token_login_rejected() {
        let backend = FakeBackend::default();
        backend.reject_verify();
        let mut store = SessionStore::new(MemoryStore::new());

        let err = complete_token_login(&mut store, &backend, "jwt-1")
            .await
            .unwrap_err();

        assert_eq!(err, LoginError::TokenRejected);
        assert_eq!(
            err.to_string(),
            "Failed to verify login token. Please try again."
        );
        assert!(!store.is_authenticated());
        assert!(store.storage().is_empty());

        backend.fail_verify(ApiError::Timeout);
        let err = complete_token_login(&mut store, &backend, "jwt-1")
            .await
            .unwrap_err();
        assert_eq!(err, LoginError::TokenRejected);
    }

    #[tokio::test]
    async fn test_password_login_success() {
        let backend = FakeBackend::default();
        backend.answer_login(Ok(LoginResponse {
            success: true,
            token: Some("jwt-2".into()),
            user: Some(UserIdentity::new("ada@example.com", "Ada")),
        }));
        let mut store = SessionStore::new(MemoryStore::new());

        password_login(&mut store, &backend, "ada@example.com", "hunter2")
            .await
            .unwrap();

        assert_eq!(store.credentials(), Some(Credentials::bearer("jwt-2")));
        assert_eq!(backend.calls(), vec!["login ada@example.com"]);
    }

    #[tokio::test]
    async fn test_password_login_error_messages() {
        let backend = FakeBackend::default();
        let mut store = SessionStore::new(MemoryStore::new());

        backend.answer_login(Err(ApiError::Status {
            status: 401,
            detail: Some("Incorrect username or password".into()),
        }));
        let err = password_login(&mut store, &backend, "ada", "x").await.unwrap_err();
        assert_eq!(err.to_string(), "Incorrect username or password");

        backend.answer_login(Err(ApiError::Status {
            status: 500,
            detail: None,
        }));
        let err = password_login(&mut store, &backend, "ada", "x").await.unwrap_err();
        assert_eq!(err.to_string(), INVALID_CREDENTIALS_MESSAGE);

        backend.answer_login(Err(ApiError::Network("dns failure".into())));
        let err = password_login(&mut store, &backend, "ada", "x").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to connect to the server. Please check your internet connection."
        );

        backend.answer_login(Err(ApiError::Decode("expected value".into())));
        let err = password_login(&mut store, &backend, "ada", "x").await.unwrap_err();
        assert_eq!(err, LoginError::Unexpected);

        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_password_login_without_token_is_unexpected() {
        let backend = FakeBackend::default();
        backend.answer_login(Ok(LoginResponse {
            success: true,
            token: None,
            user: Some(UserIdentity::new("ada@example.com", "Ada")),
        }));
        let mut store = SessionStore::new(MemoryStore::new());

        let err = password_login(&mut store, &backend, "ada", "x").await.unwrap_err();
        assert_eq!(err, LoginError::Unexpected);
    }
}
