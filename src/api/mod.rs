//! Backend API
//!
//! Wire types and the traits every backend adapter implements. Credentials
//! are handed to each authenticated call explicitly; no adapter keeps a
//! shared authorization header.
//!
//! ## Adapters
//!
//! - [`HttpBackend`]: native `reqwest` client (feature `native`)
//! - the browser build implements the same traits over `gloo-net`

mod dto;
#[cfg(feature = "native")]
mod http;

pub use dto::{
    CalculationRequest, HistoryRecord, LoginRequest, LoginResponse, UserIdentity, UserProfile,
    VerifyResponse,
};
#[cfg(feature = "native")]
pub use http::HttpBackend;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Backend used when nothing else is configured
pub const DEFAULT_API_BASE: &str = "http://localhost:8900";

/// Environment variable selecting the backend base URL
pub const API_URL_ENV: &str = "DRAWCAL_API_URL";

/// Endpoint paths relative to the base URL
pub mod endpoints {
    pub const VERIFY: &str = "/auth/verify";
    pub const LOGIN: &str = "/auth/login";
    pub const LOGOUT: &str = "/auth/logout";
    pub const GOOGLE_LOGIN: &str = "/auth/google/login";
    pub const PROFILE: &str = "/auth/user/profile";
    pub const HISTORY: &str = "/review-expressions";
    pub const PROCESS: &str = "/calculator/process";
}

/// Trim whitespace and trailing slashes from a base URL
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Join a normalized base URL with an endpoint path
pub fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}{}", normalize_base_url(base), path)
}

/// Bearer credentials for authenticated calls
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value for the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Transport-level failures shared by all adapters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("API error {status}: {}", detail.as_deref().unwrap_or("no details"))]
    Status { status: u16, detail: Option<String> },

    #[error("Parse error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Build a status error, pulling `detail` out of a JSON error body
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").cloned())
            .map(|d| match d {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .or_else(|| {
                let text = body.trim();
                (!text.is_empty()).then(|| text.to_string())
            });

        ApiError::Status { status, detail }
    }

    /// Server answered (as opposed to the request never arriving)
    pub fn is_rejection(&self) -> bool {
        matches!(self, ApiError::Status { .. })
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// Authentication endpoints
#[async_trait(?Send)]
pub trait AuthApi {
    /// `GET /auth/verify`
    async fn verify(&self, credentials: &Credentials) -> Result<VerifyResponse, ApiError>;

    /// `POST /auth/login`
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;

    /// `POST /auth/logout`
    async fn logout(&self, credentials: &Credentials) -> Result<(), ApiError>;
}

/// Calculation endpoint
///
/// The body is handed back undecoded; shape checking belongs to
/// [`crate::calculator`], which turns bad envelopes into error results.
#[async_trait(?Send)]
pub trait CalculatorApi {
    /// `POST /calculator/process`
    async fn process(
        &self,
        credentials: &Credentials,
        request: &CalculationRequest,
    ) -> Result<serde_json::Value, ApiError>;
}

/// Profile and history endpoints
#[async_trait(?Send)]
pub trait ProfileApi {
    /// `GET /auth/user/profile`
    async fn profile(&self, credentials: &Credentials) -> Result<UserProfile, ApiError>;

    /// `GET /review-expressions`
    async fn history(&self, credentials: &Credentials) -> Result<Vec<HistoryRecord>, ApiError>;
}
