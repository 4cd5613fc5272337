//! HTTP API Client
//!
//! `gloo-net` implementation of the DrawCal backend traits.

use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;

use drawcal::api::{
    endpoint_url, endpoints, normalize_base_url, ApiError, AuthApi, CalculationRequest,
    CalculatorApi, Credentials, HistoryRecord, LoginRequest, LoginResponse, ProfileApi,
    UserProfile, VerifyResponse, DEFAULT_API_BASE,
};

/// Local storage key that overrides the backend URL
const API_URL_KEY: &str = "drawcal_api_url";

/// Backend base URL: local storage override, then the build-time
/// `DRAWCAL_API_URL`, then the default
pub fn get_api_base() -> String {
    let stored = web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .and_then(|storage| storage.get_item(API_URL_KEY).ok().flatten())
        .filter(|url| !url.trim().is_empty());

    let url = stored
        .or_else(|| option_env!("DRAWCAL_API_URL").map(str::to_string))
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

    normalize_base_url(&url)
}

/// DrawCal REST client for the browser
#[derive(Debug, Clone)]
pub struct WebBackend {
    base_url: String,
}

impl WebBackend {
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.as_ref()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        endpoint_url(&self.base_url, path)
    }

    /// Send a request, turning non-2xx answers into [`ApiError::Status`]
    async fn send(&self, request: Request) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(map_transport)?;

        if response.ok() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(response.status(), &body))
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<T, ApiError> {
        let request = Request::get(&self.url(path))
            .header("Authorization", &credentials.authorization())
            .build()
            .map_err(map_transport)?;

        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn map_transport(e: gloo_net::Error) -> ApiError {
    match e {
        gloo_net::Error::SerdeError(e) => ApiError::Decode(e.to_string()),
        other => ApiError::Network(other.to_string()),
    }
}

#[async_trait(?Send)]
impl AuthApi for WebBackend {
    async fn verify(&self, credentials: &Credentials) -> Result<VerifyResponse, ApiError> {
        self.get_json(endpoints::VERIFY, credentials).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let request = Request::post(&self.url(endpoints::LOGIN))
            .json(request)
            .map_err(map_transport)?;

        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn logout(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let request = Request::post(&self.url(endpoints::LOGOUT))
            .header("Authorization", &credentials.authorization())
            .build()
            .map_err(map_transport)?;

        self.send(request).await.map(|_| ())
    }
}

#[async_trait(?Send)]
impl CalculatorApi for WebBackend {
    async fn process(
        &self,
        credentials: &Credentials,
        request: &CalculationRequest,
    ) -> Result<serde_json::Value, ApiError> {
        let request = Request::post(&self.url(endpoints::PROCESS))
            .header("Authorization", &credentials.authorization())
            .json(request)
            .map_err(map_transport)?;

        let text = self
            .send(request)
            .await?
            .text()
            .await
            .map_err(map_transport)?;

        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    }
}

#[async_trait(?Send)]
impl ProfileApi for WebBackend {
    async fn profile(&self, credentials: &Credentials) -> Result<UserProfile, ApiError> {
        self.get_json(endpoints::PROFILE, credentials).await
    }

    async fn history(&self, credentials: &Credentials) -> Result<Vec<HistoryRecord>, ApiError> {
        self.get_json(endpoints::HISTORY, credentials).await
    }
}
