//! Native HTTP backend
//!
//! `reqwest` implementation of the backend traits.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{
    endpoint_url, endpoints, normalize_base_url, ApiError, AuthApi, CalculationRequest,
    CalculatorApi, Credentials, HistoryRecord, LoginRequest, LoginResponse, ProfileApi,
    UserProfile, VerifyResponse,
};
use crate::config::ApiConfig;

/// DrawCal REST client
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// Create a client for the configured backend
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(&config.base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        endpoint_url(&self.base_url, path)
    }

    /// Send a request, turning non-2xx answers into [`ApiError::Status`]
    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(map_transport)?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Backend answered {}: {}", status, body);
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<T, ApiError> {
        let request = self
            .client
            .get(self.url(path))
            .header(reqwest::header::AUTHORIZATION, credentials.authorization());

        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn map_transport(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else if e.is_decode() {
        ApiError::Decode(e.to_string())
    } else {
        ApiError::Network(e.to_string())
    }
}

#[async_trait(?Send)]
impl AuthApi for HttpBackend {
    async fn verify(&self, credentials: &Credentials) -> Result<VerifyResponse, ApiError> {
        self.get_json(endpoints::VERIFY, credentials).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let builder = self.client.post(self.url(endpoints::LOGIN)).json(request);

        self.send(builder)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn logout(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let builder = self
            .client
            .post(self.url(endpoints::LOGOUT))
            .header(reqwest::header::AUTHORIZATION, credentials.authorization());

        self.send(builder).await.map(|_| ())
    }
}

#[async_trait(?Send)]
impl CalculatorApi for HttpBackend {
    async fn process(
        &self,
        credentials: &Credentials,
        request: &CalculationRequest,
    ) -> Result<serde_json::Value, ApiError> {
        let builder = self
            .client
            .post(self.url(endpoints::PROCESS))
            .header(reqwest::header::AUTHORIZATION, credentials.authorization())
            .json(request);

        let text = self
            .send(builder)
            .await?
            .text()
            .await
            .map_err(map_transport)?;

        // Non-JSON bodies are passed on as strings and rejected as malformed later
        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    }
}

#[async_trait(?Send)]
impl ProfileApi for HttpBackend {
    async fn profile(&self, credentials: &Credentials) -> Result<UserProfile, ApiError> {
        self.get_json(endpoints::PROFILE, credentials).await
    }

    async fn history(&self, credentials: &Credentials) -> Result<Vec<HistoryRecord>, ApiError> {
        self.get_json(endpoints::HISTORY, credentials).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let config = ApiConfig {
            base_url: "http://localhost:8900/".to_string(),
            request_timeout_secs: 5,
        };
        let backend = HttpBackend::new(&config).unwrap();

        assert_eq!(backend.base_url(), "http://localhost:8900");
        assert_eq!(
            backend.url(endpoints::PROCESS),
            "http://localhost:8900/calculator/process"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // Port 9 (discard) on localhost is closed on any sane test machine
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
        };
        let backend = HttpBackend::new(&config).unwrap();

        let err = backend
            .verify(&Credentials::bearer("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(_) | ApiError::Timeout));
    }
}
