//! Scripted backend for unit tests

use async_trait::async_trait;
use std::cell::RefCell;

use crate::api::{
    ApiError, AuthApi, CalculationRequest, CalculatorApi, Credentials, HistoryRecord,
    LoginRequest, LoginResponse, ProfileApi, UserIdentity, UserProfile, VerifyResponse,
};

/// Backend whose answers are set up front; records every call it receives
pub struct FakeBackend {
    verify: RefCell<Result<VerifyResponse, ApiError>>,
    login: RefCell<Result<LoginResponse, ApiError>>,
    logout: RefCell<Result<(), ApiError>>,
    process: RefCell<Result<serde_json::Value, ApiError>>,
    profile: RefCell<Result<UserProfile, ApiError>>,
    history: RefCell<Result<Vec<HistoryRecord>, ApiError>>,
    requests: RefCell<Vec<CalculationRequest>>,
    calls: RefCell<Vec<String>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            verify: RefCell::new(Ok(VerifyResponse {
                success: false,
                user: None,
            })),
            login: RefCell::new(Err(ApiError::Status {
                status: 401,
                detail: None,
            })),
            logout: RefCell::new(Ok(())),
            process: RefCell::new(Ok(serde_json::json!({"type": "success", "data": []}))),
            profile: RefCell::new(Ok(UserProfile::default())),
            history: RefCell::new(Ok(Vec::new())),
            requests: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl FakeBackend {
    pub fn accept_verify(&self, user: UserIdentity) {
        *self.verify.borrow_mut() = Ok(VerifyResponse {
            success: true,
            user: Some(user),
        });
    }

    pub fn reject_verify(&self) {
        *self.verify.borrow_mut() = Ok(VerifyResponse {
            success: false,
            user: None,
        });
    }

    pub fn fail_verify(&self, err: ApiError) {
        *self.verify.borrow_mut() = Err(err);
    }

    pub fn answer_login(&self, outcome: Result<LoginResponse, ApiError>) {
        *self.login.borrow_mut() = outcome;
    }

    pub fn fail_logout(&self, err: ApiError) {
        *self.logout.borrow_mut() = Err(err);
    }

    pub fn answer_process(&self, outcome: Result<serde_json::Value, ApiError>) {
        *self.process.borrow_mut() = outcome;
    }

    pub fn answer_profile(&self, outcome: Result<UserProfile, ApiError>) {
        *self.profile.borrow_mut() = outcome;
    }

    pub fn answer_history(&self, outcome: Result<Vec<HistoryRecord>, ApiError>) {
        *self.history.borrow_mut() = outcome;
    }

    /// Calls received so far, as `"<endpoint> <authorization>"`
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Bodies received by the calculation endpoint
    pub fn requests(&self) -> Vec<CalculationRequest> {
        self.requests.borrow().clone()
    }

    fn record(&self, endpoint: &str, credentials: &Credentials) {
        self.calls
            .borrow_mut()
            .push(format!("{} {}", endpoint, credentials.authorization()));
    }
}

#[async_trait(?Send)]
impl AuthApi for FakeBackend {
    async fn verify(&self, credentials: &Credentials) -> Result<VerifyResponse, ApiError> {
        self.record("verify", credentials);
        self.verify.borrow().clone()
    }

    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.calls
            .borrow_mut()
            .push(format!("login {}", request.username));
        self.login.borrow().clone()
    }

    async fn logout(&self, credentials: &Credentials) -> Result<(), ApiError> {
        self.record("logout", credentials);
        self.logout.borrow().clone()
    }
}

#[async_trait(?Send)]
impl CalculatorApi for FakeBackend {
    async fn process(
        &self,
        credentials: &Credentials,
        request: &CalculationRequest,
    ) -> Result<serde_json::Value, ApiError> {
        self.record("process", credentials);
        self.requests.borrow_mut().push(request.clone());
        self.process.borrow().clone()
    }
}

#[async_trait(?Send)]
impl ProfileApi for FakeBackend {
    async fn profile(&self, credentials: &Credentials) -> Result<UserProfile, ApiError> {
        self.record("profile", credentials);
        self.profile.borrow().clone()
    }

    async fn history(&self, credentials: &Credentials) -> Result<Vec<HistoryRecord>, ApiError> {
        self.record("history", credentials);
        self.history.borrow().clone()
    }
}
