//! Data Transfer Objects
//!
//! Request and response bodies exchanged with the DrawCal backend.

use serde::{Deserialize, Serialize};

use crate::calculator::VariableBindings;

/// Identity of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// `/auth/login` sends this as `username`
    #[serde(alias = "username")]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "user".to_string()
}

impl UserIdentity {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            role: default_role(),
        }
    }
}

/// `GET /auth/verify`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub user: Option<UserIdentity>,
}

impl VerifyResponse {
    /// The verified identity, if the backend accepted the token
    pub fn into_verified_user(self) -> Option<UserIdentity> {
        if self.success {
            self.user
        } else {
            None
        }
    }
}

/// `POST /auth/login` body
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /auth/login` response
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserIdentity>,
}

/// `GET /auth/user/profile`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
}

/// One past calculation from `GET /review-expressions`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: String,
    pub expression: String,
    pub timestamp: String,
    pub result: String,
}

/// `POST /calculator/process` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationRequest {
    /// Canvas snapshot as a `data:image/...;base64,` URL
    pub image: String,
    /// Variables bound by earlier assignment results
    pub dict_of_vars: VariableBindings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_user_uses_username() {
        let json = r#"{
            "success": true,
            "token": "jwt",
            "user": {"username": "ada@example.com", "name": "Ada", "role": "admin"}
        }"#;

        let response: LoginResponse = serde_json::from_str(json).unwrap();
        let user = response.user.unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, "admin");
    }

    #[test]
    fn test_verify_rejected() {
        let response: VerifyResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(response.into_verified_user().is_none());

        let response: VerifyResponse = serde_json::from_str(
            r#"{"success": true, "user": {"email": "ada@example.com", "name": "Ada"}}"#,
        )
        .unwrap();
        let user = response.into_verified_user().unwrap();
        assert_eq!(user.role, "user");
    }

    #[test]
    fn test_profile_created_at() {
        let profile: UserProfile = serde_json::from_str(
            r#"{"email": "ada@example.com", "name": "Ada", "role": "user", "createdAt": "2024-03-05T14:07:00"}"#,
        )
        .unwrap();
        assert_eq!(profile.created_at.as_deref(), Some("2024-03-05T14:07:00"));

        let profile: UserProfile = serde_json::from_str(r#"{"createdAt": null}"#).unwrap();
        assert!(profile.created_at.is_none());
    }

    #[test]
    fn test_calculation_request_shape() {
        let mut vars = VariableBindings::default();
        vars.insert("x", "5");

        let request = CalculationRequest {
            image: "data:image/png;base64,AAAA".to_string(),
            dict_of_vars: vars,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["image"], "data:image/png;base64,AAAA");
        assert_eq!(json["dict_of_vars"]["x"], "5");
    }
}
