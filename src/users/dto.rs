use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::User;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Response returned after a successful login or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Request body for a password change. Both fields are required; the
/// reset code must match the outstanding one issued out of band.
#[derive(Debug, Deserialize)]
pub struct UpdatePasswordRequest {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_reset: Option<String>,
}

/// Request body for a follow-set mutation. `state: true` follows,
/// `state: false` unfollows; both are idempotent.
#[derive(Debug, Deserialize)]
pub struct UpdateFollowingRequest {
    #[serde(default)]
    pub following: Option<Uuid>,
    #[serde(default)]
    pub state: Option<bool>,
}
