/**
 * Authentication Handler Types
 *
 * Request and response bodies for the `/api/auth` endpoints.
 */

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::auth::sessions::create_token;
use crate::backend::error::{BackendError, BackendResult};
use crate::shared::model::User;

/// Sign up request
#[derive(Deserialize, Serialize, Debug)]
pub struct SignupRequest {
    /// 3-30 chars, letters/digits/underscore, starts with a letter
    pub username: String,
    pub email: String,
    /// At least 8 characters
    pub password: String,
}

/// Login request
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    /// Username or email
    pub username: String,
    pub password: String,
}

/// Google sign-in request
#[derive(Deserialize, Serialize, Debug)]
pub struct GoogleLoginRequest {
    /// ID token issued to the browser by Google
    pub credential: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// Body of `PATCH /api/auth/me`
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct UpdateProfileRequest {
    /// Slack member id; empty string clears it
    #[serde(default)]
    pub slack_user_id: Option<String>,
}

/// Returned by signup, login and Google sign-in
#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    /// JWT token (30-day expiration)
    pub token: String,
    pub user: UserResponse,
}

/// User information safe to return to clients
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub slack_user_id: Option<String>,
    pub google_linked: bool,
    pub unread_notifications: usize,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            slack_user_id: user.slack_user_id.clone(),
            google_linked: user.google_id.is_some(),
            unread_notifications: user.unread_count(),
        }
    }
}

/// Plain acknowledgement
#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Sign a session token for `user` and build the response body
pub fn auth_response(secret: &str, user: &User) -> BackendResult<AuthResponse> {
    let token = create_token(secret, user.id, user.email.clone(), Some(user.username.clone())).map_err(|e| {
        tracing::error!("Failed to create token: {:?}", e);
        BackendError::handler(axum::http::StatusCode::INTERNAL_SERVER_ERROR, "Server error")
    })?;
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

/// Hash a password with bcrypt on the blocking pool
pub async fn hash_password(password: String) -> BackendResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {:?}", e);
            BackendError::handler(axum::http::StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        })?
        .map_err(|e| {
            tracing::error!("Failed to hash password: {:?}", e);
            BackendError::handler(axum::http::StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        })
}

/// Check a password against a bcrypt hash on the blocking pool
pub async fn verify_password(password: String, hash: String) -> bool {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await
        .unwrap_or(false)
}

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn validate_password(password: &str) -> BackendResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        tracing::warn!("Password too short");
        return Err(BackendError::validation(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
    Ok(())
}
