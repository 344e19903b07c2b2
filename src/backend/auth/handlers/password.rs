/**
 * Password Reset Handlers
 *
 * - `POST /api/auth/forgot-password` {email} - always 200. When the account
 *   exists a random token is emailed and its SHA-256 hash stored with a
 *   one hour expiry.
 * - `POST /api/auth/reset-password` {token, password} - 400 when the token
 *   is unknown or expired, or the password is too short.
 */

use axum::{extract::State, response::Json};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::backend::auth::handlers::types::{
    hash_password, validate_password, ForgotPasswordRequest, MessageResponse, ResetPasswordRequest,
};
use crate::backend::auth::users::{find_by_reset_token, get_user_by_email, set_password, set_reset_token};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::server::state::AppState;

pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

const FORGOT_RESPONSE: &str = "If that email is registered, a reset link has been sent";

/// Hex SHA-256 of a reset token
pub fn hash_reset_token(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn new_reset_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> BackendResult<Json<MessageResponse>> {
    let store = state.store.as_ref();
    let Some(user) = get_user_by_email(store, &request.email).await? else {
        tracing::info!("Password reset requested for unknown email");
        return Ok(Json(MessageResponse::new(FORGOT_RESPONSE)));
    };

    let token = new_reset_token();
    let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
    let user = set_reset_token(store, user, hash_reset_token(&token), expires_at).await?;

    let link = state.config.link(&format!("/reset-password?token={}", token));
    let body = format!(
        "Hi {},\n\nSomeone asked to reset your WorkHub password. The link below is valid for one hour:\n\n{}\n\nIf this wasn't you, ignore this email.",
        user.username, link
    );
    if let Err(e) = state
        .notifier
        .mailer()
        .send(&user.email, "Reset your WorkHub password", &body)
        .await
    {
        tracing::warn!("Failed to send reset email to {}: {}", user.id, e);
    }

    tracing::info!("Password reset issued for {}", user.id);
    Ok(Json(MessageResponse::new(FORGOT_RESPONSE)))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> BackendResult<Json<MessageResponse>> {
    validate_password(&request.password)?;

    let store = state.store.as_ref();
    let user = find_by_reset_token(store, &hash_reset_token(request.token.trim()), Utc::now())
        .await?
        .ok_or_else(|| {
            tracing::warn!("Invalid or expired reset token");
            BackendError::validation("token", "Invalid or expired reset token")
        })?;

    let password_hash = hash_password(request.password).await?;
    let user = set_password(store, user, password_hash).await?;

    tracing::info!("Password reset completed for {}", user.id);
    Ok(Json(MessageResponse::new("Password updated")))
}
