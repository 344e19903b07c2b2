/**
 * Login Handler
 *
 * `POST /api/auth/login`
 *
 * # Authentication Process
 *
 * 1. Look up user by username, falling back to email
 * 2. Verify password using bcrypt
 * 3. Return a JWT token and the user
 *
 * # Security
 *
 * - Unknown user, wrong password and password-less (Google-only) accounts
 *   all return the same 401, so the endpoint cannot be used to discover
 *   registered accounts.
 */

use axum::{extract::State, response::Json};

use crate::backend::auth::handlers::types::{auth_response, verify_password, AuthResponse, LoginRequest};
use crate::backend::auth::users::get_user_by_login;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::server::state::AppState;

fn invalid_credentials() -> BackendError {
    BackendError::unauthorized("Invalid username or password")
}

/// Login handler
///
/// # Errors
///
/// * `401 Unauthorized` - user not found or password incorrect
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> BackendResult<Json<AuthResponse>> {
    tracing::info!("Login request for: {}", request.username);

    let user = get_user_by_login(state.store.as_ref(), request.username.trim())
        .await?
        .ok_or_else(|| {
            tracing::warn!("User not found: {}", request.username);
            invalid_credentials()
        })?;

    let Some(hash) = user.password_hash.clone() else {
        tracing::warn!("Password login for account without password: {}", user.id);
        return Err(invalid_credentials());
    };

    if !verify_password(request.password, hash).await {
        tracing::warn!("Invalid password for user: {}", request.username);
        return Err(invalid_credentials());
    }

    let response = auth_response(state.jwt_secret(), &user)?;
    tracing::info!("User logged in successfully: {} ({})", user.username, user.id);
    Ok(Json(response))
}
