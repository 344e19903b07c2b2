/**
 * Current User Handlers
 *
 * `GET /api/auth/me` returns the authenticated user; `PATCH /api/auth/me`
 * sets the Slack member id used for chat notifications. Both sit behind
 * the auth middleware.
 */

use axum::{extract::State, response::Json};

use crate::backend::auth::handlers::types::{UpdateProfileRequest, UserResponse};
use crate::backend::auth::users::{get_user_by_id, save_user};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::model::User;

async fn load_current(state: &AppState, auth: &crate::backend::middleware::AuthenticatedUser) -> BackendResult<User> {
    get_user_by_id(state.store.as_ref(), auth.user_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Authenticated user {} disappeared", auth.user_id);
            BackendError::unauthorized("User no longer exists")
        })
}

/// Get current user handler
pub async fn get_me(State(state): State<AppState>, AuthUser(auth): AuthUser) -> BackendResult<Json<UserResponse>> {
    let user = load_current(&state, &auth).await?;
    Ok(Json((&user).into()))
}

/// Update the caller's profile
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> BackendResult<Json<UserResponse>> {
    let mut user = load_current(&state, &auth).await?;
    if let Some(slack_id) = request.slack_user_id {
        let slack_id = slack_id.trim();
        user.slack_user_id = (!slack_id.is_empty()).then(|| slack_id.to_string());
    }
    save_user(state.store.as_ref(), &mut user).await?;
    tracing::info!("Profile updated for {}", user.id);
    Ok(Json((&user).into()))
}
