/**
 * Google Sign-In Handler
 *
 * `POST /api/auth/google` with `{credential}`.
 *
 * The credential is verified through the configured `IdentityVerifier`.
 * The matching account is found by Google id, then by email (linking the
 * Google id to it); otherwise a password-less account is created.
 */

use axum::{extract::State, http::StatusCode, response::Json};

use crate::backend::auth::handlers::types::{auth_response, AuthResponse, GoogleLoginRequest};
use crate::backend::auth::oauth::{IdentityError, VerifiedIdentity};
use crate::backend::auth::users::{create_user, get_user_by_email, get_user_by_google_id, get_user_by_username, save_user};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::server::state::AppState;
use crate::backend::store::DocumentStore;
use crate::shared::model::User;

impl From<IdentityError> for BackendError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotConfigured => {
                BackendError::handler(StatusCode::SERVICE_UNAVAILABLE, "Google sign-in is not configured")
            }
            IdentityError::Invalid(reason) => {
                tracing::warn!("Rejected Google credential: {}", reason);
                BackendError::unauthorized("Invalid Google credential")
            }
            IdentityError::Provider(e) => {
                tracing::error!("Google tokeninfo request failed: {:?}", e);
                BackendError::handler(StatusCode::SERVICE_UNAVAILABLE, "Identity provider unavailable")
            }
        }
    }
}

/// Derive a free, valid username from the identity's email
async fn unique_username(store: &dyn DocumentStore, identity: &VerifiedIdentity) -> BackendResult<String> {
    let local = identity.email.split('@').next().unwrap_or_default();
    let mut base: String = local
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(24)
        .collect();
    if !base.chars().next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false) {
        base = format!("user{}", base);
    }
    while base.len() < 3 {
        base.push('_');
    }

    if get_user_by_username(store, &base).await?.is_none() {
        return Ok(base);
    }
    for n in 1..1000 {
        let candidate = format!("{}{}", base, n);
        if get_user_by_username(store, &candidate).await?.is_none() {
            return Ok(candidate);
        }
    }
    Err(BackendError::conflict("Could not allocate a username"))
}

async fn find_or_create(store: &dyn DocumentStore, identity: VerifiedIdentity) -> BackendResult<User> {
    if let Some(user) = get_user_by_google_id(store, &identity.subject).await? {
        return Ok(user);
    }
    if let Some(mut user) = get_user_by_email(store, &identity.email).await? {
        tracing::info!("Linking Google account to existing user {}", user.id);
        user.google_id = Some(identity.subject);
        save_user(store, &mut user).await?;
        return Ok(user);
    }

    let username = unique_username(store, &identity).await?;
    let mut user = create_user(store, username, identity.email, None).await?;
    user.google_id = Some(identity.subject);
    save_user(store, &mut user).await?;
    Ok(user)
}

/// Google sign-in handler
///
/// # Errors
///
/// * `401 Unauthorized` - credential rejected
/// * `503 Service Unavailable` - not configured, or Google unreachable
pub async fn google_login(
    State(state): State<AppState>,
    Json(request): Json<GoogleLoginRequest>,
) -> BackendResult<Json<AuthResponse>> {
    let identity = state.identity.verify(&request.credential).await?;
    let user = find_or_create(state.store.as_ref(), identity).await?;

    let response = auth_response(state.jwt_secret(), &user)?;
    tracing::info!("Google sign-in for {} ({})", user.username, user.id);
    Ok(Json(response))
}
