/**
 * Signup Handler
 *
 * `POST /api/auth/signup`
 *
 * # Registration Process
 *
 * 1. Validate username, email and password
 * 2. Hash password using bcrypt
 * 3. Create the user document (409 if username or email is taken)
 * 4. Return a JWT token and the user, with 201
 */

use axum::{extract::State, http::StatusCode, response::Json};

use crate::backend::auth::handlers::types::{
    auth_response, hash_password, validate_password, AuthResponse, SignupRequest,
};
use crate::backend::auth::users::{create_user, get_user_by_email, get_user_by_username};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::server::state::AppState;

/// Validate username format
///
/// Usernames must be 3-30 characters, start with a letter and contain only
/// letters, digits and underscores.
pub(crate) fn is_valid_username(username: &str) -> bool {
    if username.len() < 3 || username.len() > 30 {
        return false;
    }

    let mut chars = username.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Basic shape check: one `@` with something on both sides and a dot in the domain
pub(crate) fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.contains('@') && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}

/// Sign up handler
///
/// # Errors
///
/// * `400 Bad Request` - invalid username, email or password
/// * `409 Conflict` - username or email already registered
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> BackendResult<(StatusCode, Json<AuthResponse>)> {
    tracing::info!("Signup request for username: {}", request.username);

    if !is_valid_username(&request.username) {
        tracing::warn!("Invalid username format: {}", request.username);
        return Err(BackendError::validation(
            "username",
            "Username must be 3-30 chars, start with a letter, and contain only letters, numbers, and underscores",
        ));
    }
    if !is_valid_email(&request.email) {
        tracing::warn!("Invalid email format: {}", request.email);
        return Err(BackendError::validation("email", "Invalid email format"));
    }
    validate_password(&request.password)?;

    // Checked before hashing so duplicates fail fast
    let store = state.store.as_ref();
    if get_user_by_username(store, &request.username).await?.is_some() {
        tracing::warn!("Username already exists: {}", request.username);
        return Err(BackendError::conflict("Username already taken"));
    }
    if get_user_by_email(store, &request.email).await?.is_some() {
        tracing::warn!("Email already exists: {}", request.email);
        return Err(BackendError::conflict("Email already registered"));
    }

    let password_hash = hash_password(request.password).await?;
    let user = create_user(store, request.username, request.email, Some(password_hash)).await?;

    let response = auth_response(state.jwt_secret(), &user)?;
    tracing::info!("User created successfully: {} ({})", user.username, user.id);
    Ok((StatusCode::CREATED, Json(response)))
}
