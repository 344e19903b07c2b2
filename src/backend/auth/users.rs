/**
 * User Storage
 *
 * Users are ordinary documents in the `users` collection. Lookups by email,
 * username and Google id go through `find_by_field`; emails are stored
 * lower-cased so comparisons are case-insensitive.
 */

use chrono::{DateTime, Utc};
use serde_json::{json, Map};
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::store::{
    collections,
    document::{find, insert_doc, load, load_all, save},
    DocumentStore, ElementMatch,
};
use crate::shared::model::{ResetToken, User};

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create a new user
///
/// `password_hash` is `None` for accounts created through Google sign-in.
/// Fails with 409 when the username or email is taken.
pub async fn create_user(
    store: &dyn DocumentStore,
    username: String,
    email: String,
    password_hash: Option<String>,
) -> BackendResult<User> {
    let email = normalize_email(&email);

    if get_user_by_username(store, &username).await?.is_some() {
        return Err(BackendError::conflict("Username already taken"));
    }
    if get_user_by_email(store, &email).await?.is_some() {
        return Err(BackendError::conflict("Email already registered"));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        username,
        email,
        password_hash,
        google_id: None,
        slack_user_id: None,
        reset_token: None,
        notifications: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    insert_doc(store, &user).await?;

    tracing::info!("User {} created ({})", user.username, user.id);
    Ok(user)
}

pub async fn get_user_by_id(store: &dyn DocumentStore, id: Uuid) -> BackendResult<Option<User>> {
    Ok(load(store, collections::USERS, id).await?)
}

pub async fn get_user_by_email(store: &dyn DocumentStore, email: &str) -> BackendResult<Option<User>> {
    let users: Vec<User> = find(store, collections::USERS, "email", json!(normalize_email(email))).await?;
    Ok(users.into_iter().next())
}

pub async fn get_user_by_username(store: &dyn DocumentStore, username: &str) -> BackendResult<Option<User>> {
    let users: Vec<User> = find(store, collections::USERS, "username", json!(username)).await?;
    Ok(users.into_iter().next())
}

/// Look a user up by username, falling back to email
pub async fn get_user_by_login(store: &dyn DocumentStore, login: &str) -> BackendResult<Option<User>> {
    if let Some(user) = get_user_by_username(store, login).await? {
        return Ok(Some(user));
    }
    if login.contains('@') {
        return get_user_by_email(store, login).await;
    }
    Ok(None)
}

pub async fn get_user_by_google_id(store: &dyn DocumentStore, google_id: &str) -> BackendResult<Option<User>> {
    let users: Vec<User> = find(store, collections::USERS, "google_id", json!(google_id)).await?;
    Ok(users.into_iter().next())
}

/// Persist a modified user document
///
/// The inbox is not written from `user`; afterwards `user` holds the stored
/// document, including notifications delivered in the meantime.
pub async fn save_user(store: &dyn DocumentStore, user: &mut User) -> BackendResult<()> {
    let id = user.id;
    user.updated_at = Utc::now();
    *user = save(store, &*user)
        .await?
        .ok_or_else(|| BackendError::not_found("user", id))?;
    Ok(())
}

/// Mark one notification, or with `None` every notification, as read
pub async fn mark_notifications_read(
    store: &dyn DocumentStore,
    user_id: Uuid,
    notification_id: Option<Uuid>,
) -> BackendResult<User> {
    let key = notification_id.map(|id| json!(id));
    let matching = key.as_ref().map(|key| ElementMatch::new("id", key));
    let mut patch = Map::new();
    patch.insert("read".into(), json!(true));

    let body = store
        .patch_elements(collections::USERS, user_id, "notifications", matching, patch)
        .await?
        .ok_or_else(|| BackendError::not_found("user", user_id))?;
    Ok(serde_json::from_value(body)?)
}

/// Store a pending password reset (hash only)
pub async fn set_reset_token(
    store: &dyn DocumentStore,
    mut user: User,
    token_hash: String,
    expires_at: DateTime<Utc>,
) -> BackendResult<User> {
    user.reset_token = Some(ResetToken {
        token_hash,
        expires_at,
    });
    save_user(store, &mut user).await?;
    Ok(user)
}

/// The user holding an unexpired reset token with this hash
pub async fn find_by_reset_token(
    store: &dyn DocumentStore,
    token_hash: &str,
    now: DateTime<Utc>,
) -> BackendResult<Option<User>> {
    let users: Vec<User> = load_all(store, collections::USERS).await?;
    Ok(users.into_iter().find(|u| {
        u.reset_token
            .as_ref()
            .map(|t| t.token_hash == token_hash && t.expires_at > now)
            .unwrap_or(false)
    }))
}

/// Replace the password hash and consume any reset token
pub async fn set_password(store: &dyn DocumentStore, mut user: User, password_hash: String) -> BackendResult<User> {
    user.password_hash = Some(password_hash);
    user.reset_token = None;
    save_user(store, &mut user).await?;
    Ok(user)
}
