/**
 * Notification Inbox Handlers
 *
 * - `GET /api/notifications` - newest first, with the unread count
 * - `POST /api/notifications/{id}/read` - mark one as read
 * - `POST /api/notifications/read-all` - mark everything as read
 */

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::backend::auth::users::{get_user_by_id, mark_notifications_read};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::model::{Notification, User};

#[derive(Debug, Serialize)]
pub struct NotificationList {
    pub notifications: Vec<Notification>,
    pub unread: usize,
}

impl From<User> for NotificationList {
    fn from(user: User) -> Self {
        let unread = user.unread_count();
        let mut notifications = user.notifications;
        notifications.reverse();
        Self { notifications, unread }
    }
}

async fn current_user(state: &AppState, user_id: Uuid) -> BackendResult<User> {
    get_user_by_id(state.store.as_ref(), user_id)
        .await?
        .ok_or_else(|| BackendError::unauthorized("User no longer exists"))
}

pub async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> BackendResult<Json<NotificationList>> {
    let user = current_user(&state, auth.user_id).await?;
    Ok(Json(user.into()))
}

pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(notification_id): Path<Uuid>,
) -> BackendResult<Json<Notification>> {
    let user = mark_notifications_read(state.store.as_ref(), auth.user_id, Some(notification_id)).await?;
    user.notifications
        .into_iter()
        .find(|n| n.id == notification_id)
        .map(Json)
        .ok_or_else(|| BackendError::not_found("notification", notification_id))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
) -> BackendResult<Json<NotificationList>> {
    let user = mark_notifications_read(state.store.as_ref(), auth.user_id, None).await?;
    tracing::debug!("Marked all {} notifications read for {}", user.notifications.len(), user.id);
    Ok(Json(user.into()))
}
