/**
 * API Route Handlers
 *
 * This module wires the `/api` endpoints to their handlers.
 *
 * # Routes
 *
 * ## Public
 * - `POST /api/auth/signup` - User registration
 * - `POST /api/auth/login` - User login
 * - `POST /api/auth/google` - Google sign-in
 * - `POST /api/auth/forgot-password` - Request a reset email
 * - `POST /api/auth/reset-password` - Set a new password with a reset token
 *
 * ## Authenticated (`Authorization: Bearer <jwt>`)
 * - `GET|PATCH /api/auth/me` - Current user
 * - `GET /api/modules` - Product modules
 * - Workspaces, members, boards, groups and items
 * - Notification inbox
 */

use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};

use crate::backend::auth::{forgot_password, get_me, google_login, login, reset_password, signup, update_me};
use crate::backend::hierarchy::handlers as hierarchy;
use crate::backend::middleware::auth_middleware;
use crate::backend::notify::handlers as notifications;
use crate::backend::server::state::AppState;

/// Routes reachable without a token
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/google", post(google_login))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
}

/// Routes behind `auth_middleware`
fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(get_me).patch(update_me))
        .route("/api/modules", get(hierarchy::list_modules))
        // Workspaces and members
        .route(
            "/api/workspaces",
            get(hierarchy::list_workspaces).post(hierarchy::create_workspace),
        )
        .route(
            "/api/workspaces/{id}",
            get(hierarchy::get_workspace)
                .patch(hierarchy::update_workspace)
                .delete(hierarchy::delete_workspace),
        )
        .route("/api/workspaces/{id}/members", post(hierarchy::add_member))
        .route(
            "/api/workspaces/{id}/members/{user_id}",
            patch(hierarchy::update_member).delete(hierarchy::remove_member),
        )
        // Boards
        .route(
            "/api/workspaces/{id}/boards",
            get(hierarchy::list_boards).post(hierarchy::create_board),
        )
        .route(
            "/api/boards/{id}",
            get(hierarchy::get_board)
                .patch(hierarchy::update_board)
                .delete(hierarchy::delete_board),
        )
        // Groups
        .route(
            "/api/boards/{id}/groups",
            get(hierarchy::list_groups).post(hierarchy::create_group),
        )
        .route(
            "/api/groups/{id}",
            get(hierarchy::get_group)
                .patch(hierarchy::update_group)
                .delete(hierarchy::delete_group),
        )
        // Items
        .route(
            "/api/groups/{id}/items/{kind}",
            get(hierarchy::list_items).post(hierarchy::create_item),
        )
        .route(
            "/api/items/{kind}/{id}",
            get(hierarchy::get_item)
                .patch(hierarchy::update_item)
                .delete(hierarchy::delete_item),
        )
        .route("/api/items/{kind}/{id}/move", post(hierarchy::move_item))
        .route("/api/items/{kind}/{id}/assign", post(hierarchy::assign_item))
        // Notifications
        .route("/api/notifications", get(notifications::list_notifications))
        .route("/api/notifications/read-all", post(notifications::mark_all_read))
        .route("/api/notifications/{id}/read", post(notifications::mark_read))
}

/// Configure API routes
///
/// The protected routes get `auth_middleware`, which answers 401 before
/// any handler runs when the bearer token is missing or invalid.
pub fn configure_api_routes(router: Router<AppState>, app_state: AppState) -> Router<AppState> {
    router
        .merge(public_routes())
        .merge(protected_routes().route_layer(from_fn_with_state(app_state, auth_middleware)))
}
