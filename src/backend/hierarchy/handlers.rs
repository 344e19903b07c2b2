/**
 * Hierarchy HTTP Handlers
 *
 * Thin axum wrappers over `ops`: extract the path and body, call the
 * authorized operation, and return JSON. Creates answer 201.
 *
 * Item routes take the kind as a path segment (`/api/items/bug/{id}`,
 * `/api/groups/{id}/items/tickets`); singular, plural and `task` are all
 * accepted.
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::backend::error::BackendResult;
use crate::backend::hierarchy::ops;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::model::{
    AddMemberRequest, AssignItemRequest, Board, CreateBoardRequest, CreateGroupRequest,
    CreateItemRequest, CreateWorkspaceRequest, Group, Item, ItemKind, Module, MoveItemRequest,
    UpdateBoardRequest, UpdateGroupRequest, UpdateItemRequest, UpdateMemberRequest,
    UpdateWorkspaceRequest, Workspace,
};

type Created<T> = (StatusCode, Json<T>);

fn parse_kind(segment: &str) -> BackendResult<ItemKind> {
    Ok(segment.parse::<ItemKind>()?)
}

pub async fn list_modules(State(state): State<AppState>) -> BackendResult<Json<Vec<Module>>> {
    Ok(Json(ops::list_modules(&state).await?))
}

// Workspaces

pub async fn list_workspaces(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<Vec<Workspace>>> {
    Ok(Json(ops::list_workspaces(&state, &user).await?))
}

pub async fn create_workspace(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateWorkspaceRequest>,
) -> BackendResult<Created<Workspace>> {
    let workspace = ops::create_workspace(&state, &user, request).await?;
    Ok((StatusCode::CREATED, Json(workspace)))
}

pub async fn get_workspace(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> BackendResult<Json<Workspace>> {
    Ok(Json(ops::get_workspace(&state, &user, id).await?))
}

pub async fn update_workspace(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateWorkspaceRequest>,
) -> BackendResult<Json<Workspace>> {
    Ok(Json(ops::update_workspace(&state, &user, id, request).await?))
}

pub async fn delete_workspace(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> BackendResult<Json<Workspace>> {
    Ok(Json(ops::delete_workspace(&state, &user, id).await?))
}

// Members

pub async fn add_member(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AddMemberRequest>,
) -> BackendResult<Created<Workspace>> {
    let workspace = ops::add_member(&state, &user, id, request).await?;
    Ok((StatusCode::CREATED, Json(workspace)))
}

pub async fn update_member(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateMemberRequest>,
) -> BackendResult<Json<Workspace>> {
    Ok(Json(ops::update_member(&state, &user, id, member_id, request.role).await?))
}

pub async fn remove_member(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> BackendResult<Json<Workspace>> {
    Ok(Json(ops::remove_member(&state, &user, id, member_id).await?))
}

// Boards

pub async fn list_boards(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(workspace_id): Path<Uuid>,
) -> BackendResult<Json<Vec<Board>>> {
    Ok(Json(ops::list_boards(&state, &user, workspace_id).await?))
}

pub async fn create_board(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(workspace_id): Path<Uuid>,
    Json(request): Json<CreateBoardRequest>,
) -> BackendResult<Created<Board>> {
    let board = ops::create_board(&state, &user, workspace_id, request).await?;
    Ok((StatusCode::CREATED, Json(board)))
}

pub async fn get_board(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> BackendResult<Json<Board>> {
    Ok(Json(ops::get_board(&state, &user, id).await?))
}

pub async fn update_board(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBoardRequest>,
) -> BackendResult<Json<Board>> {
    Ok(Json(ops::update_board(&state, &user, id, request).await?))
}

pub async fn delete_board(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> BackendResult<Json<Board>> {
    Ok(Json(ops::delete_board(&state, &user, id).await?))
}

// Groups

pub async fn list_groups(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(board_id): Path<Uuid>,
) -> BackendResult<Json<Vec<Group>>> {
    Ok(Json(ops::list_groups(&state, &user, board_id).await?))
}

pub async fn create_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(board_id): Path<Uuid>,
    Json(request): Json<CreateGroupRequest>,
) -> BackendResult<Created<Group>> {
    let group = ops::create_group(&state, &user, board_id, request).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn get_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> BackendResult<Json<Group>> {
    Ok(Json(ops::get_group(&state, &user, id).await?))
}

pub async fn update_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateGroupRequest>,
) -> BackendResult<Json<Group>> {
    Ok(Json(ops::update_group(&state, &user, id, request).await?))
}

pub async fn delete_group(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> BackendResult<Json<Group>> {
    Ok(Json(ops::delete_group(&state, &user, id).await?))
}

// Items

pub async fn list_items(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((group_id, kind)): Path<(Uuid, String)>,
) -> BackendResult<Json<Vec<Item>>> {
    let kind = parse_kind(&kind)?;
    Ok(Json(ops::list_items(&state, &user, group_id, kind).await?))
}

pub async fn create_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((group_id, kind)): Path<(Uuid, String)>,
    Json(request): Json<CreateItemRequest>,
) -> BackendResult<Created<Item>> {
    let kind = parse_kind(&kind)?;
    let item = ops::create_item(&state, &user, group_id, kind, request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, id)): Path<(String, Uuid)>,
) -> BackendResult<Json<Item>> {
    let kind = parse_kind(&kind)?;
    Ok(Json(ops::get_item(&state, &user, kind, id).await?))
}

pub async fn update_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(request): Json<UpdateItemRequest>,
) -> BackendResult<Json<Item>> {
    let kind = parse_kind(&kind)?;
    Ok(Json(ops::update_item(&state, &user, kind, id, request).await?))
}

pub async fn delete_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, id)): Path<(String, Uuid)>,
) -> BackendResult<Json<Item>> {
    let kind = parse_kind(&kind)?;
    Ok(Json(ops::delete_item(&state, &user, kind, id).await?))
}

pub async fn move_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(request): Json<MoveItemRequest>,
) -> BackendResult<Json<Item>> {
    let kind = parse_kind(&kind)?;
    Ok(Json(ops::move_item(&state, &user, kind, id, request.group_id).await?))
}

pub async fn assign_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(request): Json<AssignItemRequest>,
) -> BackendResult<Json<Item>> {
    let kind = parse_kind(&kind)?;
    Ok(Json(ops::assign_item(&state, &user, kind, id, request.assignee).await?))
}
