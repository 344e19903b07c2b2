//! Authorized hierarchy operations
//!
//! Each function resolves the target with its owning workspace, checks the
//! caller against the access policy, performs the mutation and publishes
//! the realtime event. REST handlers and socket events both call these, so
//! the two surfaces cannot drift apart.

use uuid::Uuid;

use crate::backend::access::{authorize, Action};
use crate::backend::error::BackendResult;
use crate::backend::hierarchy::{
    boards, groups, items,
    lineage::{require_workspace, resolve_board, resolve_group, resolve_item},
    modules, workspaces,
};
use crate::backend::middleware::AuthenticatedUser;
use crate::backend::realtime::broadcast::publish;
use crate::backend::server::state::AppState;
use crate::shared::model::{
    AddMemberRequest, Board, CreateBoardRequest, CreateGroupRequest, CreateItemRequest,
    CreateWorkspaceRequest, Group, Item, ItemKind, Module, Notification, Role, UpdateBoardRequest,
    UpdateGroupRequest, UpdateItemRequest, UpdateWorkspaceRequest, Workspace,
};
use crate::shared::{EventAction, EventType};

/// Tell a new assignee about their item; failures are only logged
async fn notify_assignee(state: &AppState, workspace: &Workspace, item: &Item, assigned_by: Uuid) {
    let Some(assignee) = item.assignee else {
        return;
    };
    if assignee == assigned_by {
        return;
    }
    let notification = Notification::new(
        format!("New {} assigned", item.kind.as_str()),
        format!("You were assigned \"{}\" in {}", item.name, workspace.name),
    )
    .with_link(state.config.link(&format!("/items/{}/{}", item.kind.as_str(), item.id)));

    if let Err(e) = state.notifier.notify_user(assignee, notification).await {
        tracing::warn!("Failed to notify assignee {} of {}: {}", assignee, item.id, e);
    }
}

// Modules

pub async fn list_modules(state: &AppState) -> BackendResult<Vec<Module>> {
    modules::list_modules(state.store.as_ref()).await
}

// Workspaces

pub async fn list_workspaces(state: &AppState, user: &AuthenticatedUser) -> BackendResult<Vec<Workspace>> {
    workspaces::list_workspaces_for(state.store.as_ref(), user.user_id).await
}

pub async fn create_workspace(
    state: &AppState,
    user: &AuthenticatedUser,
    request: CreateWorkspaceRequest,
) -> BackendResult<Workspace> {
    let workspace = workspaces::create_workspace(state.store.as_ref(), user.user_id, request).await?;
    publish(&state.realtime_broadcast, EventType::Workspace, EventAction::Created, workspace.id, &workspace);
    Ok(workspace)
}

pub async fn get_workspace(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> BackendResult<Workspace> {
    let workspace = require_workspace(state.store.as_ref(), id).await?;
    authorize(&workspace, user.user_id, Action::Read)?;
    Ok(workspace)
}

pub async fn update_workspace(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
    request: UpdateWorkspaceRequest,
) -> BackendResult<Workspace> {
    let workspace = require_workspace(state.store.as_ref(), id).await?;
    authorize(&workspace, user.user_id, Action::Administer)?;
    let workspace = workspaces::update_workspace(state.store.as_ref(), workspace, request).await?;
    publish(&state.realtime_broadcast, EventType::Workspace, EventAction::Updated, workspace.id, &workspace);
    Ok(workspace)
}

pub async fn delete_workspace(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> BackendResult<Workspace> {
    let workspace = require_workspace(state.store.as_ref(), id).await?;
    authorize(&workspace, user.user_id, Action::Administer)?;
    workspaces::delete_workspace(state.store.as_ref(), &workspace).await?;
    publish(&state.realtime_broadcast, EventType::Workspace, EventAction::Deleted, workspace.id, &workspace);
    Ok(workspace)
}

// Members

pub async fn add_member(
    state: &AppState,
    user: &AuthenticatedUser,
    workspace_id: Uuid,
    request: AddMemberRequest,
) -> BackendResult<Workspace> {
    let workspace = require_workspace(state.store.as_ref(), workspace_id).await?;
    authorize(&workspace, user.user_id, Action::Administer)?;
    let added = request.user_id;
    let workspace = workspaces::add_member(state.store.as_ref(), &workspace, request).await?;
    publish(&state.realtime_broadcast, EventType::Member, EventAction::Created, workspace.id, &workspace);

    let notification = Notification::new(
        "Added to workspace",
        format!("You were added to {}", workspace.name),
    )
    .with_link(state.config.link(&format!("/workspaces/{}", workspace.id)));
    if let Err(e) = state.notifier.notify_user(added, notification).await {
        tracing::warn!("Failed to notify new member {}: {}", added, e);
    }
    Ok(workspace)
}

pub async fn update_member(
    state: &AppState,
    user: &AuthenticatedUser,
    workspace_id: Uuid,
    member_id: Uuid,
    role: Role,
) -> BackendResult<Workspace> {
    let workspace = require_workspace(state.store.as_ref(), workspace_id).await?;
    authorize(&workspace, user.user_id, Action::Administer)?;
    let workspace = workspaces::update_member_role(state.store.as_ref(), &workspace, member_id, role).await?;
    publish(&state.realtime_broadcast, EventType::Member, EventAction::Updated, workspace.id, &workspace);
    Ok(workspace)
}

/// Remove a member and clear their assignments; members may also remove themselves
pub async fn remove_member(
    state: &AppState,
    user: &AuthenticatedUser,
    workspace_id: Uuid,
    member_id: Uuid,
) -> BackendResult<Workspace> {
    let workspace = require_workspace(state.store.as_ref(), workspace_id).await?;
    let action = if member_id == user.user_id {
        Action::Read
    } else {
        Action::Administer
    };
    authorize(&workspace, user.user_id, action)?;
    let workspace = workspaces::remove_member(state.store.as_ref(), &workspace, member_id).await?;
    publish(&state.realtime_broadcast, EventType::Member, EventAction::Deleted, workspace.id, &workspace);

    // Former members keep no assignments
    for item in items::unassign_user(state.store.as_ref(), &workspace, member_id).await? {
        publish(&state.realtime_broadcast, EventType::Item, EventAction::Updated, workspace.id, &item);
    }
    Ok(workspace)
}

// Boards

pub async fn list_boards(state: &AppState, user: &AuthenticatedUser, workspace_id: Uuid) -> BackendResult<Vec<Board>> {
    let workspace = get_workspace(state, user, workspace_id).await?;
    boards::list_boards(state.store.as_ref(), &workspace).await
}

pub async fn create_board(
    state: &AppState,
    user: &AuthenticatedUser,
    workspace_id: Uuid,
    request: CreateBoardRequest,
) -> BackendResult<Board> {
    let workspace = require_workspace(state.store.as_ref(), workspace_id).await?;
    authorize(&workspace, user.user_id, Action::Contribute)?;
    let board = boards::create_board(state.store.as_ref(), &workspace, user.user_id, request).await?;
    publish(&state.realtime_broadcast, EventType::Board, EventAction::Created, workspace.id, &board);
    Ok(board)
}

pub async fn get_board(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> BackendResult<Board> {
    let (workspace, board) = resolve_board(state.store.as_ref(), id).await?;
    authorize(&workspace, user.user_id, Action::Read)?;
    Ok(board)
}

pub async fn update_board(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
    request: UpdateBoardRequest,
) -> BackendResult<Board> {
    let (workspace, board) = resolve_board(state.store.as_ref(), id).await?;
    authorize(&workspace, user.user_id, Action::Contribute)?;
    let board = boards::update_board(state.store.as_ref(), board, request).await?;
    publish(&state.realtime_broadcast, EventType::Board, EventAction::Updated, workspace.id, &board);
    Ok(board)
}

pub async fn delete_board(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> BackendResult<Board> {
    let (workspace, board) = resolve_board(state.store.as_ref(), id).await?;
    authorize(&workspace, user.user_id, Action::Contribute)?;
    boards::delete_board(state.store.as_ref(), &board).await?;
    publish(&state.realtime_broadcast, EventType::Board, EventAction::Deleted, workspace.id, &board);
    Ok(board)
}

// Groups

pub async fn list_groups(state: &AppState, user: &AuthenticatedUser, board_id: Uuid) -> BackendResult<Vec<Group>> {
    let (workspace, board) = resolve_board(state.store.as_ref(), board_id).await?;
    authorize(&workspace, user.user_id, Action::Read)?;
    groups::list_groups(state.store.as_ref(), &board).await
}

pub async fn create_group(
    state: &AppState,
    user: &AuthenticatedUser,
    board_id: Uuid,
    request: CreateGroupRequest,
) -> BackendResult<Group> {
    let (workspace, board) = resolve_board(state.store.as_ref(), board_id).await?;
    authorize(&workspace, user.user_id, Action::Contribute)?;
    let group = groups::create_group(state.store.as_ref(), &board, user.user_id, request).await?;
    publish(&state.realtime_broadcast, EventType::Group, EventAction::Created, workspace.id, &group);
    Ok(group)
}

pub async fn get_group(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> BackendResult<Group> {
    let (workspace, _board, group) = resolve_group(state.store.as_ref(), id).await?;
    authorize(&workspace, user.user_id, Action::Read)?;
    Ok(group)
}

pub async fn update_group(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
    request: UpdateGroupRequest,
) -> BackendResult<Group> {
    let (workspace, _board, group) = resolve_group(state.store.as_ref(), id).await?;
    authorize(&workspace, user.user_id, Action::Contribute)?;
    let group = groups::update_group(state.store.as_ref(), group, request).await?;
    publish(&state.realtime_broadcast, EventType::Group, EventAction::Updated, workspace.id, &group);
    Ok(group)
}

pub async fn delete_group(state: &AppState, user: &AuthenticatedUser, id: Uuid) -> BackendResult<Group> {
    let (workspace, _board, group) = resolve_group(state.store.as_ref(), id).await?;
    authorize(&workspace, user.user_id, Action::Contribute)?;
    groups::delete_group(state.store.as_ref(), &group).await?;
    publish(&state.realtime_broadcast, EventType::Group, EventAction::Deleted, workspace.id, &group);
    Ok(group)
}

// Items

pub async fn list_items(
    state: &AppState,
    user: &AuthenticatedUser,
    group_id: Uuid,
    kind: ItemKind,
) -> BackendResult<Vec<Item>> {
    let (workspace, _board, group) = resolve_group(state.store.as_ref(), group_id).await?;
    authorize(&workspace, user.user_id, Action::Read)?;
    items::list_items(state.store.as_ref(), &group, kind).await
}

pub async fn create_item(
    state: &AppState,
    user: &AuthenticatedUser,
    group_id: Uuid,
    kind: ItemKind,
    request: CreateItemRequest,
) -> BackendResult<Item> {
    let (workspace, _board, group) = resolve_group(state.store.as_ref(), group_id).await?;
    authorize(&workspace, user.user_id, Action::Contribute)?;
    let item = items::create_item(state.store.as_ref(), &workspace, &group, kind, user.user_id, request).await?;
    publish(&state.realtime_broadcast, EventType::Item, EventAction::Created, workspace.id, &item);
    notify_assignee(state, &workspace, &item, user.user_id).await;
    Ok(item)
}

pub async fn get_item(state: &AppState, user: &AuthenticatedUser, kind: ItemKind, id: Uuid) -> BackendResult<Item> {
    let (workspace, _group, item) = resolve_item(state.store.as_ref(), kind, id).await?;
    authorize(&workspace, user.user_id, Action::Read)?;
    Ok(item)
}

pub async fn update_item(
    state: &AppState,
    user: &AuthenticatedUser,
    kind: ItemKind,
    id: Uuid,
    request: UpdateItemRequest,
) -> BackendResult<Item> {
    let (workspace, _group, item) = resolve_item(state.store.as_ref(), kind, id).await?;
    authorize(&workspace, user.user_id, Action::update_item(&item))?;
    let previous_assignee = item.assignee;
    let item = items::update_item(state.store.as_ref(), &workspace, item, request).await?;
    publish(&state.realtime_broadcast, EventType::Item, EventAction::Updated, workspace.id, &item);
    if item.assignee != previous_assignee {
        notify_assignee(state, &workspace, &item, user.user_id).await;
    }
    Ok(item)
}

pub async fn delete_item(state: &AppState, user: &AuthenticatedUser, kind: ItemKind, id: Uuid) -> BackendResult<Item> {
    let (workspace, _group, item) = resolve_item(state.store.as_ref(), kind, id).await?;
    authorize(&workspace, user.user_id, Action::delete_item(&item))?;
    items::delete_item(state.store.as_ref(), &item).await?;
    publish(&state.realtime_broadcast, EventType::Item, EventAction::Deleted, workspace.id, &item);
    Ok(item)
}

pub async fn move_item(
    state: &AppState,
    user: &AuthenticatedUser,
    kind: ItemKind,
    id: Uuid,
    target_group_id: Uuid,
) -> BackendResult<Item> {
    let (workspace, _group, item) = resolve_item(state.store.as_ref(), kind, id).await?;
    authorize(&workspace, user.user_id, Action::update_item(&item))?;
    let item = items::move_item(state.store.as_ref(), &workspace, item, target_group_id).await?;
    publish(&state.realtime_broadcast, EventType::Item, EventAction::Moved, workspace.id, &item);
    Ok(item)
}

pub async fn assign_item(
    state: &AppState,
    user: &AuthenticatedUser,
    kind: ItemKind,
    id: Uuid,
    assignee: Option<Uuid>,
) -> BackendResult<Item> {
    let (workspace, _group, item) = resolve_item(state.store.as_ref(), kind, id).await?;
    authorize(&workspace, user.user_id, Action::update_item(&item))?;
    let item = items::assign_item(state.store.as_ref(), &workspace, item, assignee).await?;
    publish(&state.realtime_broadcast, EventType::Item, EventAction::Assigned, workspace.id, &item);
    notify_assignee(state, &workspace, &item, user.user_id).await;
    Ok(item)
}
