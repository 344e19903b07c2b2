//! Workspace operations
//!
//! Workspaces are linked into their module's `workspaces` array on create
//! and unlinked on delete. The creator is stored as the first admin member.

use chrono::Utc;
use serde_json::{json, Map};
use uuid::Uuid;

use crate::backend::auth::users::get_user_by_id;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::hierarchy::{boards, lineage::require_workspace, modules::module_for};
use crate::backend::store::{
    collections,
    document::{insert_doc, link_child, load_all, remove, save, unlink_child, update_fields},
    DocumentStore, ElementMatch,
};
use crate::shared::model::{
    validate_name, AddMemberRequest, CreateWorkspaceRequest, Member, Role, UpdateWorkspaceRequest,
    Workspace,
};

/// Create a workspace owned by `creator`
pub async fn create_workspace(
    store: &dyn DocumentStore,
    creator: Uuid,
    request: CreateWorkspaceRequest,
) -> BackendResult<Workspace> {
    let name = validate_name("name", &request.name)?;
    let module = module_for(store, request.module).await?;
    let now = Utc::now();

    let workspace = Workspace {
        id: Uuid::new_v4(),
        name,
        description: request.description,
        module_id: module.id,
        module: request.module,
        created_by: creator,
        members: vec![Member {
            user_id: creator,
            role: Role::Admin,
            joined_at: now,
        }],
        boards: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    insert_doc(store, &workspace).await?;
    link_child(store, collections::MODULES, module.id, "workspaces", workspace.id).await?;

    tracing::info!(
        "Workspace {} created in module {} by {}",
        workspace.id,
        workspace.module.as_str(),
        creator
    );
    Ok(workspace)
}

/// Workspaces where `user_id` is a member, in creation order
pub async fn list_workspaces_for(store: &dyn DocumentStore, user_id: Uuid) -> BackendResult<Vec<Workspace>> {
    let all: Vec<Workspace> = load_all(store, collections::WORKSPACES).await?;
    Ok(all.into_iter().filter(|w| w.is_member(user_id)).collect())
}

/// Merge a patch into a workspace
pub async fn update_workspace(
    store: &dyn DocumentStore,
    mut workspace: Workspace,
    request: UpdateWorkspaceRequest,
) -> BackendResult<Workspace> {
    if let Some(name) = request.name {
        workspace.name = validate_name("name", &name)?;
    }
    if let Some(description) = request.description {
        workspace.description = description;
    }
    workspace.updated_at = Utc::now();

    save(store, &workspace)
        .await?
        .ok_or_else(|| BackendError::not_found("workspace", workspace.id))
}

/// Bump `updated_at` and return the workspace as stored
async fn touch(store: &dyn DocumentStore, workspace_id: Uuid) -> BackendResult<Workspace> {
    let mut fields = Map::new();
    fields.insert("updated_at".into(), json!(Utc::now()));
    update_fields(store, collections::WORKSPACES, workspace_id, fields)
        .await?
        .ok_or_else(|| BackendError::not_found("workspace", workspace_id))
}

/// Delete a workspace and everything under it
pub async fn delete_workspace(store: &dyn DocumentStore, workspace: &Workspace) -> BackendResult<()> {
    unlink_child(store, collections::MODULES, workspace.module_id, "workspaces", workspace.id).await?;

    for board_id in &workspace.boards {
        boards::delete_board_tree(store, *board_id).await?;
    }
    remove(store, workspace).await?;

    tracing::info!("Workspace {} deleted with {} boards", workspace.id, workspace.boards.len());
    Ok(())
}

/// Add an existing user to the workspace
///
/// Membership is keyed by user id in the store, so two concurrent adds of
/// the same user cannot both succeed.
pub async fn add_member(
    store: &dyn DocumentStore,
    workspace: &Workspace,
    request: AddMemberRequest,
) -> BackendResult<Workspace> {
    if get_user_by_id(store, request.user_id).await?.is_none() {
        return Err(BackendError::not_found("user", request.user_id));
    }

    let member = Member {
        user_id: request.user_id,
        role: request.role,
        joined_at: Utc::now(),
    };
    let pushed = store
        .push_keyed(
            collections::WORKSPACES,
            workspace.id,
            "members",
            "user_id",
            serde_json::to_value(&member)?,
        )
        .await?;
    match pushed {
        None => Err(BackendError::not_found("workspace", workspace.id)),
        Some(false) => Err(BackendError::conflict("User is already a member of this workspace")),
        Some(true) => touch(store, workspace.id).await,
    }
}

/// Change a member's role; the creator always stays admin
pub async fn update_member_role(
    store: &dyn DocumentStore,
    workspace: &Workspace,
    user_id: Uuid,
    role: Role,
) -> BackendResult<Workspace> {
    if workspace.created_by == user_id && role != Role::Admin {
        return Err(BackendError::validation("role", "the workspace creator cannot be demoted"));
    }
    if !workspace.is_member(user_id) {
        return Err(BackendError::not_found("member", user_id));
    }

    let key = json!(user_id);
    let mut patch = Map::new();
    patch.insert("role".into(), serde_json::to_value(role)?);
    store
        .patch_elements(
            collections::WORKSPACES,
            workspace.id,
            "members",
            Some(ElementMatch::new("user_id", &key)),
            patch,
        )
        .await?
        .ok_or_else(|| BackendError::not_found("workspace", workspace.id))?;
    touch(store, workspace.id).await
}

/// Remove a member; the creator cannot be removed
pub async fn remove_member(
    store: &dyn DocumentStore,
    workspace: &Workspace,
    user_id: Uuid,
) -> BackendResult<Workspace> {
    if workspace.created_by == user_id {
        return Err(BackendError::validation("user_id", "the workspace creator cannot be removed"));
    }
    if !workspace.is_member(user_id) {
        return Err(BackendError::not_found("member", user_id));
    }

    let key = json!(user_id);
    if !store
        .pull_keyed(collections::WORKSPACES, workspace.id, "members", ElementMatch::new("user_id", &key))
        .await?
    {
        return Err(BackendError::not_found("workspace", workspace.id));
    }
    touch(store, workspace.id).await
}
