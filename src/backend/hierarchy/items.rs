//! Item operations
//!
//! One implementation serves every item kind. The kind selects both the
//! collection and the id-array on the owning group.

use chrono::Utc;
use serde_json::{json, Map};
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::hierarchy::lineage::resolve_group;
use crate::backend::store::{
    collections,
    document::{insert_doc, link_child, load, remove, save, unlink_child, update_fields},
    DocumentStore,
};
use crate::shared::model::{
    validate_name, Board, CreateItemRequest, Group, Item, ItemKind, UpdateItemRequest, Workspace,
};

fn check_status(status: &str) -> BackendResult<String> {
    let status = status.trim();
    if status.is_empty() {
        return Err(BackendError::validation("status", "cannot be empty"));
    }
    Ok(status.to_string())
}

fn check_assignee(workspace: &Workspace, assignee: Option<Uuid>) -> BackendResult<()> {
    match assignee {
        Some(user_id) if !workspace.is_member(user_id) => Err(BackendError::validation(
            "assignee",
            "assignee must be a member of the workspace",
        )),
        _ => Ok(()),
    }
}

/// Create an item of `kind` in `group`
///
/// The workspace's module must admit the kind, and an assignee, if given,
/// must already be a member.
pub async fn create_item(
    store: &dyn DocumentStore,
    workspace: &Workspace,
    group: &Group,
    kind: ItemKind,
    creator: Uuid,
    request: CreateItemRequest,
) -> BackendResult<Item> {
    if !workspace.module.admits(kind) {
        return Err(BackendError::validation(
            "kind",
            format!(
                "{} items are not available in {} workspaces",
                kind.as_str(),
                workspace.module.display_name()
            ),
        ));
    }
    let name = validate_name("name", &request.name)?;
    let status = match request.status {
        Some(status) => check_status(&status)?,
        None => kind.default_status().to_string(),
    };
    check_assignee(workspace, request.assignee)?;

    let now = Utc::now();
    let item = Item {
        id: Uuid::new_v4(),
        kind,
        group_id: group.id,
        name,
        description: request.description,
        status,
        priority: request.priority.unwrap_or_default(),
        assignee: request.assignee,
        due_date: request.due_date,
        fields: request.fields,
        created_by: creator,
        created_at: now,
        updated_at: now,
        overdue_notified_at: None,
    };

    insert_doc(store, &item).await?;
    if !link_child(store, collections::GROUPS, group.id, kind.collection(), item.id).await? {
        remove(store, &item).await?;
        return Err(BackendError::not_found("group", group.id));
    }

    tracing::debug!("{} {} created in group {}", kind.as_str(), item.id, group.id);
    Ok(item)
}

/// Items of one kind in group order
pub async fn list_items(store: &dyn DocumentStore, group: &Group, kind: ItemKind) -> BackendResult<Vec<Item>> {
    let ids = group.children(kind);
    let mut items = Vec::with_capacity(ids.len());
    for id in ids {
        match load::<Item>(store, kind.collection(), *id).await? {
            Some(item) => items.push(item),
            None => tracing::warn!("Group {} references missing {} {}", group.id, kind.as_str(), id),
        }
    }
    Ok(items)
}

/// Merge a patch into an item
pub async fn update_item(
    store: &dyn DocumentStore,
    workspace: &Workspace,
    mut item: Item,
    request: UpdateItemRequest,
) -> BackendResult<Item> {
    if let Some(name) = request.name {
        item.name = validate_name("name", &name)?;
    }
    if let Some(description) = request.description {
        item.description = description;
    }
    if let Some(status) = request.status {
        item.status = check_status(&status)?;
    }
    if let Some(priority) = request.priority {
        item.priority = priority;
    }
    if let Some(assignee) = request.assignee {
        check_assignee(workspace, assignee)?;
        if item.assignee != assignee {
            item.overdue_notified_at = None;
        }
        item.assignee = assignee;
    }
    if let Some(due_date) = request.due_date {
        if item.due_date != due_date {
            item.overdue_notified_at = None;
        }
        item.due_date = due_date;
    }
    if let Some(fields) = request.fields {
        for (key, value) in fields {
            if value.is_null() {
                item.fields.remove(&key);
            } else {
                item.fields.insert(key, value);
            }
        }
    }
    item.updated_at = Utc::now();

    save(store, &item)
        .await?
        .ok_or_else(|| BackendError::not_found(item.kind.as_str(), item.id))
}

/// Unlink an item from its group and delete it
pub async fn delete_item(store: &dyn DocumentStore, item: &Item) -> BackendResult<()> {
    unlink_child(store, collections::GROUPS, item.group_id, item.kind.collection(), item.id).await?;
    remove(store, item).await?;
    tracing::debug!("{} {} deleted", item.kind.as_str(), item.id);
    Ok(())
}

/// Delete an item document during a cascade; `false` if it was already gone
pub(crate) async fn delete_item_doc(store: &dyn DocumentStore, kind: ItemKind, id: Uuid) -> BackendResult<bool> {
    Ok(store.delete(kind.collection(), id).await?)
}

/// Move an item to another group of the same workspace
pub async fn move_item(
    store: &dyn DocumentStore,
    workspace: &Workspace,
    item: Item,
    target_group_id: Uuid,
) -> BackendResult<Item> {
    if item.group_id == target_group_id {
        return Ok(item);
    }
    let (target_workspace, _board, target) = resolve_group(store, target_group_id).await?;
    if target_workspace.id != workspace.id {
        return Err(BackendError::validation(
            "group_id",
            "items can only move between groups of the same workspace",
        ));
    }

    let kind = item.kind;
    let source = item.group_id;
    link_child(store, collections::GROUPS, target.id, kind.collection(), item.id).await?;

    let mut fields = Map::new();
    fields.insert("group_id".into(), json!(target.id));
    fields.insert("updated_at".into(), json!(Utc::now()));
    let Some(moved) = update_fields::<Item>(store, kind.collection(), item.id, fields).await? else {
        unlink_child(store, collections::GROUPS, target.id, kind.collection(), item.id).await?;
        return Err(BackendError::not_found(kind.as_str(), item.id));
    };

    unlink_child(store, collections::GROUPS, source, kind.collection(), item.id).await?;

    tracing::debug!("{} {} moved from group {} to {}", kind.as_str(), moved.id, source, target.id);
    Ok(moved)
}

/// Set or clear an item's assignee
pub async fn assign_item(
    store: &dyn DocumentStore,
    workspace: &Workspace,
    mut item: Item,
    assignee: Option<Uuid>,
) -> BackendResult<Item> {
    check_assignee(workspace, assignee)?;
    item.assignee = assignee;
    item.overdue_notified_at = None;
    item.updated_at = Utc::now();

    save(store, &item)
        .await?
        .ok_or_else(|| BackendError::not_found(item.kind.as_str(), item.id))
}

/// Clear `user_id` from every item of the workspace it is assigned to
///
/// Returns the items that were unassigned.
pub async fn unassign_user(
    store: &dyn DocumentStore,
    workspace: &Workspace,
    user_id: Uuid,
) -> BackendResult<Vec<Item>> {
    let mut cleared = Vec::new();
    for board_id in &workspace.boards {
        let Some(board) = load::<Board>(store, collections::BOARDS, *board_id).await? else {
            continue;
        };
        for group_id in &board.groups {
            let Some(group) = load::<Group>(store, collections::GROUPS, *group_id).await? else {
                continue;
            };
            for (kind, item_id) in group.all_children() {
                let Some(item) = load::<Item>(store, kind.collection(), item_id).await? else {
                    continue;
                };
                if item.assignee != Some(user_id) {
                    continue;
                }
                let mut fields = Map::new();
                fields.insert("assignee".into(), json!(null));
                fields.insert("overdue_notified_at".into(), json!(null));
                fields.insert("updated_at".into(), json!(Utc::now()));
                if let Some(item) = update_fields::<Item>(store, kind.collection(), item_id, fields).await? {
                    cleared.push(item);
                }
            }
        }
    }

    if !cleared.is_empty() {
        tracing::debug!("Unassigned {} from {} items in workspace {}", user_id, cleared.len(), workspace.id);
    }
    Ok(cleared)
}
