//! Ancestor resolution
//!
//! Access checks are always made against the owning workspace, so every
//! operation below the workspace level first walks up the tree.

use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::store::{collections, document::load, DocumentStore};
use crate::shared::model::{Board, Group, Item, ItemKind, Workspace};

pub async fn require_workspace(store: &dyn DocumentStore, id: Uuid) -> BackendResult<Workspace> {
    load(store, collections::WORKSPACES, id)
        .await?
        .ok_or_else(|| BackendError::not_found("workspace", id))
}

pub async fn require_board(store: &dyn DocumentStore, id: Uuid) -> BackendResult<Board> {
    load(store, collections::BOARDS, id)
        .await?
        .ok_or_else(|| BackendError::not_found("board", id))
}

pub async fn require_group(store: &dyn DocumentStore, id: Uuid) -> BackendResult<Group> {
    load(store, collections::GROUPS, id)
        .await?
        .ok_or_else(|| BackendError::not_found("group", id))
}

pub async fn require_item(store: &dyn DocumentStore, kind: ItemKind, id: Uuid) -> BackendResult<Item> {
    load(store, kind.collection(), id)
        .await?
        .ok_or_else(|| BackendError::not_found(kind.as_str(), id))
}

/// A board and the workspace that owns it
pub async fn resolve_board(store: &dyn DocumentStore, board_id: Uuid) -> BackendResult<(Workspace, Board)> {
    let board = require_board(store, board_id).await?;
    let workspace = require_workspace(store, board.workspace_id).await?;
    Ok((workspace, board))
}

/// A group with its board and workspace
pub async fn resolve_group(
    store: &dyn DocumentStore,
    group_id: Uuid,
) -> BackendResult<(Workspace, Board, Group)> {
    let group = require_group(store, group_id).await?;
    let (workspace, board) = resolve_board(store, group.board_id).await?;
    Ok((workspace, board, group))
}

/// An item with its group and workspace
pub async fn resolve_item(
    store: &dyn DocumentStore,
    kind: ItemKind,
    item_id: Uuid,
) -> BackendResult<(Workspace, Group, Item)> {
    let item = require_item(store, kind, item_id).await?;
    let (workspace, _board, group) = resolve_group(store, item.group_id).await?;
    Ok((workspace, group, item))
}
