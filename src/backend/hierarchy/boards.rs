//! Board operations

use chrono::Utc;
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::hierarchy::groups;
use crate::backend::store::{
    collections,
    document::{insert_doc, link_child, load, remove, save, unlink_child},
    DocumentStore,
};
use crate::shared::model::{validate_name, Board, CreateBoardRequest, UpdateBoardRequest, Workspace};

pub async fn create_board(
    store: &dyn DocumentStore,
    workspace: &Workspace,
    creator: Uuid,
    request: CreateBoardRequest,
) -> BackendResult<Board> {
    let name = validate_name("name", &request.name)?;
    let now = Utc::now();
    let board = Board {
        id: Uuid::new_v4(),
        name,
        description: request.description,
        workspace_id: workspace.id,
        groups: Vec::new(),
        created_by: creator,
        created_at: now,
        updated_at: now,
    };

    insert_doc(store, &board).await?;
    if !link_child(store, collections::WORKSPACES, workspace.id, "boards", board.id).await? {
        // Parent vanished between the access check and the link
        remove(store, &board).await?;
        return Err(BackendError::not_found("workspace", workspace.id));
    }

    tracing::debug!("Board {} created in workspace {}", board.id, workspace.id);
    Ok(board)
}

/// Boards of a workspace in the order the workspace lists them
pub async fn list_boards(store: &dyn DocumentStore, workspace: &Workspace) -> BackendResult<Vec<Board>> {
    let mut boards = Vec::with_capacity(workspace.boards.len());
    for id in &workspace.boards {
        match load::<Board>(store, collections::BOARDS, *id).await? {
            Some(board) => boards.push(board),
            None => tracing::warn!("Workspace {} references missing board {}", workspace.id, id),
        }
    }
    Ok(boards)
}

pub async fn update_board(
    store: &dyn DocumentStore,
    mut board: Board,
    request: UpdateBoardRequest,
) -> BackendResult<Board> {
    if let Some(name) = request.name {
        board.name = validate_name("name", &name)?;
    }
    if let Some(description) = request.description {
        board.description = description;
    }
    board.updated_at = Utc::now();

    save(store, &board)
        .await?
        .ok_or_else(|| BackendError::not_found("board", board.id))
}

/// Unlink a board from its workspace, then delete it with all its groups
pub async fn delete_board(store: &dyn DocumentStore, board: &Board) -> BackendResult<()> {
    unlink_child(store, collections::WORKSPACES, board.workspace_id, "boards", board.id).await?;
    delete_board_tree(store, board.id).await
}

/// Delete a board and its descendants without touching the parent
pub(crate) async fn delete_board_tree(store: &dyn DocumentStore, board_id: Uuid) -> BackendResult<()> {
    let Some(board) = load::<Board>(store, collections::BOARDS, board_id).await? else {
        return Ok(());
    };
    for group_id in &board.groups {
        groups::delete_group_tree(store, *group_id).await?;
    }
    remove(store, &board).await?;
    tracing::debug!("Board {} deleted", board_id);
    Ok(())
}
