//! Group operations

use chrono::Utc;
use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::hierarchy::items;
use crate::backend::store::{
    collections,
    document::{insert_doc, link_child, load, remove, save, unlink_child},
    DocumentStore,
};
use crate::shared::model::{validate_name, Board, CreateGroupRequest, Group, UpdateGroupRequest};

pub async fn create_group(
    store: &dyn DocumentStore,
    board: &Board,
    creator: Uuid,
    request: CreateGroupRequest,
) -> BackendResult<Group> {
    let name = validate_name("name", &request.name)?;
    let group = Group::new(name, request.color, board.id, creator);

    insert_doc(store, &group).await?;
    if !link_child(store, collections::BOARDS, board.id, "groups", group.id).await? {
        remove(store, &group).await?;
        return Err(BackendError::not_found("board", board.id));
    }

    tracing::debug!("Group {} created on board {}", group.id, board.id);
    Ok(group)
}

/// Groups of a board in board order
pub async fn list_groups(store: &dyn DocumentStore, board: &Board) -> BackendResult<Vec<Group>> {
    let mut groups = Vec::with_capacity(board.groups.len());
    for id in &board.groups {
        match load::<Group>(store, collections::GROUPS, *id).await? {
            Some(group) => groups.push(group),
            None => tracing::warn!("Board {} references missing group {}", board.id, id),
        }
    }
    Ok(groups)
}

pub async fn update_group(
    store: &dyn DocumentStore,
    mut group: Group,
    request: UpdateGroupRequest,
) -> BackendResult<Group> {
    if let Some(name) = request.name {
        group.name = validate_name("name", &name)?;
    }
    if request.color.is_some() {
        group.color = request.color;
    }
    group.updated_at = Utc::now();

    save(store, &group)
        .await?
        .ok_or_else(|| BackendError::not_found("group", group.id))
}

/// Unlink a group from its board, then delete it with all its items
pub async fn delete_group(store: &dyn DocumentStore, group: &Group) -> BackendResult<()> {
    unlink_child(store, collections::BOARDS, group.board_id, "groups", group.id).await?;
    delete_group_tree(store, group.id).await
}

pub(crate) async fn delete_group_tree(store: &dyn DocumentStore, group_id: Uuid) -> BackendResult<()> {
    let Some(group) = load::<Group>(store, collections::GROUPS, group_id).await? else {
        return Ok(());
    };
    let mut removed = 0usize;
    for (kind, item_id) in group.all_children() {
        if items::delete_item_doc(store, kind, item_id).await? {
            removed += 1;
        }
    }
    remove(store, &group).await?;
    tracing::debug!("Group {} deleted with {} items", group_id, removed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::hierarchy::{
        boards::create_board,
        lineage::{require_board, require_group},
        modules::seed_modules,
        workspaces::create_workspace,
    };
    use crate::backend::store::MemoryStore;
    use crate::shared::model::{CreateBoardRequest, CreateWorkspaceRequest, ModuleKind};

    async fn board(store: &MemoryStore) -> Board {
        seed_modules(store).await.unwrap();
        let creator = Uuid::new_v4();
        let ws = create_workspace(
            store,
            creator,
            CreateWorkspaceRequest {
                module: ModuleKind::Crm,
                name: "Sales".into(),
                description: None,
            },
        )
        .await
        .unwrap();
        create_board(
            store,
            &ws,
            creator,
            CreateBoardRequest {
                name: "Pipeline".into(),
                description: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_links_into_board() {
        let store = MemoryStore::new();
        let board = board(&store).await;
        let group = create_group(
            &store,
            &board,
            board.created_by,
            CreateGroupRequest {
                name: "Qualified".into(),
                color: Some("#00aa00".into()),
            },
        )
        .await
        .unwrap();

        let board = require_board(&store, board.id).await.unwrap();
        assert_eq!(board.groups, vec![group.id]);
        assert_eq!(list_groups(&store, &board).await.unwrap(), vec![group]);
    }

    #[tokio::test]
    async fn test_update_keeps_color_when_absent() {
        let store = MemoryStore::new();
        let board = board(&store).await;
        let group = create_group(
            &store,
            &board,
            board.created_by,
            CreateGroupRequest {
                name: "Won".into(),
                color: Some("gold".into()),
            },
        )
        .await
        .unwrap();

        let updated = update_group(
            &store,
            group,
            UpdateGroupRequest {
                name: Some("Closed won".into()),
                color: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.color.as_deref(), Some("gold"));
        assert_eq!(updated.name, "Closed won");
    }

    #[tokio::test]
    async fn test_delete_unlinks_from_board() {
        let store = MemoryStore::new();
        let board = board(&store).await;
        let group = create_group(
            &store,
            &board,
            board.created_by,
            CreateGroupRequest {
                name: "Lost".into(),
                color: None,
            },
        )
        .await
        .unwrap();

        delete_group(&store, &group).await.unwrap();
        assert!(require_group(&store, group.id).await.is_err());
        assert!(require_board(&store, board.id).await.unwrap().groups.is_empty());
    }
}
