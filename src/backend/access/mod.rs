//! Access Module
//!
//! The single place where workspace roles are turned into allow/deny
//! decisions. Every REST handler and socket event goes through `authorize`
//! with the workspace that owns the target document.
//!
//! # Policy
//!
//! | Action          | Allowed for                 |
//! |-----------------|-----------------------------|
//! | `Read`          | any member                  |
//! | `Contribute`    | any member                  |
//! | `Administer`    | admins                      |
//! | `UpdateItem`    | admins or the item assignee |
//! | `DeleteItem`    | admins or the item creator  |

use uuid::Uuid;

use crate::backend::error::{BackendError, BackendResult};
use crate::shared::model::{Item, Role, Workspace};

/// What the caller is trying to do inside a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// View the workspace or anything below it
    Read,
    /// Create/update/delete boards and groups; create items
    Contribute,
    /// Update/delete the workspace, manage members
    Administer,
    UpdateItem {
        assignee: Option<Uuid>,
    },
    DeleteItem {
        creator: Uuid,
    },
}

impl Action {
    pub fn update_item(item: &Item) -> Self {
        Action::UpdateItem {
            assignee: item.assignee,
        }
    }

    pub fn delete_item(item: &Item) -> Self {
        Action::DeleteItem {
            creator: item.created_by,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Action::Read => "read this workspace",
            Action::Contribute => "modify this workspace",
            Action::Administer => "administer this workspace",
            Action::UpdateItem { .. } => "update this item",
            Action::DeleteItem { .. } => "delete this item",
        }
    }
}

/// Check `user_id` may perform `action` in `workspace`; returns the caller's role
pub fn authorize(workspace: &Workspace, user_id: Uuid, action: Action) -> BackendResult<Role> {
    let Some(role) = workspace.role_of(user_id) else {
        tracing::warn!("User {} is not a member of workspace {}", user_id, workspace.id);
        return Err(BackendError::forbidden("You are not a member of this workspace"));
    };

    let allowed = match (role, action) {
        (Role::Admin, _) => true,
        (Role::Member, Action::Read | Action::Contribute) => true,
        (Role::Member, Action::Administer) => false,
        (Role::Member, Action::UpdateItem { assignee }) => assignee == Some(user_id),
        (Role::Member, Action::DeleteItem { creator }) => creator == user_id,
    };

    if allowed {
        Ok(role)
    } else {
        tracing::warn!(
            "User {} ({}) denied: {} in workspace {}",
            user_id,
            role.as_str(),
            action.describe(),
            workspace.id
        );
        Err(BackendError::forbidden(format!("You are not allowed to {}", action.describe())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;
    use crate::shared::model::{Member, ModuleKind};

    struct Fixture {
        workspace: Workspace,
        admin: Uuid,
        member: Uuid,
        outsider: Uuid,
    }

    fn fixture() -> Fixture {
        let admin = Uuid::new_v4();
        let member = Uuid::new_v4();
        let now = Utc::now();
        let workspace = Workspace {
            id: Uuid::new_v4(),
            name: "Support".into(),
            description: None,
            module_id: Uuid::new_v4(),
            module: ModuleKind::Service,
            created_by: admin,
            members: vec![
                Member {
                    user_id: admin,
                    role: Role::Admin,
                    joined_at: now,
                },
                Member {
                    user_id: member,
                    role: Role::Member,
                    joined_at: now,
                },
            ],
            boards: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        Fixture {
            workspace,
            admin,
            member,
            outsider: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_outsider_is_forbidden_everywhere() {
        let f = fixture();
        let err = authorize(&f.workspace, f.outsider, Action::Read).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_member_reads_and_contributes_but_cannot_administer() {
        let f = fixture();
        assert_eq!(authorize(&f.workspace, f.member, Action::Read).unwrap(), Role::Member);
        assert!(authorize(&f.workspace, f.member, Action::Contribute).is_ok());
        assert!(authorize(&f.workspace, f.member, Action::Administer).is_err());
    }

    #[test]
    fn test_item_update_requires_admin_or_assignee() {
        let f = fixture();
        let unassigned = Action::UpdateItem { assignee: None };
        let theirs = Action::UpdateItem { assignee: Some(f.member) };

        assert!(authorize(&f.workspace, f.member, unassigned).is_err());
        assert!(authorize(&f.workspace, f.member, theirs).is_ok());
        assert!(authorize(&f.workspace, f.admin, unassigned).is_ok());
    }

    #[test]
    fn test_item_delete_requires_admin_or_creator() {
        let f = fixture();
        let by_admin = Action::DeleteItem { creator: f.admin };
        let by_member = Action::DeleteItem { creator: f.member };

        assert!(authorize(&f.workspace, f.member, by_admin).is_err());
        assert!(authorize(&f.workspace, f.member, by_member).is_ok());
        assert!(authorize(&f.workspace, f.admin, by_member).is_ok());
    }
}
