//! Domain Model
//!
//! The documents persisted by the backend and the payloads used to create
//! and update them:
//!
//! - `Module` - Fixed product-area partition (four kinds, seeded once)
//! - `Workspace` - Top-level container with members and roles
//! - `Board` - Collection of groups within a workspace
//! - `Group` - Holds one id-array per item kind
//! - `Item` - Leaf record (task, bug, lead, ticket, ...)
//! - `User` - Account plus its in-app notifications
//!
//! Parents reference children by id arrays; children point back at their
//! parent with a single id field.

use serde::{Deserialize, Deserializer};

use crate::shared::SharedError;

pub mod module;
pub mod workspace;
pub mod board;
pub mod group;
pub mod item;
pub mod user;

pub use module::{Module, ModuleKind};
pub use workspace::{
    AddMemberRequest, CreateWorkspaceRequest, Member, Role, UpdateMemberRequest,
    UpdateWorkspaceRequest, Workspace,
};
pub use board::{Board, CreateBoardRequest, UpdateBoardRequest};
pub use group::{CreateGroupRequest, Group, UpdateGroupRequest};
pub use item::{
    AssignItemRequest, CreateItemRequest, Item, ItemKind, MoveItemRequest, Priority,
    UpdateItemRequest, CLOSED_STATUSES,
};
pub use user::{Notification, ResetToken, User};

/// Longest accepted display name for workspaces, boards, groups and items
pub const MAX_NAME_LEN: usize = 200;

/// Distinguish a missing field (`None`) from an explicit `null` (`Some(None)`)
///
/// Used with `#[serde(default, deserialize_with = "double_option")]` on patch
/// payloads so clients can clear optional fields.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trim a display name and check it is non-empty and not too long
pub fn validate_name(field: &str, name: &str) -> Result<String, SharedError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(SharedError::validation(field, "cannot be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(SharedError::validation(
            field,
            format!("must be at most {} characters", MAX_NAME_LEN),
        ));
    }
    Ok(trimmed.to_string())
}
