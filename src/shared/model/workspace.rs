//! Workspace Data Structure
//!
//! A workspace belongs to one module, owns an ordered list of boards and
//! carries its member list. The creator is always treated as an admin, even
//! if the member entry was edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::shared::model::{double_option, ModuleKind};
use crate::shared::SharedError;

/// Role of a workspace member
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Member,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }
}

impl FromStr for Role {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "member" => Ok(Role::Member),
            other => Err(SharedError::unknown("role", other)),
        }
    }
}

/// Workspace membership entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Member {
    pub user_id: Uuid,
    #[serde(default)]
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

/// Persisted workspace document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Workspace {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub module_id: Uuid,
    pub module: ModuleKind,
    pub created_by: Uuid,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub boards: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workspace {
    /// Role of `user_id` in this workspace, if any
    pub fn role_of(&self, user_id: Uuid) -> Option<Role> {
        if self.created_by == user_id {
            return Some(Role::Admin);
        }
        self.members
            .iter()
            .find(|m| m.user_id == user_id)
            .map(|m| m.role)
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.role_of(user_id).is_some()
    }

    pub fn is_admin(&self, user_id: Uuid) -> bool {
        self.role_of(user_id) == Some(Role::Admin)
    }
}

/// Body of `POST /api/workspaces`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkspaceRequest {
    pub module: ModuleKind,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `PATCH /api/workspaces/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateWorkspaceRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

/// Body of `POST /api/workspaces/{id}/members`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub role: Role,
}

/// Body of `PATCH /api/workspaces/{id}/members/{user_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: Role,
}
