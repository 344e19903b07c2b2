//! Item Data Structure
//!
//! Every leaf record shares one shape regardless of kind. Kind-specific
//! attributes (a deal's value, a contact's phone number, ...) live in the
//! free-form `fields` object. Each kind is stored in its own collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::shared::model::double_option;
use crate::shared::SharedError;

/// Statuses that take an item out of the overdue sweep
pub const CLOSED_STATUSES: &[&str] = &["done", "closed", "resolved", "won", "lost", "archived"];

/// Kind of leaf record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Generic task
    Item,
    Contact,
    Deal,
    Lead,
    Project,
    Sprint,
    Bug,
    Epic,
    Ticket,
    Incident,
}

impl ItemKind {
    pub const ALL: [ItemKind; 10] = [
        ItemKind::Item,
        ItemKind::Contact,
        ItemKind::Deal,
        ItemKind::Lead,
        ItemKind::Project,
        ItemKind::Sprint,
        ItemKind::Bug,
        ItemKind::Epic,
        ItemKind::Ticket,
        ItemKind::Incident,
    ];

    /// `collection()` of every kind, in `ALL` order
    pub const COLLECTIONS: [&'static str; 10] = [
        "items", "contacts", "deals", "leads", "projects", "sprints", "bugs", "epics", "tickets", "incidents",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Item => "item",
            ItemKind::Contact => "contact",
            ItemKind::Deal => "deal",
            ItemKind::Lead => "lead",
            ItemKind::Project => "project",
            ItemKind::Sprint => "sprint",
            ItemKind::Bug => "bug",
            ItemKind::Epic => "epic",
            ItemKind::Ticket => "ticket",
            ItemKind::Incident => "incident",
        }
    }

    /// Collection name, also the id-array field on `Group`
    pub fn collection(&self) -> &'static str {
        match self {
            ItemKind::Item => "items",
            ItemKind::Contact => "contacts",
            ItemKind::Deal => "deals",
            ItemKind::Lead => "leads",
            ItemKind::Project => "projects",
            ItemKind::Sprint => "sprints",
            ItemKind::Bug => "bugs",
            ItemKind::Epic => "epics",
            ItemKind::Ticket => "tickets",
            ItemKind::Incident => "incidents",
        }
    }

    /// Status assigned when a create payload omits one
    pub fn default_status(&self) -> &'static str {
        match self {
            ItemKind::Item | ItemKind::Project | ItemKind::Sprint | ItemKind::Epic => "todo",
            ItemKind::Bug | ItemKind::Ticket | ItemKind::Incident => "open",
            ItemKind::Lead => "new",
            ItemKind::Deal => "prospect",
            ItemKind::Contact => "active",
        }
    }
}

impl FromStr for ItemKind {
    type Err = SharedError;

    /// Accepts singular or plural names; `task`/`tasks` map to `Item`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        if lowered == "task" || lowered == "tasks" {
            return Ok(ItemKind::Item);
        }
        ItemKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered || kind.collection() == lowered)
            .ok_or_else(|| SharedError::unknown("item kind", s))
    }
}

/// Item priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// Persisted item document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: Uuid,
    pub kind: ItemKind,
    pub group_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub assignee: Option<Uuid>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Kind-specific attributes
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Last time the overdue sweep notified the assignee
    #[serde(default)]
    pub overdue_notified_at: Option<DateTime<Utc>>,
}

impl Item {
    pub fn is_closed(&self) -> bool {
        let status = self.status.to_lowercase();
        CLOSED_STATUSES.contains(&status.as_str())
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.is_closed() && self.due_date.map(|due| due < now).unwrap_or(false)
    }
}

/// Body of `POST /api/groups/{id}/items/{kind}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub assignee: Option<Uuid>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Body of `PATCH /api/items/{kind}/{id}`
///
/// `fields` entries are merged key by key; a `null` value removes the key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "double_option")]
    pub assignee: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(default)]
    pub fields: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Body of `POST /api/items/{kind}/{id}/move`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveItemRequest {
    pub group_id: Uuid,
}

/// Body of `POST /api/items/{kind}/{id}/assign`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignItemRequest {
    pub assignee: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn item(status: &str, due: Option<DateTime<Utc>>) -> Item {
        let now = Utc::now();
        Item {
            id: Uuid::new_v4(),
            kind: ItemKind::Bug,
            group_id: Uuid::new_v4(),
            name: "Crash on save".to_string(),
            description: None,
            status: status.to_string(),
            priority: Priority::High,
            assignee: None,
            due_date: due,
            fields: serde_json::Map::new(),
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            overdue_notified_at: None,
        }
    }

    #[test]
    fn test_collections_follow_kinds() {
        let derived: Vec<&str> = ItemKind::ALL.iter().map(|k| k.collection()).collect();
        assert_eq!(derived, ItemKind::COLLECTIONS.to_vec());
    }

    #[test]
    fn test_kind_parsing_accepts_aliases() {
        assert_eq!("tasks".parse::<ItemKind>().unwrap(), ItemKind::Item);
        assert_eq!("Bugs".parse::<ItemKind>().unwrap(), ItemKind::Bug);
        assert_eq!("incident".parse::<ItemKind>().unwrap(), ItemKind::Incident);
        assert!("widgets".parse::<ItemKind>().is_err());
    }

    #[test]
    fn test_overdue_requires_open_status_and_past_due() {
        let now = Utc::now();
        assert!(item("open", Some(now - Duration::hours(1))).is_overdue(now));
        assert!(!item("Resolved", Some(now - Duration::hours(1))).is_overdue(now));
        assert!(!item("open", Some(now + Duration::hours(1))).is_overdue(now));
        assert!(!item("open", None).is_overdue(now));
    }

    #[test]
    fn test_update_request_can_clear_assignee() {
        let patch: UpdateItemRequest =
            serde_json::from_value(serde_json::json!({"assignee": null})).unwrap();
        assert_eq!(patch.assignee, Some(None));
        assert!(patch.due_date.is_none());
    }
}
