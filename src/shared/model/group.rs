//! Group Data Structure
//!
//! A group keeps a separate id-array for every item kind. The JSON field
//! name of each array matches `ItemKind::collection`, which lets the store
//! push and pull ids by field name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::model::ItemKind;

/// Persisted group document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    pub board_id: Uuid,
    #[serde(default)]
    pub items: Vec<Uuid>,
    #[serde(default)]
    pub contacts: Vec<Uuid>,
    #[serde(default)]
    pub deals: Vec<Uuid>,
    #[serde(default)]
    pub leads: Vec<Uuid>,
    #[serde(default)]
    pub projects: Vec<Uuid>,
    #[serde(default)]
    pub sprints: Vec<Uuid>,
    #[serde(default)]
    pub bugs: Vec<Uuid>,
    #[serde(default)]
    pub epics: Vec<Uuid>,
    #[serde(default)]
    pub tickets: Vec<Uuid>,
    #[serde(default)]
    pub incidents: Vec<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Group {
    pub fn new(name: String, color: Option<String>, board_id: Uuid, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            color,
            board_id,
            items: Vec::new(),
            contacts: Vec::new(),
            deals: Vec::new(),
            leads: Vec::new(),
            projects: Vec::new(),
            sprints: Vec::new(),
            bugs: Vec::new(),
            epics: Vec::new(),
            tickets: Vec::new(),
            incidents: Vec::new(),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Ids of the children of one kind, in insertion order
    pub fn children(&self, kind: ItemKind) -> &[Uuid] {
        match kind {
            ItemKind::Item => &self.items,
            ItemKind::Contact => &self.contacts,
            ItemKind::Deal => &self.deals,
            ItemKind::Lead => &self.leads,
            ItemKind::Project => &self.projects,
            ItemKind::Sprint => &self.sprints,
            ItemKind::Bug => &self.bugs,
            ItemKind::Epic => &self.epics,
            ItemKind::Ticket => &self.tickets,
            ItemKind::Incident => &self.incidents,
        }
    }

    /// Every child across all kinds
    pub fn all_children(&self) -> impl Iterator<Item = (ItemKind, Uuid)> + '_ {
        ItemKind::ALL
            .iter()
            .flat_map(move |kind| self.children(*kind).iter().map(move |id| (*kind, *id)))
    }
}

/// Body of `POST /api/boards/{id}/groups`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Body of `PATCH /api/groups/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGroupRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_field_names_match_collections() {
        let group = Group::new("Backlog".into(), None, Uuid::new_v4(), Uuid::new_v4());
        let json = serde_json::to_value(&group).unwrap();
        for kind in ItemKind::ALL {
            assert!(
                json.get(kind.collection()).map(|v| v.is_array()).unwrap_or(false),
                "missing array field {}",
                kind.collection()
            );
        }
    }

    #[test]
    fn test_all_children_spans_kinds() {
        let mut group = Group::new("Backlog".into(), None, Uuid::new_v4(), Uuid::new_v4());
        let bug = Uuid::new_v4();
        let lead = Uuid::new_v4();
        group.bugs.push(bug);
        group.leads.push(lead);
        let children: Vec<_> = group.all_children().collect();
        assert_eq!(children.len(), 2);
        assert!(children.contains(&(ItemKind::Bug, bug)));
        assert!(children.contains(&(ItemKind::Lead, lead)));
    }
}
