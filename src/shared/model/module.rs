//! Product Modules
//!
//! Workspaces are partitioned by product area. The set of modules is fixed;
//! one document per kind is seeded at startup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::shared::model::ItemKind;
use crate::shared::SharedError;

/// One of the four product areas
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Workmanagement,
    Crm,
    Dev,
    Service,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 4] = [
        ModuleKind::Workmanagement,
        ModuleKind::Crm,
        ModuleKind::Dev,
        ModuleKind::Service,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Workmanagement => "workmanagement",
            ModuleKind::Crm => "crm",
            ModuleKind::Dev => "dev",
            ModuleKind::Service => "service",
        }
    }

    /// Human-facing module name
    pub fn display_name(&self) -> &'static str {
        match self {
            ModuleKind::Workmanagement => "Work Management",
            ModuleKind::Crm => "CRM",
            ModuleKind::Dev => "Dev",
            ModuleKind::Service => "Service",
        }
    }

    /// Item kinds that may be created in workspaces of this module
    pub fn item_kinds(&self) -> &'static [ItemKind] {
        match self {
            ModuleKind::Workmanagement => &[ItemKind::Item, ItemKind::Project],
            ModuleKind::Crm => &[ItemKind::Contact, ItemKind::Deal, ItemKind::Lead],
            ModuleKind::Dev => &[ItemKind::Item, ItemKind::Sprint, ItemKind::Bug, ItemKind::Epic],
            ModuleKind::Service => &[ItemKind::Ticket, ItemKind::Incident],
        }
    }

    pub fn admits(&self, kind: ItemKind) -> bool {
        self.item_kinds().contains(&kind)
    }
}

impl FromStr for ModuleKind {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "workmanagement" | "work_management" => Ok(ModuleKind::Workmanagement),
            "crm" => Ok(ModuleKind::Crm),
            "dev" => Ok(ModuleKind::Dev),
            "service" => Ok(ModuleKind::Service),
            other => Err(SharedError::unknown("module", other)),
        }
    }
}

/// Persisted module document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Module {
    pub id: Uuid,
    pub kind: ModuleKind,
    pub name: String,
    /// Workspaces belonging to this module
    #[serde(default)]
    pub workspaces: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Module {
    pub fn new(kind: ModuleKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name: kind.display_name().to_string(),
            workspaces: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_kind_round_trip_through_str() {
        for kind in ModuleKind::ALL {
            assert_eq!(kind.as_str().parse::<ModuleKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_module_affinity() {
        assert!(ModuleKind::Crm.admits(ItemKind::Lead));
        assert!(!ModuleKind::Crm.admits(ItemKind::Bug));
        assert!(ModuleKind::Dev.admits(ItemKind::Item));
        assert!(ModuleKind::Service.admits(ItemKind::Incident));
    }

    #[test]
    fn test_unknown_module() {
        assert!("marketing".parse::<ModuleKind>().is_err());
    }
}
