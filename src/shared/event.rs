/**
 * Real-time Event System
 *
 * This module defines the events published whenever the hierarchy changes
 * or a user receives a notification. Events are scoped either to a
 * workspace (visible to its members) or addressed to a single user.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of document the event is about
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Workspace,
    Member,
    Board,
    Group,
    Item,
    Notification,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::Member => "member",
            Self::Board => "board",
            Self::Group => "group",
            Self::Item => "item",
            Self::Notification => "notification",
        }
    }

    /// Parse a filter value from a query string
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "workspace" => Some(Self::Workspace),
            "member" => Some(Self::Member),
            "board" => Some(Self::Board),
            "group" => Some(Self::Group),
            "item" => Some(Self::Item),
            "notification" => Some(Self::Notification),
            _ => None,
        }
    }
}

/// What happened to the document
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    Created,
    Updated,
    Deleted,
    Moved,
    Assigned,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Moved => "moved",
            Self::Assigned => "assigned",
        }
    }
}

/// Real-time event broadcast to subscribers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RealtimeEvent {
    /// Type of document
    pub event_type: EventType,
    /// Mutation that produced the event
    pub action: EventAction,
    /// Workspace whose members may see this event
    pub workspace_id: Option<Uuid>,
    /// Single recipient for user-addressed events
    pub user_id: Option<Uuid>,
    /// Event payload (usually the affected document)
    pub payload: serde_json::Value,
    /// RFC3339 timestamp when the event occurred
    pub timestamp: String,
}

impl RealtimeEvent {
    /// Create an event scoped to a workspace
    pub fn in_workspace(
        event_type: EventType,
        action: EventAction,
        workspace_id: Uuid,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_type,
            action,
            workspace_id: Some(workspace_id),
            user_id: None,
            payload,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a notification event addressed to one user
    pub fn notification(user_id: Uuid, payload: serde_json::Value) -> Self {
        Self {
            event_type: EventType::Notification,
            action: EventAction::Created,
            workspace_id: None,
            user_id: Some(user_id),
            payload,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Dotted event name, e.g. `board.created`
    pub fn name(&self) -> String {
        format!("{}.{}", self.event_type.as_str(), self.action.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_in_workspace() {
        let workspace_id = Uuid::new_v4();
        let event = RealtimeEvent::in_workspace(
            EventType::Board,
            EventAction::Created,
            workspace_id,
            serde_json::json!({"name": "Roadmap"}),
        );
        assert_eq!(event.workspace_id, Some(workspace_id));
        assert!(event.user_id.is_none());
        assert_eq!(event.name(), "board.created");
        assert!(!event.timestamp.is_empty());
    }

    #[test]
    fn test_notification_event_is_addressed() {
        let user_id = Uuid::new_v4();
        let event = RealtimeEvent::notification(user_id, serde_json::json!({"title": "Hi"}));
        assert_eq!(event.user_id, Some(user_id));
        assert!(event.workspace_id.is_none());
        assert_eq!(event.name(), "notification.created");
    }

    #[test]
    fn test_event_type_parse() {
        assert_eq!(EventType::parse(" Item "), Some(EventType::Item));
        assert_eq!(EventType::parse("typing"), None);
    }

    #[test]
    fn test_event_serialization_uses_snake_case() {
        let event = RealtimeEvent::notification(Uuid::new_v4(), serde_json::json!({}));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "notification");
        assert_eq!(json["action"], "created");
    }
}
