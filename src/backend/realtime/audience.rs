/**
 * Event Audience
 *
 * Decides which broadcast events a connected user may see: events addressed
 * to them, and workspace events for workspaces they belong to. Membership is
 * loaded once at connect time and then kept current from the workspace and
 * member events flowing through the same channel.
 */

use std::collections::HashSet;

use uuid::Uuid;

use crate::backend::error::BackendResult;
use crate::backend::hierarchy::workspaces::list_workspaces_for;
use crate::backend::store::DocumentStore;
use crate::shared::model::Workspace;
use crate::shared::{EventAction, EventType, RealtimeEvent};

#[derive(Debug, Clone)]
pub struct Audience {
    user_id: Uuid,
    workspaces: HashSet<Uuid>,
}

impl Audience {
    pub fn new(user_id: Uuid, workspaces: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            user_id,
            workspaces: workspaces.into_iter().collect(),
        }
    }

    /// Load the user's current workspace memberships
    pub async fn load(store: &dyn DocumentStore, user_id: Uuid) -> BackendResult<Self> {
        let workspaces = list_workspaces_for(store, user_id).await?;
        Ok(Self::new(user_id, workspaces.into_iter().map(|w| w.id)))
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn is_member(&self, workspace_id: Uuid) -> bool {
        self.workspaces.contains(&workspace_id)
    }

    /// Whether `event` should reach this user
    ///
    /// A user who just lost access still receives the event that removed
    /// them, so clients can drop the workspace from view.
    pub fn admits(&mut self, event: &RealtimeEvent) -> bool {
        if let Some(recipient) = event.user_id {
            return recipient == self.user_id;
        }
        let Some(workspace_id) = event.workspace_id else {
            return false;
        };

        let was_member = self.is_member(workspace_id);
        if matches!(event.event_type, EventType::Workspace | EventType::Member) {
            self.track(workspace_id, event);
        }
        was_member || self.is_member(workspace_id)
    }

    fn track(&mut self, workspace_id: Uuid, event: &RealtimeEvent) {
        if event.event_type == EventType::Workspace && event.action == EventAction::Deleted {
            self.workspaces.remove(&workspace_id);
            return;
        }
        match serde_json::from_value::<Workspace>(event.payload.clone()) {
            Ok(workspace) if workspace.is_member(self.user_id) => {
                self.workspaces.insert(workspace_id);
            }
            Ok(_) => {
                self.workspaces.remove(&workspace_id);
            }
            Err(e) => tracing::warn!("[Realtime] Unreadable workspace payload in {}: {}", event.name(), e),
        }
    }
}
