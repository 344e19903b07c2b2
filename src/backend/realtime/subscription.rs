/**
 * Real-time Subscription Handler
 *
 * Server-Sent Events stream for the `/realtime` endpoint. Each subscriber
 * sees only the events its user is allowed to see (see `Audience`),
 * optionally narrowed further with query filters.
 *
 * # Query Parameters
 *
 * - `token` - JWT (required; `EventSource` cannot set headers)
 * - `workspace` - Only events for this workspace
 * - `types` - Comma-separated event types, e.g. `?types=board,item`
 *
 * # Connection Management
 *
 * - Connections are kept alive using the SSE keep-alive mechanism
 * - Lagged events are logged but don't cause connection drops
 */

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream;
use serde::Deserialize;
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tokio_stream::Stream;
use uuid::Uuid;

use crate::backend::error::BackendResult;
use crate::backend::middleware::authenticate_token;
use crate::backend::realtime::audience::Audience;
use crate::backend::server::state::AppState;
use crate::shared::{EventType, RealtimeEvent};

#[derive(Debug, Deserialize)]
pub struct SubscriptionQuery {
    pub token: String,
    #[serde(default)]
    pub workspace: Option<Uuid>,
    #[serde(default)]
    pub types: Option<String>,
}

/// Per-connection filter on top of the audience check
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub workspace: Option<Uuid>,
    pub types: Option<Vec<EventType>>,
}

impl EventFilter {
    /// Unknown type names are ignored; an empty list means no type filter
    pub fn from_query(workspace: Option<Uuid>, types: Option<&str>) -> Self {
        let types = types
            .map(|list| list.split(',').filter_map(EventType::parse).collect::<Vec<_>>())
            .filter(|types| !types.is_empty());
        Self { workspace, types }
    }

    pub fn matches(&self, event: &RealtimeEvent) -> bool {
        if let Some(types) = &self.types {
            if !types.contains(&event.event_type) {
                return false;
            }
        }
        match (self.workspace, event.workspace_id) {
            (Some(wanted), Some(actual)) => wanted == actual,
            // Addressed events carry no workspace and pass a workspace filter
            (Some(_), None) => event.user_id.is_some(),
            (None, _) => true,
        }
    }
}

struct Subscriber {
    rx: Receiver<RealtimeEvent>,
    audience: Audience,
    filter: EventFilter,
}

/// Handle real-time subscription (GET /realtime)
///
/// # Errors
///
/// * `401 Unauthorized` - Missing, invalid or expired token
///
/// # Example Response
///
/// ```http
/// HTTP/1.1 200 OK
/// Content-Type: text/event-stream
///
/// event: board.created
/// data: {"event_type":"board","action":"created","workspace_id":"...","payload":{...},...}
/// ```
pub async fn handle_realtime_subscription(
    State(state): State<AppState>,
    Query(query): Query<SubscriptionQuery>,
) -> BackendResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let user = authenticate_token(&state, &query.token).await?;
    let filter = EventFilter::from_query(query.workspace, query.types.as_deref());
    tracing::info!("[Realtime] {} subscribed with filter {:?}", user.user_id, filter);

    // Subscribe before loading memberships so nothing published in between is missed
    let rx = state.realtime_broadcast.subscribe();
    let audience = Audience::load(state.store.as_ref(), user.user_id).await?;

    let stream = stream::unfold(Subscriber { rx, audience, filter }, |mut sub| async move {
        loop {
            match sub.rx.recv().await {
                Ok(event) => {
                    // Audience first: it must see membership changes even when filtered out
                    if !sub.audience.admits(&event) || !sub.filter.matches(&event) {
                        continue;
                    }
                    let event_data = match serde_json::to_string(&event) {
                        Ok(data) => data,
                        Err(e) => {
                            tracing::error!("[Realtime] Failed to serialize event: {:?}", e);
                            continue;
                        }
                    };
                    let sse_event = Event::default().event(event.name()).data(event_data);
                    return Some((Ok(sse_event), sub));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[Realtime] Subscriber {} lagged, skipped {} events", sub.audience.user_id(), skipped);
                    continue;
                }
                Err(RecvError::Closed) => {
                    tracing::info!("[Realtime] Broadcast channel closed, ending stream");
                    return None;
                }
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::EventAction;
    use serde_json::json;

    #[test]
    fn test_filter_parses_known_types() {
        let filter = EventFilter::from_query(None, Some("board, item,bogus"));
        assert_eq!(filter.types, Some(vec![EventType::Board, EventType::Item]));

        let empty = EventFilter::from_query(None, Some("bogus"));
        assert_eq!(empty.types, None);
    }

    #[test]
    fn test_filter_by_workspace_and_type() {
        let ws = Uuid::new_v4();
        let filter = EventFilter::from_query(Some(ws), Some("item"));

        let item = RealtimeEvent::in_workspace(EventType::Item, EventAction::Created, ws, json!({}));
        let board = RealtimeEvent::in_workspace(EventType::Board, EventAction::Created, ws, json!({}));
        let elsewhere = RealtimeEvent::in_workspace(EventType::Item, EventAction::Created, Uuid::new_v4(), json!({}));

        assert!(filter.matches(&item));
        assert!(!filter.matches(&board));
        assert!(!filter.matches(&elsewhere));
    }

    #[test]
    fn test_workspace_filter_keeps_addressed_events() {
        let filter = EventFilter::from_query(Some(Uuid::new_v4()), None);
        assert!(filter.matches(&RealtimeEvent::notification(Uuid::new_v4(), json!({}))));
    }
}
