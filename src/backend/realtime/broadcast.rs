/**
 * Real-time Event Broadcasting
 *
 * Every successful mutation, whether it came in over REST or the socket,
 * ends with a call to `broadcast_event`. Subscribers (SSE streams and
 * WebSocket sessions) each hold a receiver and apply their own filters.
 *
 * Events are built from the shared `RealtimeEvent` type, scoped either to a
 * workspace or to a single user.
 */

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::shared::{EventAction, EventType, RealtimeEvent};

/// Sender half of the application-wide event channel
///
/// Cloned into every handler through `AppState`.
pub type RealtimeEventBroadcast = broadcast::Sender<RealtimeEvent>;

/// Capacity of the event channel; slower receivers see `Lagged`
pub const CHANNEL_CAPACITY: usize = 1024;

pub fn channel() -> RealtimeEventBroadcast {
    let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
    tx
}

/// Broadcast a real-time event to all subscribers
///
/// Returns the number of receivers that got the event (0 when nobody is
/// listening, which is not an error).
pub fn broadcast_event(broadcast_tx: &RealtimeEventBroadcast, event: RealtimeEvent) -> usize {
    let name = event.name();
    match broadcast_tx.send(event) {
        Ok(subscriber_count) => {
            tracing::debug!("[Realtime] {} sent to {} subscribers", name, subscriber_count);
            subscriber_count
        }
        Err(_) => {
            tracing::debug!("[Realtime] No subscribers for {}", name);
            0
        }
    }
}

/// Serialize `document` and broadcast it as a workspace-scoped event
pub fn publish<T: Serialize>(
    broadcast_tx: &RealtimeEventBroadcast,
    event_type: EventType,
    action: EventAction,
    workspace_id: Uuid,
    document: &T,
) -> usize {
    let payload = match serde_json::to_value(document) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!("[Realtime] Failed to serialize {} payload: {}", event_type.as_str(), e);
            return 0;
        }
    };
    broadcast_event(
        broadcast_tx,
        RealtimeEvent::in_workspace(event_type, action, workspace_id, payload),
    )
}
