//! Overdue Sweep
//!
//! A background task that scans every item collection on a fixed interval
//! and notifies the assignee of each open item whose due date has passed.
//!
//! An item is notified at most once per interval: after notifying, the
//! sweep stamps `overdue_notified_at`, and an item stamped less than one
//! interval ago is skipped. Changing the due date or the assignee clears
//! the stamp.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Map};
use tokio::task::JoinHandle;

use crate::backend::error::BackendResult;
use crate::backend::server::state::AppState;
use crate::backend::store::document::{load_all, update_fields};
use crate::shared::model::{Item, ItemKind, Notification};

fn recently_notified(item: &Item, now: DateTime<Utc>, interval: Duration) -> bool {
    let Some(stamp) = item.overdue_notified_at else {
        return false;
    };
    match chrono::Duration::from_std(interval) {
        Ok(interval) => now - stamp < interval,
        Err(_) => true,
    }
}

fn overdue_notification(state: &AppState, item: &Item, now: DateTime<Utc>) -> Notification {
    let late = item
        .due_date
        .map(|due| (now - due).num_days())
        .filter(|days| *days > 0)
        .map(|days| format!(" ({} days late)", days))
        .unwrap_or_default();
    Notification::new(
        format!("Overdue {}", item.kind.as_str()),
        format!("\"{}\" is past its due date{}", item.name, late),
    )
    .with_link(state.config.link(&format!("/items/{}/{}", item.kind.as_str(), item.id)))
}

/// Run one sweep as of `now`; returns the number of notifications sent
pub async fn run_overdue_sweep(state: &AppState, now: DateTime<Utc>) -> BackendResult<usize> {
    let store = state.store.as_ref();
    let interval = state.config.sweep_interval;
    let mut sent = 0;

    for kind in ItemKind::ALL {
        let items: Vec<Item> = load_all(store, kind.collection()).await?;
        for item in items {
            let Some(assignee) = item.assignee else {
                continue;
            };
            if !item.is_overdue(now) || recently_notified(&item, now, interval) {
                continue;
            }

            let notification = overdue_notification(state, &item, now);
            match state.notifier.notify_user(assignee, notification).await {
                Ok(_) => {
                    sent += 1;
                    // Stamp only; the rest of `item` may already be stale
                    let mut fields = Map::new();
                    fields.insert("overdue_notified_at".into(), json!(now));
                    update_fields::<Item>(store, kind.collection(), item.id, fields).await?;
                }
                Err(e) => tracing::warn!("Overdue notice for {} {} failed: {}", kind.as_str(), item.id, e),
            }
        }
    }

    tracing::info!("Overdue sweep sent {} notifications", sent);
    Ok(sent)
}

/// Spawn the periodic sweep
///
/// The first tick fires immediately, so a restart catches up right away.
pub fn spawn_overdue_sweep(state: AppState) -> JoinHandle<()> {
    let period = state.config.sweep_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(e) = run_overdue_sweep(&state, Utc::now()).await {
                tracing::error!("Overdue sweep failed: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use uuid::Uuid;

    fn item(notified: Option<DateTime<Utc>>) -> Item {
        let now = Utc::now();
        Item {
            id: Uuid::new_v4(),
            kind: ItemKind::Ticket,
            group_id: Uuid::new_v4(),
            name: "Printer".into(),
            description: None,
            status: "open".into(),
            priority: Default::default(),
            assignee: Some(Uuid::new_v4()),
            due_date: Some(now - ChronoDuration::days(2)),
            fields: Default::default(),
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            overdue_notified_at: notified,
        }
    }

    #[test]
    fn test_recently_notified_window() {
        let now = Utc::now();
        let day = Duration::from_secs(86_400);
        assert!(!recently_notified(&item(None), now, day));
        assert!(recently_notified(&item(Some(now - ChronoDuration::hours(3))), now, day));
        assert!(!recently_notified(&item(Some(now - ChronoDuration::hours(25))), now, day));
    }
}
