//! Notification fan-out
//!
//! Chat first, email as the fallback, and always an in-app record. External
//! delivery is best-effort; only losing the in-app record is an error.

use std::sync::Arc;

use serde::Serialize;

use super::{ChatNotifier, Mailer};
use crate::backend::auth::users::get_user_by_id;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::realtime::{broadcast_event, RealtimeEventBroadcast};
use crate::backend::store::{collections, DocumentStore};
use crate::shared::model::{Notification, User};
use crate::shared::RealtimeEvent;

/// Which channels delivered a notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub chat: bool,
    pub email: bool,
    pub in_app: bool,
}

/// Delivers notifications to users
#[derive(Clone)]
pub struct Notifier {
    chat: Arc<dyn ChatNotifier>,
    mailer: Arc<dyn Mailer>,
    store: Arc<dyn DocumentStore>,
    realtime: RealtimeEventBroadcast,
}

impl Notifier {
    pub fn new(
        chat: Arc<dyn ChatNotifier>,
        mailer: Arc<dyn Mailer>,
        store: Arc<dyn DocumentStore>,
        realtime: RealtimeEventBroadcast,
    ) -> Self {
        Self {
            chat,
            mailer,
            store,
            realtime,
        }
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    /// Deliver `notification` to `user`
    pub async fn dispatch(&self, user: &User, notification: Notification) -> BackendResult<DispatchReport> {
        let mut report = DispatchReport::default();

        if let Some(chat_id) = user.slack_user_id.as_deref().filter(|_| self.chat.is_enabled()) {
            match self.chat.send(chat_id, &notification).await {
                Ok(()) => report.chat = true,
                Err(e) => tracing::warn!("Chat notification to {} failed, falling back to email: {}", user.id, e),
            }
        }

        if !report.chat && self.mailer.is_enabled() {
            let body = match &notification.link {
                Some(link) => format!("{}\n\n{}", notification.message, link),
                None => notification.message.clone(),
            };
            match self.mailer.send(&user.email, &notification.title, &body).await {
                Ok(()) => report.email = true,
                Err(e) => tracing::warn!("Email notification to {} failed: {}", user.id, e),
            }
        }

        let payload = serde_json::to_value(&notification)?;
        match self
            .store
            .push_keyed(collections::USERS, user.id, "notifications", "id", payload.clone())
            .await?
        {
            None => return Err(BackendError::not_found("user", user.id)),
            Some(pushed) => report.in_app = pushed,
        }

        broadcast_event(&self.realtime, RealtimeEvent::notification(user.id, payload));

        tracing::info!(
            "Notified {} '{}' (chat: {}, email: {})",
            user.id,
            notification.title,
            report.chat,
            report.email
        );
        Ok(report)
    }

    /// Load the user and deliver
    pub async fn notify_user(&self, user_id: uuid::Uuid, notification: Notification) -> BackendResult<DispatchReport> {
        let user = get_user_by_id(self.store.as_ref(), user_id)
            .await?
            .ok_or_else(|| BackendError::not_found("user", user_id))?;
        self.dispatch(&user, notification).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::auth::users::{create_user, save_user};
    use crate::backend::notify::{DisabledChat, DisabledMailer, NotifyError};
    use crate::backend::realtime::broadcast::channel;
    use crate::backend::store::MemoryStore;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeChat {
        fail: bool,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatNotifier for FakeChat {
        async fn send(&self, chat_user_id: &str, _n: &Notification) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Rejected("channel_not_found".into()));
            }
            self.sent.lock().unwrap().push(chat_user_id.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeMailer {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Mailer for FakeMailer {
        async fn send(&self, to: &str, _subject: &str, _body: &str) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(to.to_string());
            Ok(())
        }
    }

    async fn user_with_slack(store: &MemoryStore) -> User {
        let mut user = create_user(store, "frank".into(), "frank@example.com".into(), None)
            .await
            .unwrap();
        user.slack_user_id = Some("U42".into());
        save_user(store, &mut user).await.unwrap();
        user
    }

    #[tokio::test]
    async fn test_chat_success_skips_email() {
        let store = Arc::new(MemoryStore::new());
        let user = user_with_slack(&store).await;
        let chat = Arc::new(FakeChat::default());
        let mailer = Arc::new(FakeMailer::default());
        let notifier = Notifier::new(chat.clone(), mailer.clone(), store.clone(), channel());

        let report = notifier.dispatch(&user, Notification::new("Hi", "there")).await.unwrap();
        assert_eq!(
            report,
            DispatchReport {
                chat: true,
                email: false,
                in_app: true
            }
        );
        assert_eq!(*chat.sent.lock().unwrap(), vec!["U42".to_string()]);
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chat_failure_falls_back_to_email() {
        let store = Arc::new(MemoryStore::new());
        let user = user_with_slack(&store).await;
        let chat = Arc::new(FakeChat {
            fail: true,
            ..Default::default()
        });
        let mailer = Arc::new(FakeMailer::default());
        let notifier = Notifier::new(chat, mailer.clone(), store.clone(), channel());

        let report = notifier.dispatch(&user, Notification::new("Overdue", "BUG-7")).await.unwrap();
        assert!(!report.chat);
        assert!(report.email);
        assert!(report.in_app);
        assert_eq!(*mailer.sent.lock().unwrap(), vec!["frank@example.com".to_string()]);

        let stored = get_user_by_id(store.as_ref(), user.id).await.unwrap().unwrap();
        assert_eq!(stored.notifications.len(), 1);
        assert_eq!(stored.notifications[0].title, "Overdue");
    }

    #[tokio::test]
    async fn test_in_app_even_when_all_channels_disabled() {
        let store = Arc::new(MemoryStore::new());
        let user = create_user(store.as_ref(), "gina".into(), "gina@example.com".into(), None)
            .await
            .unwrap();
        let realtime = channel();
        let mut rx = realtime.subscribe();
        let notifier = Notifier::new(Arc::new(DisabledChat), Arc::new(DisabledMailer), store.clone(), realtime);

        let report = notifier.notify_user(user.id, Notification::new("Welcome", "!")).await.unwrap();
        assert_eq!(
            report,
            DispatchReport {
                chat: false,
                email: false,
                in_app: true
            }
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(event.user_id, Some(user.id));
        assert_eq!(event.payload["title"], "Welcome");
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Notifier::new(Arc::new(DisabledChat), Arc::new(DisabledMailer), store, channel());
        let err = notifier
            .notify_user(uuid::Uuid::new_v4(), Notification::new("x", "y"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }
}
