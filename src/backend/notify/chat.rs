//! External chat delivery
//!
//! Slack is the only chat backend. Users opt in by having a Slack member id
//! on their account; the bot posts a direct message to that id.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::NotifyError;
use crate::shared::model::Notification;

pub const SLACK_API_BASE: &str = "https://slack.com/api";

/// Sends a notification to a chat identity
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn send(&self, chat_user_id: &str, notification: &Notification) -> Result<(), NotifyError>;
}

/// Used when no bot token is configured
#[derive(Debug, Default, Clone)]
pub struct DisabledChat;

#[async_trait]
impl ChatNotifier for DisabledChat {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn send(&self, _chat_user_id: &str, _notification: &Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Disabled { channel: "chat" })
    }
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Slack `chat.postMessage` client
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    client: Client,
    token: String,
    api_base: String,
}

impl SlackNotifier {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_base(token, SLACK_API_BASE)
    }

    pub fn with_api_base(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            api_base: api_base.into(),
        }
    }

    fn render(notification: &Notification) -> String {
        match &notification.link {
            Some(link) => format!("*{}*\n{}\n<{}>", notification.title, notification.message, link),
            None => format!("*{}*\n{}", notification.title, notification.message),
        }
    }
}

#[async_trait]
impl ChatNotifier for SlackNotifier {
    async fn send(&self, chat_user_id: &str, notification: &Notification) -> Result<(), NotifyError> {
        let url = format!("{}/chat.postMessage", self.api_base.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({
                "channel": chat_user_id,
                "text": Self::render(notification),
            }))
            .send()
            .await?
            .error_for_status()?;

        // Slack reports most failures as 200 with `ok: false`
        let body: SlackResponse = response.json().await?;
        if body.ok {
            Ok(())
        } else {
            Err(NotifyError::Rejected(
                body.error.unwrap_or_else(|| "unknown_error".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_chat_refuses() {
        let chat = DisabledChat;
        assert!(!chat.is_enabled());
        let err = chat.send("U123", &Notification::new("t", "m")).await.unwrap_err();
        assert!(matches!(err, NotifyError::Disabled { channel: "chat" }));
    }

    #[test]
    fn test_render_includes_link() {
        let n = Notification::new("Assigned", "You own BUG-1").with_link("http://localhost/items/bug/1");
        let text = SlackNotifier::render(&n);
        assert!(text.starts_with("*Assigned*"));
        assert!(text.contains("<http://localhost/items/bug/1>"));
    }

    #[test]
    fn test_slack_error_body() {
        let body: SlackResponse = serde_json::from_str(r#"{"ok":false,"error":"channel_not_found"}"#).unwrap();
        assert!(!body.ok);
        assert_eq!(body.error.as_deref(), Some("channel_not_found"));
    }
}
