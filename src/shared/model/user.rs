//! User Data Structure
//!
//! Users live in the document store next to the hierarchy. In-app
//! notifications are appended to the user document itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pending password reset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResetToken {
    /// Hex SHA-256 of the token sent by email
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// In-app notification record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            message: message.into(),
            link: None,
            read: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Persisted user document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Unique, 3-30 chars, starts with a letter
    pub username: String,
    /// Lower-cased, unique
    pub email: String,
    /// Bcrypt hash; absent for accounts created through Google sign-in
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub google_id: Option<String>,
    /// Slack member id used for chat notifications
    #[serde(default)]
    pub slack_user_id: Option<String>,
    #[serde(default)]
    pub reset_token: Option<ResetToken>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn unread_count(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }
}
