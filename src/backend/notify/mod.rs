//! Notify Module
//!
//! Delivers notifications to users over external chat (Slack), email
//! (SMTP) and the in-app inbox stored on the user document.
//!
//! # Module Structure
//!
//! ```text
//! notify/
//! ├── mod.rs       - Module exports, errors and channel setup
//! ├── chat.rs      - ChatNotifier trait and the Slack client
//! ├── mail.rs      - Mailer trait and the SMTP transport
//! ├── dispatch.rs  - Notifier: chat → email fallback → in-app
//! └── handlers.rs  - Inbox endpoints
//! ```
//!
//! Chat and email are configured independently; a missing `SLACK_BOT_TOKEN`
//! or `SMTP_HOST` selects the disabled implementation for that channel.

use std::sync::Arc;

use thiserror::Error;

pub mod chat;
pub mod mail;
pub mod dispatch;
pub mod handlers;

pub use chat::{ChatNotifier, DisabledChat, SlackNotifier};
pub use dispatch::{DispatchReport, Notifier};
pub use mail::{DisabledMailer, Mailer, SmtpMailer};

use crate::backend::server::config::ServerConfig;

/// External delivery failures
///
/// These never reach HTTP clients; the dispatcher logs them and moves on.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("{channel} delivery is not configured")]
    Disabled { channel: &'static str },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote service accepted the call but refused the message
    #[error("Rejected by remote service: {0}")]
    Rejected(String),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Invalid message: {0}")]
    Message(#[from] lettre::error::Error),
}

/// Build the chat backend from configuration
pub fn chat_from_config(config: &ServerConfig) -> Arc<dyn ChatNotifier> {
    match &config.slack_bot_token {
        Some(token) => {
            tracing::info!("Slack notifications enabled");
            Arc::new(SlackNotifier::new(token.clone()))
        }
        None => {
            tracing::warn!("SLACK_BOT_TOKEN not set. Chat notifications disabled.");
            Arc::new(DisabledChat)
        }
    }
}

/// Build the mail backend from configuration
pub fn mailer_from_config(config: &ServerConfig) -> Arc<dyn Mailer> {
    let Some(smtp) = &config.smtp else {
        tracing::warn!("SMTP_HOST not set. Email notifications disabled.");
        return Arc::new(DisabledMailer);
    };
    match SmtpMailer::new(smtp, &config.mail_from) {
        Ok(mailer) => {
            tracing::info!("SMTP relay {} configured", smtp.host);
            Arc::new(mailer)
        }
        Err(e) => {
            tracing::error!("Failed to configure SMTP relay {}: {}", smtp.host, e);
            Arc::new(DisabledMailer)
        }
    }
}
