/**
 * Server Configuration
 *
 * This module loads the server settings from the environment (after
 * `dotenv` has populated it) and chooses the document store backend.
 *
 * # Configuration Sources
 *
 * | Variable              | Default                   |
 * |-----------------------|---------------------------|
 * | `SERVER_PORT`         | `3000`                    |
 * | `DATABASE_URL`        | unset: in-memory store    |
 * | `JWT_SECRET`          | development secret (warn) |
 * | `GOOGLE_CLIENT_ID`    | unset: Google sign-in off |
 * | `SMTP_HOST`           | unset: email off          |
 * | `SMTP_USERNAME`       |                           |
 * | `SMTP_PASSWORD`       |                           |
 * | `MAIL_FROM`           | `WorkHub <no-reply@localhost>` |
 * | `SLACK_BOT_TOKEN`     | unset: chat off           |
 * | `APP_BASE_URL`        | `http://localhost:3000`   |
 * | `SWEEP_INTERVAL_SECS` | `86400`                   |
 *
 * # Error Handling
 *
 * Malformed values are configuration errors. A database that cannot be
 * reached is not: the server logs it and continues on the in-memory store.
 */

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use thiserror::Error;

use crate::backend::store::{DocumentStore, MemoryStore, PgStore};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 86_400;
const DEV_JWT_SECRET: &str = "workhub-dev-secret-change-in-production";
const DEFAULT_MAIL_FROM: &str = "WorkHub <no-reply@localhost>";
const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Invalid configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} must not be empty")]
    Empty { key: &'static str },

    #[error("{key} requires {requires}")]
    Incomplete {
        key: &'static str,
        requires: &'static str,
    },
}

/// SMTP relay credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub google_client_id: Option<String>,
    pub smtp: Option<SmtpConfig>,
    pub mail_from: String,
    pub slack_bot_token: Option<String>,
    pub app_base_url: String,
    pub sweep_interval: Duration,
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut builder = Self::builder();

        if let Some(port) = var("SERVER_PORT") {
            let port = port.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: "SERVER_PORT",
                value: port.clone(),
            })?;
            builder = builder.port(port);
        }
        if let Some(url) = var("DATABASE_URL") {
            builder = builder.database_url(url);
        }
        match var("JWT_SECRET") {
            Some(secret) => builder = builder.jwt_secret(secret),
            None => tracing::warn!("JWT_SECRET not set, using the development secret"),
        }
        if let Some(client_id) = var("GOOGLE_CLIENT_ID") {
            builder = builder.google_client_id(client_id);
        }
        if let Some(host) = var("SMTP_HOST") {
            builder = builder.smtp(
                host,
                var("SMTP_USERNAME").unwrap_or_default(),
                var("SMTP_PASSWORD").unwrap_or_default(),
            );
        }
        if let Some(from) = var("MAIL_FROM") {
            builder = builder.mail_from(from);
        }
        if let Some(token) = var("SLACK_BOT_TOKEN") {
            builder = builder.slack_bot_token(token);
        }
        if let Some(url) = var("APP_BASE_URL") {
            builder = builder.app_base_url(url);
        }
        if let Some(secs) = var("SWEEP_INTERVAL_SECS") {
            let secs = secs.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "SWEEP_INTERVAL_SECS",
                value: secs.clone(),
            })?;
            builder = builder.sweep_interval(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Link into the web client, e.g. `link("/reset-password?token=..")`
    pub fn link(&self, path: &str) -> String {
        format!("{}{}", self.app_base_url.trim_end_matches('/'), path)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            google_client_id: None,
            smtp: None,
            mail_from: DEFAULT_MAIL_FROM.to_string(),
            slack_bot_token: None,
            app_base_url: DEFAULT_BASE_URL.to_string(),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
        }
    }
}

/// Builder validating the configuration as a whole
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    pub fn google_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.config.google_client_id = Some(client_id.into());
        self
    }

    pub fn smtp(mut self, host: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.smtp = Some(SmtpConfig {
            host: host.into(),
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn mail_from(mut self, from: impl Into<String>) -> Self {
        self.config.mail_from = from.into();
        self
    }

    pub fn slack_bot_token(mut self, token: impl Into<String>) -> Self {
        self.config.slack_bot_token = Some(token.into());
        self
    }

    pub fn app_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.app_base_url = url.into();
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let config = self.config;
        if config.jwt_secret.is_empty() {
            return Err(ConfigError::Empty { key: "JWT_SECRET" });
        }
        if config.sweep_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "SWEEP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }
        if let Some(smtp) = &config.smtp {
            if smtp.username.is_empty() != smtp.password.is_empty() {
                return Err(ConfigError::Incomplete {
                    key: "SMTP_USERNAME",
                    requires: "SMTP_PASSWORD",
                });
            }
        }
        if !config.app_base_url.starts_with("http://") && !config.app_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "APP_BASE_URL",
                value: config.app_base_url,
            });
        }
        if config.mail_from.is_empty() {
            return Err(ConfigError::Empty { key: "MAIL_FROM" });
        }
        Ok(config)
    }
}

/// Pick the document store backend
///
/// Uses PostgreSQL when `DATABASE_URL` is set and reachable, otherwise the
/// in-memory store.
pub async fn load_store(config: &ServerConfig) -> Arc<dyn DocumentStore> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("DATABASE_URL not set. Using the in-memory document store.");
        return Arc::new(MemoryStore::new());
    };

    tracing::info!("Connecting to database...");
    let pool = match PgPool::connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Falling back to the in-memory document store.");
            return Arc::new(MemoryStore::new());
        }
    };

    let store = PgStore::new(pool);
    match store.migrate().await {
        Ok(()) => tracing::info!("Database migrations completed successfully"),
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing without migrations - database might not be up to date");
        }
    }
    Arc::new(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.database_url.is_none());
        assert!(config.smtp.is_none());
        assert_eq!(config.sweep_interval, Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS));
    }

    #[test]
    fn test_reads_all_variables() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("SERVER_PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/workhub"),
            ("JWT_SECRET", "s3cret"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USERNAME", "mailer"),
            ("SMTP_PASSWORD", "pw"),
            ("SLACK_BOT_TOKEN", "xoxb-1"),
            ("APP_BASE_URL", "https://hub.example.com/"),
            ("SWEEP_INTERVAL_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.smtp.as_ref().map(|s| s.host.as_str()), Some("smtp.example.com"));
        assert_eq!(config.slack_bot_token.as_deref(), Some("xoxb-1"));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.link("/reset?token=x"), "https://hub.example.com/reset?token=x");
    }

    #[test]
    fn test_rejects_bad_port() {
        let err = ServerConfig::from_lookup(lookup(&[("SERVER_PORT", "http")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "SERVER_PORT",
                value: "http".into()
            }
        );
    }

    #[test]
    fn test_builder_validation() {
        assert!(ServerConfig::builder().sweep_interval(Duration::ZERO).build().is_err());
        assert!(ServerConfig::builder().app_base_url("localhost").build().is_err());
        assert!(ServerConfig::builder().smtp("smtp.example.com", "user", "").build().is_err());
        assert!(ServerConfig::builder().smtp("localhost", "", "").build().is_ok());
    }

    #[tokio::test]
    async fn test_load_store_without_database() {
        let store = load_store(&ServerConfig::default()).await;
        assert!(store.find_all("modules").await.unwrap().is_empty());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("SERVER_PORT", "4100");
        std::env::set_var("SWEEP_INTERVAL_SECS", "120");
        let config = ServerConfig::from_env();
        std::env::remove_var("SERVER_PORT");
        std::env::remove_var("SWEEP_INTERVAL_SECS");

        let config = config.unwrap();
        assert_eq!(config.port, 4100);
        assert_eq!(config.sweep_interval, Duration::from_secs(120));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_zero_interval() {
        std::env::set_var("SWEEP_INTERVAL_SECS", "0");
        let result = ServerConfig::from_env();
        std::env::remove_var("SWEEP_INTERVAL_SECS");
        assert!(result.is_err());
    }
}
