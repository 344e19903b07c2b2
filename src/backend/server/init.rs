/**
 * Server Initialization
 *
 * This module handles the initialization and setup of the Axum HTTP server,
 * including state creation, store selection and route configuration.
 *
 * # Initialization Process
 *
 * 1. Pick the document store (PostgreSQL or in-memory) and run migrations
 * 2. Build the notification channels and identity verifier from config
 * 3. Create the realtime broadcast channel and `AppState`
 * 4. Seed the product modules
 * 5. Create the router and start the overdue sweep
 */

use std::sync::Arc;

use axum::Router;

use crate::backend::auth::oauth::{GoogleVerifier, IdentityVerifier};
use crate::backend::error::BackendResult;
use crate::backend::hierarchy::modules::seed_modules;
use crate::backend::notify::{chat_from_config, mailer_from_config, ChatNotifier, Mailer, Notifier};
use crate::backend::realtime::broadcast;
use crate::backend::routes::create_router;
use crate::backend::server::config::{load_store, ServerConfig};
use crate::backend::server::state::AppState;
use crate::backend::store::DocumentStore;
use crate::backend::sweep::spawn_overdue_sweep;

/// Assemble `AppState` from its parts
///
/// Tests call this directly with an in-memory store and fake channels.
pub fn build_state(
    config: ServerConfig,
    store: Arc<dyn DocumentStore>,
    chat: Arc<dyn ChatNotifier>,
    mailer: Arc<dyn Mailer>,
    identity: Arc<dyn IdentityVerifier>,
) -> AppState {
    let realtime_broadcast = broadcast::channel();
    let notifier = Notifier::new(chat, mailer, store.clone(), realtime_broadcast.clone());
    AppState {
        store,
        realtime_broadcast,
        notifier,
        identity,
        config: Arc::new(config),
    }
}

/// Seed the store and build the router for an existing state
pub async fn create_app_from_state(app_state: AppState) -> BackendResult<Router<()>> {
    let modules = seed_modules(app_state.store.as_ref()).await?;
    tracing::info!("{} product modules available", modules.len());
    Ok(create_router(app_state))
}

/// Create and configure the Axum application
///
/// The store falls back to memory when the database is missing or
/// unreachable, and unconfigured chat or mail channels are disabled, so
/// startup only fails when the store itself errors.
pub async fn create_app(config: ServerConfig) -> BackendResult<Router<()>> {
    tracing::info!("Initializing Workhub backend server");

    let store = load_store(&config).await;
    let chat = chat_from_config(&config);
    let mailer = mailer_from_config(&config);
    if config.google_client_id.is_none() {
        tracing::warn!("GOOGLE_CLIENT_ID not set. Google sign-in disabled.");
    }
    let identity: Arc<dyn IdentityVerifier> = Arc::new(GoogleVerifier::new(config.google_client_id.clone()));

    let app_state = build_state(config, store, chat, mailer, identity);
    let app = create_app_from_state(app_state.clone()).await?;

    let sweep_interval = app_state.config.sweep_interval;
    spawn_overdue_sweep(app_state);
    tracing::info!("Overdue sweep scheduled every {}s", sweep_interval.as_secs());

    Ok(app)
}
