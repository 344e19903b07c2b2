/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container, holding:
 * - The document store (PostgreSQL or in-memory)
 * - The real-time broadcast channel
 * - The notification dispatcher
 * - The Google identity verifier
 * - The server configuration
 *
 * Every field is cheap to clone (`Arc` or a broadcast sender), so the state
 * is cloned into each handler.
 *
 * # State Extraction
 *
 * The `FromRef` implementations let handlers such as the SSE endpoint
 * extract just the part of the state they need.
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::auth::oauth::IdentityVerifier;
use crate::backend::notify::Notifier;
use crate::backend::realtime::broadcast::RealtimeEventBroadcast;
use crate::backend::server::config::ServerConfig;
use crate::backend::store::DocumentStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub realtime_broadcast: RealtimeEventBroadcast,
    pub notifier: Notifier,
    pub identity: Arc<dyn IdentityVerifier>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt_secret
    }
}

impl FromRef<AppState> for RealtimeEventBroadcast {
    fn from_ref(state: &AppState) -> Self {
        state.realtime_broadcast.clone()
    }
}

impl FromRef<AppState> for Arc<dyn DocumentStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Arc<ServerConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
