//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation (health, realtime, layers)
//! └── api_routes.rs   - `/api` endpoints, public and authenticated
//! ```
//!
//! # Route Types
//!
//! - `GET /health` - Liveness check
//! - `GET /realtime?token=` - Server-Sent Events stream
//! - `GET /ws?token=` - WebSocket channel
//! - `/api/auth/*` - Authentication
//! - `/api/modules`, `/api/workspaces/*`, `/api/boards/*`, `/api/groups/*`,
//!   `/api/items/*` - Work hierarchy
//! - `/api/notifications/*` - Notification inbox

/// Main router creation
pub mod router;

/// API endpoint handlers
pub mod api_routes;

pub use router::create_router;
