//! Backend Module
//!
//! All server-side code: the Axum HTTP server, the document store, the work
//! hierarchy and everything around it.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, initialization
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`middleware`** - JWT authentication middleware and extractor
//! - **`auth`** - Users, sessions, Google sign-in, password reset
//! - **`store`** - `DocumentStore` trait with PostgreSQL and in-memory backends
//! - **`hierarchy`** - Modules, workspaces, boards, groups and items
//! - **`access`** - Role policy for every hierarchy operation
//! - **`notify`** - Slack, email and in-app notifications
//! - **`realtime`** - Event broadcasting, SSE and WebSocket transports
//! - **`sweep`** - Periodic overdue reminders
//! - **`error`** - `BackendError` and its HTTP rendering
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── server/         - Server initialization and state
//! ├── routes/         - Route configuration
//! ├── middleware/     - Request middleware
//! ├── auth/           - Authentication
//! ├── store/          - Document persistence
//! ├── hierarchy/      - Work hierarchy CRUD
//! ├── access/         - Access policy
//! ├── notify/         - Notification delivery
//! ├── realtime/       - Event broadcasting
//! ├── sweep/          - Overdue sweep
//! └── error/          - Error types
//! ```
//!
//! # Consistency
//!
//! Parent documents hold ordered arrays of child ids. A create inserts the
//! child before linking it into the parent; a delete unlinks it before
//! removing it. A crash between the two steps therefore leaves at worst an
//! orphaned child, never a parent pointing at a missing document. Array
//! pushes and pulls are single atomic store operations, so concurrent
//! creates under one parent never lose each other's links.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Middleware for request processing
pub mod middleware;

/// Authentication and user management
pub mod auth;

/// Document store abstraction
pub mod store;

/// Work hierarchy
pub mod hierarchy;

/// Access policy
pub mod access;

/// Notification delivery
pub mod notify;

/// Real-time update system
pub mod realtime;

/// Overdue reminders
pub mod sweep;

/// Backend error types
pub mod error;

pub use error::{BackendError, BackendResult};
pub use realtime::{broadcast_event, RealtimeEventBroadcast};
pub use server::{create_app, AppState};
