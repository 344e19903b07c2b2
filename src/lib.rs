// Increase recursion limit for complex async operations
#![recursion_limit = "256"]

//! Workhub - Main Library
//!
//! Workhub is a multi-module project-management backend. It organises work
//! into a four-level tree (Workspace → Board → Group → Item) and exposes it
//! over an Axum JSON API plus a real-time event channel.
//!
//! # Overview
//!
//! This library provides:
//! - Workspaces partitioned by product module (Workmanagement, CRM, Dev, Service)
//! - Boards, groups and typed items (tasks, bugs, leads, tickets, ...)
//! - Membership and role checks on every mutation
//! - JWT authentication, Google sign-in and password reset
//! - Notification fan-out (Slack, falling back to email, always in-app)
//! - A daily sweep that reminds assignees about overdue items
//!
//! # Module Structure
//!
//! - **`shared`** - Serializable domain types (documents, requests, events)
//!   and the shared error type
//!
//! - **`backend`** - Server-side code
//!   - Axum HTTP server, routes and middleware
//!   - Document store abstraction (PostgreSQL JSONB or in-memory)
//!   - Hierarchy CRUD, access policy, notifications, realtime channel
//!
//! # Usage
//!
//! ```rust,no_run
//! use workhub::backend::server::{config::ServerConfig, init::create_app};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let app = create_app(config).await?;
//! // Serve `app` with axum::serve
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - `Result<T, E>` for fallible operations
//! - `shared::SharedError` for validation and parsing failures
//! - `backend::error::BackendError` for everything that reaches an HTTP
//!   response or a socket acknowledgement

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
