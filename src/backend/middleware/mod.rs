//! Middleware Module
//!
//! This module contains all HTTP middleware for the backend server.
//!
//! - **`auth`** - Bearer-token authentication for `/api` routes
//!
//! # Example
//!
//! ```rust,ignore
//! use axum::middleware;
//! use workhub::backend::middleware::auth_middleware;
//!
//! let protected = api_routes.layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
//! ```

pub mod auth;

pub use auth::{auth_middleware, authenticate_token, AuthUser, AuthenticatedUser};
