//! Shared Module
//!
//! This module contains the serializable types used across the backend:
//! persisted documents, request payloads and real-time events. None of these
//! types touch the network or the database themselves.

/// Domain documents and request payloads
pub mod model;

/// Real-time event system
pub mod event;

/// Shared error types
pub mod error;

/// Re-export commonly used types for convenience
pub use event::{EventAction, EventType, RealtimeEvent};
pub use error::SharedError;
pub use model::{
    Board, Group, Item, ItemKind, Member, Module, ModuleKind, Notification, Priority, Role, User,
    Workspace,
};
