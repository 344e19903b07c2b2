//! Hierarchy Module
//!
//! CRUD over the Workspace → Board → Group → Item tree. One generic layer
//! serves every level and every item kind.
//!
//! # Module Structure
//!
//! ```text
//! hierarchy/
//! ├── mod.rs        - Module exports and documentation
//! ├── lineage.rs    - Resolve a document together with its ancestors
//! ├── modules.rs    - Seeding and listing of product modules
//! ├── workspaces.rs - Workspaces and membership
//! ├── boards.rs     - Boards
//! ├── groups.rs     - Groups
//! ├── items.rs      - Items of every kind
//! ├── ops.rs        - Authorized operations shared by REST and sockets
//! └── handlers.rs   - HTTP handlers
//! ```
//!
//! # Create and Delete Ordering
//!
//! There are no multi-document transactions. Creates insert the child
//! before linking it into the parent; deletes unlink from the parent before
//! removing the document. A crash between the two steps therefore leaves an
//! unreachable orphan, never a parent pointing at a missing child.
//!
//! Deleting any node cascades to all of its descendants.

pub mod lineage;
pub mod modules;
pub mod workspaces;
pub mod boards;
pub mod groups;
pub mod items;
pub mod ops;
pub mod handlers;

pub use lineage::{resolve_board, resolve_group, resolve_item, require_workspace};
