//! Real-time Update Module
//!
//! Every successful mutation publishes a `RealtimeEvent` on one tokio
//! broadcast channel. Two transports read from it:
//!
//! - **`subscription`** - `GET /realtime`, a Server-Sent Events stream with
//!   optional `workspace` and `types` filters
//! - **`socket`** - `GET /ws`, a WebSocket that also accepts operations
//!   (`createBoard`, `moveItem`, ...) and acknowledges them
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── broadcast.rs    - Channel type and publishing helpers
//! ├── audience.rs     - Per-user visibility of events
//! ├── subscription.rs - SSE subscription handler
//! └── socket.rs       - WebSocket handler and frame dispatch
//! ```
//!
//! # Visibility
//!
//! Both transports authenticate with a `token` query parameter. A user
//! receives notification events addressed to them and workspace events for
//! workspaces they are a member of.

pub mod broadcast;
pub mod audience;
pub mod subscription;
pub mod socket;

pub use broadcast::{broadcast_event, publish, RealtimeEventBroadcast};
pub use socket::ws_handler;
pub use subscription::handle_realtime_subscription;
