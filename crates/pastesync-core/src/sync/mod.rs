//! Live paste subscription
//!
//! Keeps a WebSocket open to the paste service so edits made elsewhere show
//! up without refetching.
//!
//! ## Protocol
//!
//! 1. Connect to `/ws/{id}`
//! 2. Server sends `{type:"init", text}` and the current `userCount`
//! 3. Server broadcasts `{type:"update", text}` after every save
//! 4. Client may push the raw body after saving over HTTP
//! 5. Server closes with 1008 (or a "deleted" reason) once the paste is retired
//!
//! ## Usage
//!
//! ```ignore
//! let mut live = spawn_live_task(config.ws_url(&id)?, config.reconnect_policy());
//! while let Some(event) = live.next_event().await {
//!     session.apply_live_event(&event);
//! }
//! ```

mod connection;
mod live;
mod message;

pub use connection::{
    CloseInfo, CloseKind, ConnectionMachine, ConnectionState, ReconnectPolicy, Transition,
    CLOSE_POLICY_VIOLATION,
};
pub use live::{spawn_live_task, LiveCommand, LiveEvent, LiveHandle};
pub use message::InboundFrame;
