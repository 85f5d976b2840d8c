//! pastesync Core Library
//!
//! This crate provides the client side of a live paste-sharing service:
//! load a paste, follow edits made elsewhere in real time, and edit it
//! without losing local work to incoming updates.
//!
//! # Architecture
//!
//! - **PasteSession**: per-paste state (cached body, draft, retired flag),
//!   no I/O, fully testable
//! - **Live task**: one WebSocket per paste, reconnecting with linear
//!   backoff, driven by an explicit connection state machine
//! - **PasteStore**: one-shot HTTP requests (load, save, create, history)
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let store = HttpPasteStore::new(&config)?;
//! let mut controller = PasteController::new(store, PasteId::parse("00001")?);
//! controller.start(&config).await?;
//!
//! while let Some(_event) = controller.next_event().await {
//!     println!("{}", controller.session().display());
//! }
//! ```
//!
//! # Modules
//!
//! - `controller`: load/subscribe/save loop for one paste (main entry point)
//! - `session`: paste state and reconciliation rules
//! - `sync`: live connection state machine, frames and task
//! - `api`: paste store HTTP client
//! - `models`: paste ids, pastes and history entries
//! - `config`: client configuration

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod session;
pub mod sync;

pub use api::{HttpPasteStore, PasteStore};
pub use config::Config;
pub use controller::PasteController;
pub use error::{ClientError, ClientResult, SessionError};
pub use models::{HistoryAction, HistoryEntry, Paste, PasteId, PasteIdError};
pub use session::{Notice, PasteSession, SaveOutcome};
