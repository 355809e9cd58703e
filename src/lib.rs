//! # Stampbook
//!
//! The backend of a cafe loyalty program: owners sign in, set up a stamp
//! card for their cafe, follow their regulars, and verify the one-time codes
//! customers show at the counter to claim a reward. Usable both as a
//! standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! stampbook = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::path::Path;
//! use stampbook::clock::SystemClock;
//! use stampbook::config::ServerConfig;
//! use stampbook::server::{AppState, create_router};
//! use stampbook::store::{SqliteStore, Store};
//!
//! let config = ServerConfig::load(Path::new("./data")).unwrap();
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState {
//!     store: Arc::new(store),
//!     clock: Arc::new(SystemClock),
//!     config,
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod loyalty;
pub mod server;
pub mod store;
pub mod types;
