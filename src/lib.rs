//! # Pollify
//!
//! Create polls, share them by link, and collect votes deduplicated by voter
//! address, with live result updates over WebSocket.
//!
//! ## Modules
//!
//! - [`store`]: SQLite-backed polls, votes, users and sessions
//! - [`auth`]: E-mail/password accounts and session tokens
//! - [`voter`]: Voter address resolution
//! - [`websocket`]: Live update hub
//! - [`api`]: REST API server with Axum
//! - [`client`]: Typed HTTP client for the API
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pollify::store::{PollDraft, Store, Visibility};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Store::in_memory()?;
//!     let user = store.create_user("ada@example.com", "<phc hash>", "ada")?;
//!
//!     let poll = store.create_poll(&user, &PollDraft {
//!         question: "Tabs or spaces?".into(),
//!         description: None,
//!         options: vec!["Tabs".into(), "Spaces".into()],
//!         visibility: Visibility::Public,
//!     })?;
//!
//!     let poll = store.record_vote(&poll.id, 1, "203.0.113.7")?;
//!     println!("{} votes", poll.total_votes());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod logging;
pub mod store;
pub mod voter;
pub mod websocket;

// Re-export top-level types for convenience
pub use store::{
    Poll, PollCounts, PollDraft, PollId, Session, Store, StoreConfig, StoreError, StoreResult,
    User, Visibility,
};

pub use api::{build_router, serve, ApiError, AppState};

pub use auth::{AuthError, AuthService};

pub use voter::{VoterError, VoterIpSource, VoterResolver};

pub use websocket::{
    websocket_handler, ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage, WsEvent,
};

pub use client::{ClientConfig, ClientError, PollifyClient};

pub use config::{Config, ConfigError, LoggingConfig};
