//! State Management
//!
//! Global application state and WebSocket connection management.

pub mod global;
pub mod websocket;

pub use global::{provide_global_state, GlobalState};
pub use websocket::{init_websocket, WebSocketClient};
