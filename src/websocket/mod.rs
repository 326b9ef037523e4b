//! Live poll updates over WebSocket
//!
//! - **ConnectionHub**: Manages all active connections and subscriptions
//! - **Handler**: Handles WebSocket upgrade and message processing
//! - **Messages**: Defines client and server message formats
//!
//! Clients connect to `/api/v1/ws` and subscribe to topics:
//! - `polls.{id}` - votes on and deletion of one poll
//! - `polls.*` - the same for every poll
//! - `feed` - public polls as they are published
//! - `system` - server notices
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:8090/api/v1/ws');
//! ws.onopen = () => ws.send(JSON.stringify({type: 'subscribe', topics: ['polls.' + id]}));
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'vote_recorded') render(msg.votes);
//! };
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{ConnectionHub, ConnectionId, HubConfig, HubError};
pub use messages::{poll_topic, ClientMessage, ServerMessage, WsEvent, FEED_TOPIC, SYSTEM_TOPIC};
