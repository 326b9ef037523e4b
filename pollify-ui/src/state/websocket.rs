//! WebSocket Client
//!
//! Real-time connection to the Pollify API for live vote counts.

use leptos::*;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use super::global::{GlobalState, LiveTally};

/// Topic carrying public poll announcements
pub const FEED_TOPIC: &str = "feed";

/// Topic carrying updates for one poll
pub fn poll_topic(id: &str) -> String {
    format!("polls.{}", id)
}

/// WebSocket message types from server
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    Connected {
        connection_id: String,
    },
    Subscribed {
        topics: Vec<String>,
    },
    Unsubscribed {
        topics: Vec<String>,
    },
    Pong,
    Error {
        message: String,
    },
    VoteRecorded {
        poll_id: String,
        votes: Vec<u64>,
        total_votes: u64,
    },
    PollCreated {
        poll_id: String,
        question: String,
        creator_name: String,
    },
    PollDeleted {
        poll_id: String,
    },
    System {
        message: String,
    },
}

/// WebSocket client message types
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { topics: Vec<String> },
    Unsubscribe { topics: Vec<String> },
    Ping,
}

/// WebSocket client for real-time updates
///
/// Topics registered with [`watch`](Self::watch) are re-subscribed after
/// every reconnect.
#[derive(Clone)]
pub struct WebSocketClient {
    ws: Rc<RefCell<Option<WebSocket>>>,
    url: String,
    reconnect_attempts: Rc<RefCell<u32>>,
    watched: Rc<RefCell<HashSet<String>>>,
    max_reconnect_attempts: u32,
}

impl WebSocketClient {
    /// Create a new WebSocket client
    pub fn new(url: &str) -> Self {
        Self {
            ws: Rc::new(RefCell::new(None)),
            url: url.to_string(),
            reconnect_attempts: Rc::new(RefCell::new(0)),
            watched: Rc::new(RefCell::new(HashSet::new())),
            max_reconnect_attempts: 5,
        }
    }

    /// Connect to the WebSocket server
    pub fn connect(&self, state: GlobalState) {
        match WebSocket::new(&self.url) {
            Ok(ws) => {
                self.setup_handlers(&ws, state);
                *self.ws.borrow_mut() = Some(ws);
            }
            Err(e) => {
                web_sys::console::error_1(&format!("WebSocket connection failed: {:?}", e).into());
                self.schedule_reconnect(state);
            }
        }
    }

    /// Set up WebSocket event handlers
    fn setup_handlers(&self, ws: &WebSocket, state: GlobalState) {
        // On open
        let client = self.clone();
        let state_clone = state.clone();
        let on_open = Closure::wrap(Box::new(move |_: JsValue| {
            state_clone.ws_connected.set(true);
            *client.reconnect_attempts.borrow_mut() = 0;

            let topics: Vec<String> = client.watched.borrow().iter().cloned().collect();
            if !topics.is_empty() {
                let _ = client.send(&ClientMessage::Subscribe { topics });
            }
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        on_open.forget();

        // On message
        let state_clone = state.clone();
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Ok(text) = event.data().dyn_into::<js_sys::JsString>() {
                let text: String = text.into();
                handle_message(&text, &state_clone);
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        on_message.forget();

        // On close
        let client = self.clone();
        let on_close = Closure::wrap(Box::new(move |event: CloseEvent| {
            web_sys::console::log_1(
                &format!("WebSocket closed: code={}, reason={}", event.code(), event.reason())
                    .into(),
            );
            state.ws_connected.set(false);
            client.schedule_reconnect(state.clone());
        }) as Box<dyn FnMut(CloseEvent)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        on_close.forget();

        // On error
        let on_error = Closure::wrap(Box::new(move |e: JsValue| {
            web_sys::console::error_1(&format!("WebSocket error: {:?}", e).into());
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();
    }

    /// Schedule a reconnect attempt with exponential backoff
    fn schedule_reconnect(&self, state: GlobalState) {
        let attempts = *self.reconnect_attempts.borrow();
        if attempts >= self.max_reconnect_attempts {
            web_sys::console::error_1(&"Max reconnect attempts reached".into());
            return;
        }

        let delay = (2_u32.pow(attempts) * 1000).min(30000);
        *self.reconnect_attempts.borrow_mut() = attempts + 1;

        let client = self.clone();
        gloo_timers::callback::Timeout::new(delay, move || {
            client.connect(state);
        })
        .forget();
    }

    /// Send a message to the server
    pub fn send(&self, message: &ClientMessage) -> Result<(), String> {
        let ws_guard = self.ws.borrow();
        let ws = ws_guard.as_ref().ok_or("WebSocket not connected")?;

        let json = serde_json::to_string(message).map_err(|e| e.to_string())?;
        ws.send_with_str(&json).map_err(|e| format!("{:?}", e))
    }

    /// Follow a topic now and after reconnects
    pub fn watch(&self, topic: String) {
        if self.watched.borrow_mut().insert(topic.clone()) && self.is_connected() {
            let _ = self.send(&ClientMessage::Subscribe {
                topics: vec![topic],
            });
        }
    }

    /// Stop following a topic
    pub fn unwatch(&self, topic: &str) {
        if self.watched.borrow_mut().remove(topic) && self.is_connected() {
            let _ = self.send(&ClientMessage::Unsubscribe {
                topics: vec![topic.to_string()],
            });
        }
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.ws
            .borrow()
            .as_ref()
            .map(|ws| ws.ready_state() == WebSocket::OPEN)
            .unwrap_or(false)
    }
}

/// Handle incoming WebSocket message
fn handle_message(text: &str, state: &GlobalState) {
    let msg = match serde_json::from_str::<WsMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            web_sys::console::error_1(&format!("Failed to parse WebSocket message: {}", e).into());
            return;
        }
    };

    match msg {
        WsMessage::VoteRecorded {
            poll_id,
            votes,
            total_votes,
        } => {
            state.live_tally.set(Some(LiveTally {
                poll_id,
                votes,
                total_votes,
            }));
        }
        WsMessage::PollCreated { .. } => {
            state.feed_changes.update(|n| *n += 1);
        }
        WsMessage::PollDeleted { poll_id } => {
            state.deleted_poll.set(Some(poll_id));
            state.feed_changes.update(|n| *n += 1);
        }
        WsMessage::System { message } => state.show_success(&message),
        WsMessage::Error { message } => {
            web_sys::console::error_1(&format!("Server error: {}", message).into());
        }
        WsMessage::Connected { .. }
        | WsMessage::Subscribed { .. }
        | WsMessage::Unsubscribed { .. }
        | WsMessage::Pong => {}
    }
}

/// Open the WebSocket connection (call from app root)
pub fn init_websocket(state: GlobalState, api_base: &str) -> WebSocketClient {
    // api_base already ends in /api/v1
    let ws_url = api_base
        .replace("http://", "ws://")
        .replace("https://", "wss://");
    let client = WebSocketClient::new(&format!("{}/ws", ws_url));
    client.connect(state);
    client
}
