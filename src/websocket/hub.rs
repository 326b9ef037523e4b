//! WebSocket Connection Hub
//!
//! Tracks live connections and their topic subscriptions, and fans poll
//! events out to subscribers. Each connection owns a bounded queue; a client
//! that stops reading loses frames instead of growing server memory.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::messages::{ServerMessage, WsEvent, FEED_TOPIC, SYSTEM_TOPIC};
use crate::config::WebSocketConfig;

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

type Connections = Arc<RwLock<HashMap<ConnectionId, ConnectionHandle>>>;
type Subscriptions = Arc<RwLock<HashMap<String, HashSet<ConnectionId>>>>;

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Frames buffered per connection before new ones are dropped
    pub send_queue_capacity: usize,
    /// Distinct topics one connection may hold
    pub max_topics_per_connection: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            send_queue_capacity: 256,
            max_topics_per_connection: 64,
        }
    }
}

impl From<&WebSocketConfig> for HubConfig {
    fn from(config: &WebSocketConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            send_queue_capacity: config.send_queue_capacity,
            max_topics_per_connection: config.max_topics_per_connection,
        }
    }
}

/// Handle for sending messages to a specific connection
struct ConnectionHandle {
    sender: mpsc::Sender<ServerMessage>,
    subscriptions: HashSet<String>,
}

/// Manages all WebSocket connections and subscriptions
pub struct ConnectionHub {
    connections: Connections,
    subscriptions: Subscriptions,
    config: HubConfig,
}

impl ConnectionHub {
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Register a new connection, returning its id and the receiving end of
    /// its outbound queue.
    pub async fn register(
        &self,
    ) -> Result<(ConnectionId, mpsc::Receiver<ServerMessage>), HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let (sender, receiver) = mpsc::channel(self.config.send_queue_capacity.max(1));
        let id = Uuid::new_v4().to_string();
        connections.insert(
            id.clone(),
            ConnectionHandle {
                sender,
                subscriptions: HashSet::new(),
            },
        );

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok((id, receiver))
    }

    /// Unregister a connection and clean up its subscriptions
    pub async fn unregister(&self, id: &str) {
        let handle = self.connections.write().await.remove(id);

        if let Some(handle) = handle {
            let mut subs = self.subscriptions.write().await;
            for topic in handle.subscriptions {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
            }
        }

        tracing::info!(connection_id = %id, "WebSocket disconnected");
    }

    /// Subscribe a connection to topics; invalid topics are skipped.
    ///
    /// A request that would take the connection past
    /// `max_topics_per_connection` is refused as a whole.
    pub async fn subscribe(
        &self,
        id: &str,
        topics: Vec<String>,
    ) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections
            .get_mut(id)
            .ok_or(HubError::ConnectionNotFound)?;

        let added: HashSet<&String> = topics
            .iter()
            .filter(|t| is_valid_topic(t) && !handle.subscriptions.contains(*t))
            .collect();
        let limit = self.config.max_topics_per_connection;
        if handle.subscriptions.len() + added.len() > limit {
            tracing::warn!(connection_id = %id, limit, "Topic limit reached");
            return Err(HubError::TooManyTopics(limit));
        }

        let mut subs = self.subscriptions.write().await;
        let mut subscribed = Vec::new();

        for topic in topics {
            if !is_valid_topic(&topic) {
                tracing::warn!(topic = %topic, "Invalid topic ignored");
                continue;
            }

            handle.subscriptions.insert(topic.clone());
            subs.entry(topic.clone()).or_default().insert(id.to_string());
            subscribed.push(topic);
        }

        tracing::debug!(connection_id = %id, topics = ?subscribed, "Subscribed to topics");
        Ok(subscribed)
    }

    /// Unsubscribe a connection from topics
    pub async fn unsubscribe(
        &self,
        id: &str,
        topics: Vec<String>,
    ) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections
            .get_mut(id)
            .ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut unsubscribed = Vec::new();

        for topic in topics {
            if handle.subscriptions.remove(&topic) {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
                unsubscribed.push(topic);
            }
        }

        tracing::debug!(connection_id = %id, topics = ?unsubscribed, "Unsubscribed from topics");
        Ok(unsubscribed)
    }

    /// Deliver an event to every subscriber of its topic, returning how many
    /// connections accepted it
    pub async fn broadcast(&self, event: &WsEvent) -> usize {
        deliver(&self.connections, &self.subscriptions, event).await
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle.sender.try_send(message).map_err(|_| HubError::SendFailed)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn subscription_count(&self, topic: &str) -> usize {
        self.subscriptions
            .read()
            .await
            .get(topic)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

async fn deliver(
    connections: &Connections,
    subscriptions: &Subscriptions,
    event: &WsEvent,
) -> usize {
    // Same lock order as subscribe/unsubscribe: connections, then subscriptions
    let connections = connections.read().await;
    let subs = subscriptions.read().await;

    let direct = subs.get(&event.topic);
    // "polls.*" matches "polls.{id}"
    let wildcard = event
        .topic
        .split_once('.')
        .and_then(|(prefix, _)| subs.get(&format!("{}.*", prefix)));

    let targets: HashSet<&ConnectionId> = direct
        .into_iter()
        .chain(wildcard)
        .flat_map(|ids| ids.iter())
        .collect();

    let mut sent = 0;
    for id in targets {
        let Some(handle) = connections.get(id) else {
            continue;
        };
        match handle.sender.try_send(event.message.clone()) {
            Ok(()) => sent += 1,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    connection_id = %id,
                    topic = %event.topic,
                    "Send queue full, frame dropped"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }

    if sent > 0 {
        tracing::trace!(topic = %event.topic, subscribers = sent, "Broadcast event");
    }
    sent
}

/// Valid topics: `polls.*`, `polls.{id}`, `feed`, `system`
fn is_valid_topic(topic: &str) -> bool {
    match topic.strip_prefix("polls.") {
        Some("*") => true,
        Some(id) => !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'),
        None => topic == FEED_TOPIC || topic == SYSTEM_TOPIC,
    }
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Too many topics on one connection (limit: {0})")]
    TooManyTopics(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}
