//! WebSocket Message Types
//!
//! JSON frames exchanged between browsers and the Pollify server, tagged by
//! `type`.

use serde::{Deserialize, Serialize};

use crate::store::{Poll, PollId};

/// Topic carrying newly published public polls
pub const FEED_TOPIC: &str = "feed";
/// Topic carrying server lifecycle notices
pub const SYSTEM_TOPIC: &str = "system";

/// Topic for updates to a single poll
pub fn poll_topic(id: &PollId) -> String {
    format!("polls.{}", id)
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics (e.g. "polls.{id}", "polls.*", "feed")
    Subscribe { topics: Vec<String> },
    /// Unsubscribe from topics
    Unsubscribe { topics: Vec<String> },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected { connection_id: String },
    /// Subscription confirmed for the accepted topics
    Subscribed { topics: Vec<String> },
    /// Unsubscription confirmed
    Unsubscribed { topics: Vec<String> },
    /// Pong response to ping
    Pong,
    /// Error message
    Error { message: String },
    /// A vote landed; carries the full updated tally
    VoteRecorded {
        poll_id: String,
        votes: Vec<u64>,
        total_votes: u64,
    },
    /// A public poll was published
    PollCreated {
        poll_id: String,
        question: String,
        creator_name: String,
    },
    /// A poll was deleted by its creator
    PollDeleted { poll_id: String },
    /// Server notice
    System { message: String },
}

/// Internal event routed through the hub
#[derive(Debug, Clone)]
pub struct WsEvent {
    /// Topic this event belongs to (e.g., "polls.3f2a...")
    pub topic: String,
    /// The message to send to subscribers
    pub message: ServerMessage,
}

impl WsEvent {
    pub fn vote_recorded(poll: &Poll) -> Self {
        Self {
            topic: poll_topic(&poll.id),
            message: ServerMessage::VoteRecorded {
                poll_id: poll.id.to_string(),
                votes: poll.votes.clone(),
                total_votes: poll.total_votes(),
            },
        }
    }

    pub fn poll_created(poll: &Poll) -> Self {
        Self {
            topic: FEED_TOPIC.to_string(),
            message: ServerMessage::PollCreated {
                poll_id: poll.id.to_string(),
                question: poll.question.clone(),
                creator_name: poll.creator_name.clone(),
            },
        }
    }

    pub fn poll_deleted(id: &PollId) -> Self {
        Self {
            topic: poll_topic(id),
            message: ServerMessage::PollDeleted {
                poll_id: id.to_string(),
            },
        }
    }

    pub fn system(message: &str) -> Self {
        Self {
            topic: SYSTEM_TOPIC.to_string(),
            message: ServerMessage::System {
                message: message.to_string(),
            },
        }
    }

    /// Same message, routed to another topic
    pub fn on_topic(self, topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Visibility;
    use chrono::Utc;

    fn poll() -> Poll {
        Poll {
            id: PollId::from("abc"),
            question: "Cats or dogs?".to_string(),
            description: None,
            options: vec!["Cats".to_string(), "Dogs".to_string()],
            votes: vec![3, 4],
            voters: vec![],
            created_by: "u1".to_string(),
            creator_name: "nina".to_string(),
            visibility: Visibility::Public,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_client_message_deserialize_subscribe() {
        let json = r#"{"type": "subscribe", "topics": ["polls.abc", "feed"]}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Subscribe { topics } => assert_eq!(topics, vec!["polls.abc", "feed"]),
            _ => panic!("Expected Subscribe"),
        }
    }

    #[test]
    fn test_client_message_deserialize_ping() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_vote_recorded_frame() {
        let event = WsEvent::vote_recorded(&poll());
        assert_eq!(event.topic, "polls.abc");

        let json = serde_json::to_value(&event.message).unwrap();
        assert_eq!(json["type"], "vote_recorded");
        assert_eq!(json["poll_id"], "abc");
        assert_eq!(json["votes"], serde_json::json!([3, 4]));
        assert_eq!(json["total_votes"], 7);
    }

    #[test]
    fn test_feed_and_delete_events() {
        let created = WsEvent::poll_created(&poll());
        assert_eq!(created.topic, FEED_TOPIC);

        let deleted = WsEvent::poll_deleted(&PollId::from("abc")).on_topic(FEED_TOPIC);
        assert_eq!(deleted.topic, "feed");
        assert_eq!(
            deleted.message,
            ServerMessage::PollDeleted {
                poll_id: "abc".to_string()
            }
        );
    }
}
