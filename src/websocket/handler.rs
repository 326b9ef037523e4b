//! WebSocket Handler
//!
//! Handles WebSocket upgrade requests and manages the connection lifecycle.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

use super::hub::ConnectionHub;
use super::messages::{ClientMessage, ServerMessage};
use crate::api::AppState;

/// WebSocket upgrade handler for `GET /api/v1/ws`
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hub = Arc::clone(&state.hub);
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

fn frame(message: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize message");
            None
        }
    }
}

async fn handle_socket(socket: WebSocket, hub: Arc<ConnectionHub>) {
    let (mut sender, mut receiver) = socket.split();

    let (connection_id, mut rx) = match hub.register().await {
        Ok(registered) => registered,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected WebSocket connection");
            let error = ServerMessage::Error {
                message: e.to_string(),
            };
            if let Some(msg) = frame(&error) {
                let _ = sender.send(msg).await;
            }
            let _ = sender.close().await;
            return;
        }
    };

    let connected = ServerMessage::Connected {
        connection_id: connection_id.clone(),
    };
    let greeted = match frame(&connected) {
        Some(msg) => sender.send(msg).await.is_ok(),
        None => false,
    };
    if !greeted {
        hub.unregister(&connection_id).await;
        return;
    }

    let conn_id_for_send = connection_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let Some(msg) = frame(&msg) else { continue };
            if sender.send(msg).await.is_err() {
                tracing::debug!(
                    connection_id = %conn_id_for_send,
                    "WebSocket send failed, closing connection"
                );
                break;
            }
        }
    });

    let hub_for_recv = Arc::clone(&hub);
    let conn_id_for_recv = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(msg) => {
                    if !handle_ws_message(&hub_for_recv, &conn_id_for_recv, msg).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %conn_id_for_recv,
                        error = %e,
                        "WebSocket receive error"
                    );
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.unregister(&connection_id).await;
}

/// Returns false if the connection should be closed.
async fn handle_ws_message(hub: &ConnectionHub, connection_id: &str, message: Message) -> bool {
    match message {
        Message::Text(text) => {
            let reply = match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_client_message(hub, connection_id, client_msg).await,
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        error = %e,
                        "Invalid client message"
                    );
                    ServerMessage::Error {
                        message: format!("Invalid message format: {}", e),
                    }
                }
            };
            let _ = hub.send_to(connection_id, reply).await;
            true
        }
        Message::Binary(_) => {
            let error = ServerMessage::Error {
                message: "Binary messages not supported".to_string(),
            };
            let _ = hub.send_to(connection_id, error).await;
            true
        }
        Message::Ping(_) | Message::Pong(_) => true,
        Message::Close(_) => {
            tracing::debug!(connection_id = %connection_id, "Client requested close");
            false
        }
    }
}

/// Apply a client request and build the reply frame
async fn handle_client_message(
    hub: &ConnectionHub,
    connection_id: &str,
    message: ClientMessage,
) -> ServerMessage {
    let result = match message {
        ClientMessage::Subscribe { topics } => hub
            .subscribe(connection_id, topics)
            .await
            .map(|topics| ServerMessage::Subscribed { topics }),
        ClientMessage::Unsubscribe { topics } => hub
            .unsubscribe(connection_id, topics)
            .await
            .map(|topics| ServerMessage::Unsubscribed { topics }),
        ClientMessage::Ping => Ok(ServerMessage::Pong),
    };

    result.unwrap_or_else(|e| {
        tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket request failed");
        ServerMessage::Error {
            message: e.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::HubConfig;

    #[tokio::test]
    async fn test_subscribe_request_replies_with_accepted_topics() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (id, _rx) = hub.register().await.unwrap();

        let reply = handle_client_message(
            &hub,
            &id,
            ClientMessage::Subscribe {
                topics: vec!["polls.abc".to_string(), "nope".to_string()],
            },
        )
        .await;
        assert_eq!(
            reply,
            ServerMessage::Subscribed {
                topics: vec!["polls.abc".to_string()]
            }
        );
        assert_eq!(
            handle_client_message(&hub, &id, ClientMessage::Ping).await,
            ServerMessage::Pong
        );
    }

    #[tokio::test]
    async fn test_text_frames_are_answered_through_the_queue() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (id, mut rx) = hub.register().await.unwrap();

        assert!(handle_ws_message(&hub, &id, Message::Text("garbage".to_string())).await);
        assert!(matches!(rx.recv().await, Some(ServerMessage::Error { .. })));

        assert!(handle_ws_message(&hub, &id, Message::Text(r#"{"type":"ping"}"#.to_string())).await);
        assert_eq!(rx.recv().await, Some(ServerMessage::Pong));

        assert!(!handle_ws_message(&hub, &id, Message::Close(None)).await);
    }

    #[tokio::test]
    async fn test_unknown_connection_gets_error_reply() {
        let hub = ConnectionHub::new(HubConfig::default());
        let reply = handle_client_message(
            &hub,
            "missing",
            ClientMessage::Unsubscribe {
                topics: vec!["feed".to_string()],
            },
        )
        .await;
        assert!(matches!(reply, ServerMessage::Error { .. }));
    }

    #[tokio::test]
    async fn test_subscribing_past_topic_limit_is_an_error() {
        let hub = ConnectionHub::new(HubConfig {
            max_topics_per_connection: 1,
            ..HubConfig::default()
        });
        let (id, _rx) = hub.register().await.unwrap();

        let reply = handle_client_message(
            &hub,
            &id,
            ClientMessage::Subscribe {
                topics: vec!["polls.a".to_string(), "polls.b".to_string()],
            },
        )
        .await;
        match reply {
            ServerMessage::Error { message } => assert!(message.contains("limit: 1")),
            other => panic!("unexpected reply: {other:?}"),
        }
        assert_eq!(hub.subscription_count("polls.a").await, 0);
    }
}
