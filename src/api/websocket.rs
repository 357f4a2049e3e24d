use std::collections::HashMap;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
    Extension,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::PingStatus,
    services::{auth::Claims, pings::PingService},
    AppState,
};

use super::middleware::get_user_id;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsIncomingMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsOutgoingMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub payload: serde_json::Value,
}

/// Registry of live match subscriptions, keyed by `{ping_id}:{user_id}`.
/// Fan-out itself rides the Redis channel; the hub tracks connections so a
/// reconnect replaces the previous sender.
pub struct MatchHub {
    clients: RwLock<HashMap<String, mpsc::Sender<WsOutgoingMessage>>>,
}

impl MatchHub {
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, client_id: &str, sender: mpsc::Sender<WsOutgoingMessage>) {
        let mut clients = self.clients.write().await;
        clients.insert(client_id.to_string(), sender);
        tracing::info!("Match subscriber registered: {}", client_id);
    }

    pub async fn unregister(&self, client_id: &str) {
        let mut clients = self.clients.write().await;
        clients.remove(client_id);
        tracing::info!("Match subscriber unregistered: {}", client_id);
    }

    pub async fn send_to_client(&self, client_id: &str, message: WsOutgoingMessage) {
        let clients = self.clients.read().await;
        if let Some(sender) = clients.get(client_id) {
            let _ = sender.send(message).await;
        }
    }
}

/// Upgrade to a WebSocket scoped to one accepted match. Participants only;
/// the subscription dies with the connection or when the match ends.
pub async fn handle_match_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ping_id): Path<Uuid>,
) -> AppResult<Response> {
    let user_id = get_user_id(&claims)?;

    // Validate before upgrading so an outsider gets a clean 403 instead of
    // a dropped socket.
    let ping_service = PingService::new(state.db.clone(), state.redis.clone());
    let ping = ping_service.get_ping(ping_id).await?;
    if !ping.is_participant(user_id) {
        return Err(crate::error::AppError::NotParticipant);
    }
    if ping.status != PingStatus::Accepted {
        return Err(crate::error::AppError::MatchNotActive);
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, ping_id, user_id)))
}

async fn handle_socket(socket: WebSocket, state: AppState, ping_id: Uuid, user_id: Uuid) {
    let client_id = format!("{}:{}", ping_id, user_id);
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Channel feeding this client's socket
    let (tx, mut rx) = mpsc::channel::<WsOutgoingMessage>(256);

    state.hub.register(&client_id, tx.clone()).await;

    // Forward frames from the match's Redis channel. Delivery is
    // at-least-once; every frame carries the row id so the client folds
    // duplicates. A match_ended frame closes the subscription.
    let redis_client = state.redis.clone();
    let tx_clone = tx.clone();

    let redis_task = tokio::spawn(async move {
        if let Ok(mut pubsub) = redis_client.subscribe_match(ping_id).await {
            while let Some(msg) = pubsub.on_message().next().await {
                if let Ok(payload) = msg.get_payload::<String>() {
                    if let Ok(ws_msg) = serde_json::from_str::<WsOutgoingMessage>(&payload) {
                        let ended = ws_msg.msg_type == "match_ended";
                        if tx_clone.send(ws_msg).await.is_err() {
                            break;
                        }
                        if ended {
                            break;
                        }
                    }
                }
            }
        }
    });

    // Task to send messages to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(json) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Task to receive messages from WebSocket
    let hub = state.hub.clone();
    let client_id_for_recv = client_id.clone();

    let recv_task = tokio::spawn(async move {
        while let Some(result) = ws_receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    if let Ok(msg) = serde_json::from_str::<WsIncomingMessage>(&text) {
                        handle_incoming_message(&hub, &client_id_for_recv, msg).await;
                    }
                }
                Ok(Message::Close(_)) => break,
                Err(_) => break,
                _ => {}
            }
        }
    });

    // Wait for any task to complete
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
        _ = redis_task => {},
    }

    state.hub.unregister(&client_id).await;
}

async fn handle_incoming_message(hub: &MatchHub, client_id: &str, msg: WsIncomingMessage) {
    match msg.msg_type.as_str() {
        "ping" => {
            let pong = WsOutgoingMessage {
                msg_type: "pong".to_string(),
                payload: serde_json::json!({}),
            };
            hub.send_to_client(client_id, pong).await;
        }
        "ack" => {
            tracing::debug!("Subscriber {} ack: {:?}", client_id, msg.payload);
        }
        _ => {
            tracing::warn!("Unknown message type: {}", msg.msg_type);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_round_trip_with_type_tag() {
        let frame = WsOutgoingMessage {
            msg_type: "chat_message".to_string(),
            payload: serde_json::json!({"id": "abc", "message": "omw"}),
        };

        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"type\":\"chat_message\""));

        let parsed: WsOutgoingMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.msg_type, "chat_message");
        assert_eq!(parsed.payload["message"], "omw");
    }

    #[test]
    fn incoming_payload_defaults_to_null() {
        let parsed: WsIncomingMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(parsed.msg_type, "ping");
        assert!(parsed.payload.is_null());
    }
}
