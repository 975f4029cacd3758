//! Live dashboard subscriber stream
//!
//! Each connection gets its own subscription to the broadcast channel.
//! A subscriber that falls behind lags and skips ahead; it cannot slow
//! down publishers or other subscribers.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::AppState;

pub async fn subscribe(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_frames(socket, state))
}

async fn stream_frames(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let ack = serde_json::json!({
        "kind": "connected",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    if sender.send(Message::Text(ack.to_string())).await.is_err() {
        return;
    }

    let mut rx = state.publisher.subscribe();

    loop {
        tokio::select! {
            frame = rx.recv() => match frame {
                Ok(frame) => {
                    let Ok(text) = serde_json::to_string(&frame) else { continue };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "subscriber lagging, frames skipped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            message = receiver.next() => match message {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(Message::Ping(data))) => {
                    let _ = sender.send(Message::Pong(data)).await;
                }
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }
}
