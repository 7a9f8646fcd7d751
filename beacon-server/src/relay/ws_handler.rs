use crate::relay::RelayService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use beacon_core::{ClientMessage, PeerId};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(relay): State<RelayService>,
) -> impl IntoResponse {
    // Identity is assigned here, not taken from the client.
    let peer_id = PeerId::new();

    ws.on_upgrade(move |socket| handle_socket(socket, peer_id, relay))
}

async fn handle_socket(socket: WebSocket, peer_id: PeerId, relay: RelayService) {
    info!("New WebSocket connection: {}", peer_id);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    relay.connect(peer_id.clone(), tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize server message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let relay = relay.clone();
        let peer_id = peer_id.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(signal) => relay.handle_message(&peer_id, signal),
                        Err(e) => warn!("Invalid message from {}: {:?}", peer_id, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    // Runs for graceful close and abrupt transport failure alike, after
    // both halves are down, so the leave/notify sequence fires exactly once.
    relay.disconnect(&peer_id);
    info!("WebSocket disconnected: {}", peer_id);
}
