use crate::directory::{Departure, RoomDirectory};
use beacon_core::{ClientMessage, PeerId, RoomId, ServerMessage};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

struct RelayInner {
    directory: RoomDirectory,
    peers: DashMap<PeerId, mpsc::UnboundedSender<ServerMessage>>,
}

/// The message router. Holds the connection registry and the room directory;
/// every delivery is fire-and-forget — a target that disconnected between
/// send and processing is silently dropped, never an error.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

impl RelayService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RelayInner {
                directory: RoomDirectory::new(),
                peers: DashMap::new(),
            }),
        }
    }

    pub fn directory(&self) -> &RoomDirectory {
        &self.inner.directory
    }

    /// Register a freshly accepted connection and hand it its identity.
    pub fn connect(&self, peer_id: PeerId, tx: mpsc::UnboundedSender<ServerMessage>) {
        info!(peer = %peer_id, "peer connected");
        self.inner.peers.insert(peer_id.clone(), tx);
        self.send_to(
            &peer_id,
            ServerMessage::Welcome {
                peer_id: peer_id.clone(),
            },
        );
    }

    /// Transport closed. Runs the same leave/notify path as a graceful
    /// leave and removes the connection from the registry.
    pub fn disconnect(&self, peer_id: &PeerId) {
        self.inner.peers.remove(peer_id);

        if let Some(departure) = self.inner.directory.leave(peer_id) {
            info!(peer = %peer_id, room = %departure.room, "peer disconnected");
            self.notify_departure(peer_id, departure);
        } else {
            info!(peer = %peer_id, "peer disconnected");
        }
    }

    /// Route one inbound message. Called from the connection's read loop, so
    /// messages from a single peer are processed in arrival order.
    pub fn handle_message(&self, peer_id: &PeerId, msg: ClientMessage) {
        match msg {
            ClientMessage::JoinRoom { room } => self.handle_join(peer_id, room),
            ClientMessage::Offer { room, offer } => self.broadcast_offer(peer_id, room, offer),
            ClientMessage::Answer { answer, to, .. } => self.send_to(
                &to,
                ServerMessage::Answer {
                    answer,
                    from: peer_id.clone(),
                },
            ),
            ClientMessage::IceCandidate { candidate, to, .. } => self.send_to(
                &to,
                ServerMessage::IceCandidate {
                    candidate,
                    from: peer_id.clone(),
                },
            ),
        }
    }

    fn handle_join(&self, peer_id: &PeerId, room: RoomId) {
        let result = self.inner.directory.join(peer_id.clone(), room.clone());
        info!(peer = %peer_id, %room, existing = result.peers.len(), "peer joined room");

        // Re-join: the old room sees an ordinary departure.
        if let Some(departure) = result.departed {
            self.notify_departure(peer_id, departure);
        }

        // Existing members learn about the arrival and initiate negotiation;
        // the joiner only gets the member list and waits for offers.
        for member in &result.peers {
            self.send_to(
                member,
                ServerMessage::UserConnected {
                    user_id: peer_id.clone(),
                },
            );
        }

        self.send_to(
            peer_id,
            ServerMessage::RoomJoined {
                room,
                peers: result.peers,
            },
        );
    }

    fn broadcast_offer(&self, peer_id: &PeerId, room: RoomId, offer: Value) {
        for member in self.inner.directory.members_of(&room) {
            if member == *peer_id {
                continue;
            }
            self.send_to(
                &member,
                ServerMessage::Offer {
                    offer: offer.clone(),
                    from: peer_id.clone(),
                },
            );
        }
    }

    fn notify_departure(&self, peer_id: &PeerId, departure: Departure) {
        for member in &departure.remaining {
            self.send_to(
                member,
                ServerMessage::UserDisconnected {
                    user_id: peer_id.clone(),
                },
            );
        }
    }

    fn send_to(&self, peer_id: &PeerId, msg: ServerMessage) {
        let Some(peer) = self.inner.peers.get(peer_id) else {
            debug!(peer = %peer_id, "dropping message for unknown peer");
            return;
        };
        if peer.send(msg).is_err() {
            debug!(peer = %peer_id, "dropping message for closed peer channel");
        }
    }
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new()
    }
}
