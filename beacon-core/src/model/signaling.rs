use crate::model::peer::PeerId;
use crate::model::room::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages the relay accepts from a client. Negotiation payloads (`offer`,
/// `answer`, `candidate`) are relayed verbatim and never inspected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ClientMessage {
    JoinRoom {
        room: RoomId,
    },
    Offer {
        room: RoomId,
        offer: Value,
    },
    Answer {
        room: RoomId,
        answer: Value,
        to: PeerId,
    },
    IceCandidate {
        room: RoomId,
        candidate: Value,
        to: PeerId,
    },
}

/// Messages the relay sends to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// First frame on every connection: the identity the relay assigned.
    Welcome {
        peer_id: PeerId,
    },
    /// Join response: the members that were already in the room. The joiner
    /// waits for their offers rather than initiating, so two simultaneous
    /// joins cannot double-offer each other.
    RoomJoined {
        room: RoomId,
        peers: Vec<PeerId>,
    },
    UserConnected {
        user_id: PeerId,
    },
    Offer {
        offer: Value,
        from: PeerId,
    },
    Answer {
        answer: Value,
        from: PeerId,
    },
    IceCandidate {
        candidate: Value,
        from: PeerId,
    },
    UserDisconnected {
        user_id: PeerId,
    },
}
