use beacon_core::{RoomId, ServerMessage};
use serde_json::json;

use crate::integration::{create_relay, init_tracing};
use crate::utils::TestPeer;

#[tokio::test]
async fn test_disconnect_notifies_remaining_members() {
    init_tracing();

    let relay = create_relay();
    let mut a = TestPeer::connect(&relay);
    let mut b = TestPeer::connect(&relay);
    let mut c = TestPeer::connect(&relay);

    a.join("r1");
    b.join("r1");
    c.join("r1");
    for peer in [&mut a, &mut b, &mut c] {
        peer.drain();
    }

    c.disconnect();

    for peer in [&mut a, &mut b] {
        match peer.recv().await {
            ServerMessage::UserDisconnected { user_id } => assert_eq!(user_id, c.peer_id),
            other => panic!("expected user-disconnected, got {:?}", other),
        }
        peer.expect_silence();
    }

    let members = relay.directory().members_of(&RoomId::from("r1"));
    assert_eq!(members.len(), 2);
    assert!(!members.contains(&c.peer_id));
}

#[tokio::test]
async fn test_second_disconnect_is_a_noop() {
    init_tracing();

    let relay = create_relay();
    let mut a = TestPeer::connect(&relay);
    let b = TestPeer::connect(&relay);

    a.join("r1");
    b.join("r1");
    a.drain();

    b.disconnect();
    assert!(matches!(
        a.recv().await,
        ServerMessage::UserDisconnected { .. }
    ));

    b.disconnect();
    a.expect_silence();
    assert_eq!(relay.directory().room_of(&b.peer_id), None);
}

#[tokio::test]
async fn test_disconnect_before_join_touches_nobody() {
    init_tracing();

    let relay = create_relay();
    let mut a = TestPeer::connect(&relay);
    let b = TestPeer::connect(&relay);

    a.join("r1");
    a.drain();

    // b never joined a room; its teardown must not ripple anywhere.
    b.disconnect();
    a.expect_silence();
    assert_eq!(relay.directory().room_count(), 1);
}

#[tokio::test]
async fn test_last_member_disconnect_removes_room() {
    init_tracing();

    let relay = create_relay();
    let mut a = TestPeer::connect(&relay);

    a.join("r1");
    a.drain();
    a.disconnect();

    assert_eq!(relay.directory().room_count(), 0);
    assert!(relay.directory().members_of(&RoomId::from("r1")).is_empty());
}

/// The end-to-end exchange from the design's acceptance scenario: two peers
/// meet in a room, negotiate through the relay, then one drops.
#[tokio::test]
async fn test_two_peer_session_lifecycle() {
    init_tracing();

    let relay = create_relay();
    let mut a = TestPeer::connect(&relay);
    let mut b = TestPeer::connect(&relay);

    // A joins first and hears nothing.
    a.join("r1");
    assert!(matches!(
        a.recv().await,
        ServerMessage::RoomJoined { peers, .. } if peers.is_empty()
    ));
    a.expect_silence();

    // B's join is announced to A only.
    b.join("r1");
    match a.recv().await {
        ServerMessage::UserConnected { user_id } => assert_eq!(user_id, b.peer_id),
        other => panic!("expected user-connected, got {:?}", other),
    }
    match b.recv().await {
        ServerMessage::RoomJoined { peers, .. } => assert_eq!(peers, vec![a.peer_id.clone()]),
        other => panic!("expected room-joined, got {:?}", other),
    }

    // A offers to the room; only B receives it.
    let offer = json!({"type": "offer", "sdp": "v=0 A"});
    a.offer("r1", offer.clone());
    match b.recv().await {
        ServerMessage::Offer { offer: got, from } => {
            assert_eq!(got, offer);
            assert_eq!(from, a.peer_id);
        }
        other => panic!("expected offer, got {:?}", other),
    }
    a.expect_silence();

    // B answers A directly.
    let answer = json!({"type": "answer", "sdp": "v=0 B"});
    b.answer("r1", answer.clone(), &a.peer_id);
    match a.recv().await {
        ServerMessage::Answer { answer: got, from } => {
            assert_eq!(got, answer);
            assert_eq!(from, b.peer_id);
        }
        other => panic!("expected answer, got {:?}", other),
    }
    b.expect_silence();

    // B drops; A is told and is the sole remaining member.
    b.disconnect();
    match a.recv().await {
        ServerMessage::UserDisconnected { user_id } => assert_eq!(user_id, b.peer_id),
        other => panic!("expected user-disconnected, got {:?}", other),
    }
    assert_eq!(
        relay.directory().members_of(&RoomId::from("r1")),
        vec![a.peer_id.clone()]
    );
}
