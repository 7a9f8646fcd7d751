use beacon_core::{PeerId, RoomId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// A peer's exit from a room: which room, and who is still in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    pub room: RoomId,
    pub remaining: Vec<PeerId>,
}

/// Outcome of a join: the members that were already in the room, plus the
/// departure from a previous room when the peer was re-joining.
#[derive(Debug, Clone)]
pub struct JoinResult {
    pub peers: Vec<PeerId>,
    pub departed: Option<Departure>,
}

#[derive(Default)]
struct DirectoryInner {
    rooms: HashMap<RoomId, HashSet<PeerId>>,
    membership: HashMap<PeerId, RoomId>,
}

impl DirectoryInner {
    fn remove(&mut self, peer_id: &PeerId) -> Option<Departure> {
        let room = self.membership.remove(peer_id)?;

        let remaining = match self.rooms.get_mut(&room) {
            Some(members) => {
                members.remove(peer_id);
                members.iter().cloned().collect()
            }
            None => Vec::new(),
        };

        // Empty rooms must not linger: an absent entry and a never-created
        // room are the same thing.
        if remaining.is_empty() {
            self.rooms.remove(&room);
        }

        Some(Departure { room, remaining })
    }
}

/// In-memory connection <-> room mapping. One instance per server process,
/// handed by clone to every connection task.
///
/// Both maps move together under one lock, so every operation is a single
/// atomic step and a peer is in a room's member set exactly when its
/// membership entry points at that room.
#[derive(Clone, Default)]
pub struct RoomDirectory {
    inner: Arc<Mutex<DirectoryInner>>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, DirectoryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add `peer_id` to `room`, creating the room on demand. Returns the
    /// *other* members at the moment of join. A peer already in a different
    /// room leaves it first; the departure comes back so the caller can
    /// notify that room.
    pub fn join(&self, peer_id: PeerId, room: RoomId) -> JoinResult {
        let mut inner = self.locked();

        let in_other_room =
            matches!(inner.membership.get(&peer_id), Some(current) if *current != room);
        let departed = if in_other_room {
            inner.remove(&peer_id)
        } else {
            None
        };

        let peers: Vec<PeerId> = {
            let members = inner.rooms.entry(room.clone()).or_default();
            let peers = members.iter().filter(|p| **p != peer_id).cloned().collect();
            members.insert(peer_id.clone());
            peers
        };
        inner.membership.insert(peer_id.clone(), room.clone());

        debug!(peer = %peer_id, %room, others = peers.len(), "directory join");

        JoinResult { peers, departed }
    }

    /// Remove `peer_id` from whatever room it is in. `None` when it is in no
    /// room, which makes repeated calls during racy teardown harmless.
    pub fn leave(&self, peer_id: &PeerId) -> Option<Departure> {
        let departure = self.locked().remove(peer_id);
        if let Some(d) = &departure {
            debug!(peer = %peer_id, room = %d.room, remaining = d.remaining.len(), "directory leave");
        }
        departure
    }

    /// Snapshot of a room's member set. Empty for unknown rooms.
    pub fn members_of(&self, room: &RoomId) -> Vec<PeerId> {
        self.locked()
            .rooms
            .get(room)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The room `peer_id` currently belongs to, if any.
    pub fn room_of(&self, peer_id: &PeerId) -> Option<RoomId> {
        self.locked().membership.get(peer_id).cloned()
    }

    /// Number of rooms currently holding at least one member.
    pub fn room_count(&self) -> usize {
        self.locked().rooms.len()
    }
}
