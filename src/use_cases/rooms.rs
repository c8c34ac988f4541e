// Room directory: lifecycle and membership of broadcast groups.

use crate::domain::{ConnectionId, Room, RoomId};
use std::collections::HashMap;
use std::sync::{
    OnceLock,
    atomic::{AtomicU64, Ordering},
};
use std::time::{SystemTime, UNIX_EPOCH};

const ROOM_TOKEN_LEN: usize = 6;
const DEFAULT_CREATOR: &str = "Unknown";

/// Outcome of removing a member from a room.
#[derive(Debug, PartialEq)]
pub enum MemberRemoval {
    /// The room was already gone; nothing to notify.
    UnknownRoom,
    /// The member was the last one; the room was deleted in the same step.
    RoomDeleted,
    /// Members that should receive the departure notification.
    Remaining(Vec<ConnectionId>),
}

/// Owns the live rooms. Empty rooms never survive a mutation: the directory
/// deletes a room the instant its last member is removed.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<RoomId, Room>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot for lobby display; read-only.
    pub fn list(&self) -> &HashMap<RoomId, Room> {
        &self.rooms
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// Inserts an empty room under a fresh token and returns its id and
    /// display name. Does not add any member.
    pub fn create(&mut self, name: Option<String>, creator: Option<String>) -> (RoomId, String) {
        let room_id = self.fresh_token();
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("Room {room_id}"));
        let creator = creator
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CREATOR.to_string());

        self.rooms.insert(
            room_id.clone(),
            Room {
                id: room_id.clone(),
                name: name.clone(),
                creator,
                members: Vec::new(),
            },
        );
        (room_id, name)
    }

    /// Appends the member, creating the room on the fly when the id is
    /// unknown. Returns the member list as it was before this join; a
    /// re-join of the same room first drops the stale slot so the returned
    /// snapshot never contains the joiner and membership stays duplicate-free.
    pub fn join(&mut self, room_id: &str, conn_id: ConnectionId) -> Vec<ConnectionId> {
        let room = self.rooms.entry(room_id.to_string()).or_insert_with(|| Room {
            id: room_id.to_string(),
            name: format!("Room {room_id}"),
            creator: DEFAULT_CREATOR.to_string(),
            members: Vec::new(),
        });

        room.members.retain(|id| *id != conn_id);
        let existing = room.members.clone();
        room.members.push(conn_id);
        existing
    }

    /// Removes the member; deletes the room in the same synchronous step when
    /// it empties. Unknown rooms and absent members are benign.
    pub fn remove_member(&mut self, room_id: &str, conn_id: ConnectionId) -> MemberRemoval {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return MemberRemoval::UnknownRoom;
        };

        room.members.retain(|id| *id != conn_id);
        if room.members.is_empty() {
            self.rooms.remove(room_id);
            return MemberRemoval::RoomDeleted;
        }
        MemberRemoval::Remaining(room.members.clone())
    }

    /// Short base-36 token, retried until unused so room ids are unique by
    /// construction.
    fn fresh_token(&self) -> RoomId {
        loop {
            let token = base36_token(ROOM_TOKEN_LEN);
            if !self.rooms.contains_key(&token) {
                return token;
            }
        }
    }
}

/// Short lowercase base-36 token from a process-unique counter.
///
/// The counter is seeded with the current time and bit-mixed so consecutive
/// tokens do not share a prefix; collisions within one process require wrapping
/// the counter.
fn base36_token(len: usize) -> String {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        AtomicU64::new(seed)
    });

    let mut value = counter.fetch_add(1, Ordering::Relaxed);
    value ^= value >> 33;
    value = value.wrapping_mul(0xff51_afd7_ed55_8ccd);
    value ^= value >> 33;

    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut token = String::with_capacity(len);
    for _ in 0..len {
        token.push(DIGITS[(value % 36) as usize] as char);
        value /= 36;
    }
    token
}
