// Connection registry: transient per-session player records.

use crate::domain::{ConnectionId, Player, RoomId, Vec3};
use std::collections::HashMap;

/// Owns the live player records, keyed by connection id.
///
/// Only the session task mutates this, so a join/leave can never interleave
/// with a broadcast that enumerates the same records. Mutations referencing a
/// connection that already disconnected are silent no-ops; an in-flight
/// movement message can legally arrive after its sender is gone.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    players: HashMap<ConnectionId, Player>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection with default fields and no room.
    pub fn on_connect(&mut self, conn_id: ConnectionId) {
        self.players.insert(conn_id, Player::new(conn_id));
    }

    /// Removes the record and returns the room it last belonged to, so the
    /// directory can clean up membership.
    pub fn on_disconnect(&mut self, conn_id: ConnectionId) -> Option<RoomId> {
        self.players.remove(&conn_id).and_then(|player| player.room_id)
    }

    pub fn set_name(&mut self, conn_id: ConnectionId, name: &str) {
        if let Some(player) = self.players.get_mut(&conn_id) {
            player.name = name.to_string();
        }
    }

    pub fn set_transform(&mut self, conn_id: ConnectionId, position: Vec3, rotation: Vec3) {
        if let Some(player) = self.players.get_mut(&conn_id) {
            player.position = position;
            player.rotation = rotation;
        }
    }

    /// Room pointer mutation; paired with the directory update in the same
    /// synchronous handler step so the membership invariant holds.
    pub fn set_room(&mut self, conn_id: ConnectionId, room_id: Option<RoomId>) {
        if let Some(player) = self.players.get_mut(&conn_id) {
            player.room_id = room_id;
        }
    }

    pub fn get(&self, conn_id: ConnectionId) -> Option<&Player> {
        self.players.get(&conn_id)
    }

    pub fn room_of(&self, conn_id: ConnectionId) -> Option<&str> {
        self.players.get(&conn_id).and_then(|player| player.room_id.as_deref())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Resolves member ids to player records, skipping ids that raced away.
    pub fn players_by_ids(&self, ids: &[ConnectionId]) -> Vec<Player> {
        ids.iter()
            .filter_map(|id| self.players.get(id).cloned())
            .collect()
    }
}
