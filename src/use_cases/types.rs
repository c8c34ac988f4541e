// Use-case level inputs/outputs for the session task.

use crate::domain::{ConnectionId, Player, Room, RoomId, Vec3};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Decoded client intent, one variant per supported wire message.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    ListRooms,
    CreateRoom {
        name: Option<String>,
        creator: Option<String>,
    },
    JoinRoom {
        room_id: RoomId,
        player_name: Option<String>,
    },
    Movement {
        position: Vec3,
        rotation: Vec3,
    },
    AdminAuth {
        key: String,
    },
    AdminData,
}

/// Connection lifecycle and traffic events consumed by the session task.
#[derive(Debug)]
pub enum SessionEvent {
    /// A transport-level connect; carries the connection's delivery queue.
    Connected {
        conn_id: ConnectionId,
        outbound: mpsc::Sender<OutboundEvent>,
    },
    Command {
        conn_id: ConnectionId,
        command: SessionCommand,
    },
    Disconnected {
        conn_id: ConnectionId,
    },
}

/// Events the session task emits toward a single connection.
#[derive(Debug, Clone)]
pub enum OutboundEvent {
    RoomsList(HashMap<RoomId, Room>),
    RoomCreated {
        id: RoomId,
        name: String,
    },
    /// Room members as they were before the recipient joined.
    CurrentPlayers(Vec<Player>),
    PlayerJoined(Player),
    PlayerMoved {
        id: ConnectionId,
        position: Vec3,
        rotation: Vec3,
    },
    PlayerLeft(ConnectionId),
    AdminData(AdminSnapshot),
}

/// Aggregate view served to admin subscribers.
#[derive(Debug, Clone)]
pub struct AdminSnapshot {
    pub total_players: usize,
    /// Member ids per live room.
    pub rooms: HashMap<RoomId, Vec<ConnectionId>>,
    /// Resident memory of this process, in bytes.
    pub memory_usage: u64,
}
