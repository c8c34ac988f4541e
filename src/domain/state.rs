// Domain-level records for connections and rooms.

/// Opaque per-session identifier assigned by the transport at connect time.
pub type ConnectionId = u64;

/// Short server-generated token identifying a room.
pub type RoomId = String;

/// Display name used until a client introduces itself on join.
pub const DEFAULT_PLAYER_NAME: &str = "Unknown";

/// 3-component vector reported by clients for position and rotation.
///
/// Values are relayed as-is; no server-side validation of magnitude or rate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One live client session and its last reported transform.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: ConnectionId,
    pub name: String,
    pub position: Vec3,
    pub rotation: Vec3,
    /// None until the client joins a room.
    pub room_id: Option<RoomId>,
}

impl Player {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            name: DEFAULT_PLAYER_NAME.to_string(),
            position: Vec3::default(),
            rotation: Vec3::default(),
            room_id: None,
        }
    }
}

/// A named grouping of connections that receive each other's broadcasts.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    /// Informational only; implicitly created rooms fall back to the default.
    pub creator: String,
    /// Connection ids in join order.
    pub members: Vec<ConnectionId>,
}
