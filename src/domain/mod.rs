// Domain layer: plain records shared by the relay use cases.

pub mod state;

pub use state::{ConnectionId, DEFAULT_PLAYER_NAME, Player, Room, RoomId, Vec3};
