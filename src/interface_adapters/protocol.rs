// Wire protocol DTOs and conversions for the public relay messages.
// Every message is adjacently tagged: {"type": <event>, "data": <payload>}.

use crate::domain::{Player, Room, Vec3};
use crate::use_cases::types::{AdminSnapshot, OutboundEvent, SessionCommand};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "getRooms")]
    GetRooms,
    #[serde(rename = "createRoom")]
    CreateRoom(CreateRoomPayload),
    #[serde(rename = "joinRoom")]
    JoinRoom(JoinRoomPayload),
    #[serde(rename = "playerMovement")]
    PlayerMovement(MovementPayload),
    #[serde(rename = "admin-auth")]
    AdminAuth(AdminAuthPayload),
    #[serde(rename = "get-admin-data")]
    GetAdminData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomPayload {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinRoomPayload {
    #[serde(rename = "roomId")]
    pub room_id: String,
    #[serde(rename = "playerName", default)]
    pub player_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovementPayload {
    pub position: Vec3Dto,
    pub rotation: Vec3Dto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminAuthPayload {
    pub key: String,
}

impl From<ClientMessage> for SessionCommand {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::GetRooms => SessionCommand::ListRooms,
            ClientMessage::CreateRoom(payload) => SessionCommand::CreateRoom {
                name: payload.name,
                creator: payload.creator,
            },
            ClientMessage::JoinRoom(payload) => SessionCommand::JoinRoom {
                room_id: payload.room_id,
                player_name: payload.player_name,
            },
            ClientMessage::PlayerMovement(payload) => SessionCommand::Movement {
                position: payload.position.into(),
                rotation: payload.rotation.into(),
            },
            ClientMessage::AdminAuth(payload) => SessionCommand::AdminAuth { key: payload.key },
            ClientMessage::GetAdminData => SessionCommand::AdminData,
        }
    }
}

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Assigned identity for the connection, sent once after the upgrade.
    #[serde(rename = "identity")]
    Identity { id: u64 },
    #[serde(rename = "roomsList")]
    RoomsList(HashMap<String, RoomDto>),
    #[serde(rename = "roomCreated")]
    RoomCreated { id: String, name: String },
    #[serde(rename = "currentPlayers")]
    CurrentPlayers(Vec<PlayerDto>),
    #[serde(rename = "playerJoined")]
    PlayerJoined(PlayerDto),
    #[serde(rename = "playerMoved")]
    PlayerMoved {
        id: u64,
        position: Vec3Dto,
        rotation: Vec3Dto,
    },
    // Raw connection id, not wrapped in an object.
    #[serde(rename = "playerLeft")]
    PlayerLeft(u64),
    #[serde(rename = "admin-data")]
    AdminData(AdminDataDto),
}

/// Position/rotation vector as it appears on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3Dto {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl From<Vec3Dto> for Vec3 {
    fn from(v: Vec3Dto) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

impl From<Vec3> for Vec3Dto {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

/// Room entry in the lobby listing.
#[derive(Debug, Clone, Serialize)]
pub struct RoomDto {
    pub id: String,
    pub name: String,
    pub players: Vec<u64>,
    pub creator: String,
}

impl From<&Room> for RoomDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.clone(),
            name: room.name.clone(),
            players: room.members.clone(),
            creator: room.creator.clone(),
        }
    }
}

/// Player state as shared with room peers.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerDto {
    pub id: u64,
    pub name: String,
    pub position: Vec3Dto,
    pub rotation: Vec3Dto,
}

impl From<&Player> for PlayerDto {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            position: player.position.into(),
            rotation: player.rotation.into(),
        }
    }
}

/// Aggregate snapshot for admin subscribers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDataDto {
    pub total_players: usize,
    pub rooms: HashMap<String, AdminRoomDto>,
    pub memory_usage: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminRoomDto {
    pub id: String,
    pub players: Vec<u64>,
}

impl From<AdminSnapshot> for AdminDataDto {
    fn from(snapshot: AdminSnapshot) -> Self {
        Self {
            total_players: snapshot.total_players,
            rooms: snapshot
                .rooms
                .into_iter()
                .map(|(id, players)| (id.clone(), AdminRoomDto { id, players }))
                .collect(),
            memory_usage: snapshot.memory_usage,
        }
    }
}

impl From<OutboundEvent> for ServerMessage {
    fn from(event: OutboundEvent) -> Self {
        match event {
            OutboundEvent::RoomsList(rooms) => ServerMessage::RoomsList(
                rooms
                    .into_iter()
                    .map(|(id, room)| (id, RoomDto::from(&room)))
                    .collect(),
            ),
            OutboundEvent::RoomCreated { id, name } => ServerMessage::RoomCreated { id, name },
            OutboundEvent::CurrentPlayers(players) => {
                ServerMessage::CurrentPlayers(players.iter().map(PlayerDto::from).collect())
            }
            OutboundEvent::PlayerJoined(player) => ServerMessage::PlayerJoined(PlayerDto::from(&player)),
            OutboundEvent::PlayerMoved { id, position, rotation } => ServerMessage::PlayerMoved {
                id,
                position: position.into(),
                rotation: rotation.into(),
            },
            OutboundEvent::PlayerLeft(id) => ServerMessage::PlayerLeft(id),
            OutboundEvent::AdminData(snapshot) => ServerMessage::AdminData(snapshot.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_parsing_bare_get_rooms_then_no_data_is_required() {
        let message: ClientMessage = serde_json::from_str(r#"{"type":"getRooms"}"#).unwrap();
        assert!(matches!(message, ClientMessage::GetRooms));
    }

    #[test]
    fn when_parsing_join_room_then_wire_field_names_are_camel_case() {
        let message: ClientMessage = serde_json::from_str(
            r#"{"type":"joinRoom","data":{"roomId":"abc123","playerName":"Ace"}}"#,
        )
        .unwrap();
        let ClientMessage::JoinRoom(payload) = message else {
            panic!("expected JoinRoom");
        };
        assert_eq!(payload.room_id, "abc123");
        assert_eq!(payload.player_name.as_deref(), Some("Ace"));
    }

    #[test]
    fn when_join_room_lacks_room_id_then_parsing_fails() {
        let result =
            serde_json::from_str::<ClientMessage>(r#"{"type":"joinRoom","data":{"playerName":"Ace"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn when_parsing_movement_then_missing_axes_default_to_zero() {
        let message: ClientMessage = serde_json::from_str(
            r#"{"type":"playerMovement","data":{"position":{"x":1.5},"rotation":{}}}"#,
        )
        .unwrap();
        let ClientMessage::PlayerMovement(payload) = message else {
            panic!("expected PlayerMovement");
        };
        assert_eq!(payload.position.x, 1.5);
        assert_eq!(payload.position.y, 0.0);
        assert_eq!(payload.rotation, Vec3Dto::default());
    }

    #[test]
    fn when_serializing_player_left_then_data_is_the_raw_id() {
        let txt = serde_json::to_string(&ServerMessage::PlayerLeft(42)).unwrap();
        assert_eq!(txt, r#"{"type":"playerLeft","data":42}"#);
    }

    #[test]
    fn when_serializing_admin_data_then_fields_are_camel_case() {
        let mut rooms = HashMap::new();
        rooms.insert("r1".to_string(), vec![1, 2]);
        let msg = ServerMessage::AdminData(
            AdminSnapshot {
                total_players: 2,
                rooms,
                memory_usage: 1024,
            }
            .into(),
        );

        let value: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "admin-data");
        assert_eq!(value["data"]["totalPlayers"], 2);
        assert_eq!(value["data"]["memoryUsage"], 1024);
        assert_eq!(value["data"]["rooms"]["r1"]["players"], serde_json::json!([1, 2]));
    }
}
