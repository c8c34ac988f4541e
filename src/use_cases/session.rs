// Session protocol handler: the single serialized event loop that owns all
// shared relay state.

use crate::domain::{ConnectionId, RoomId};
use crate::use_cases::admin::AdminChannel;
use crate::use_cases::fanout::FanOut;
use crate::use_cases::registry::ConnectionRegistry;
use crate::use_cases::rooms::{MemberRemoval, RoomDirectory};
use crate::use_cases::types::{OutboundEvent, SessionCommand, SessionEvent};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// All shared mutable relay state, owned by exactly one task.
///
/// Handlers are synchronous: every event is fully applied (registry and
/// directory together) before the next one is looked at, which is what keeps
/// room membership and player records consistent under join/leave races.
pub struct SessionState {
    registry: ConnectionRegistry,
    rooms: RoomDirectory,
    fanout: FanOut,
    admin: AdminChannel,
}

impl SessionState {
    pub fn new(admin_key: String) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            rooms: RoomDirectory::new(),
            fanout: FanOut::new(),
            admin: AdminChannel::new(admin_key),
        }
    }

    pub fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Connected { conn_id, outbound } => {
                self.registry.on_connect(conn_id);
                self.fanout.register(conn_id, outbound);
                info!(conn_id, "player connected");
            }
            SessionEvent::Command { conn_id, command } => self.on_command(conn_id, command),
            SessionEvent::Disconnected { conn_id } => self.on_disconnected(conn_id),
        }
    }

    fn on_command(&mut self, conn_id: ConnectionId, command: SessionCommand) {
        match command {
            SessionCommand::ListRooms => {
                self.fanout
                    .send_to_one(conn_id, OutboundEvent::RoomsList(self.rooms.list().clone()));
            }
            SessionCommand::CreateRoom { name, creator } => {
                let (id, name) = self.rooms.create(name, creator);
                info!(conn_id, room_id = %id, "room created");
                self.fanout
                    .send_to_one(conn_id, OutboundEvent::RoomCreated { id, name });
            }
            SessionCommand::JoinRoom { room_id, player_name } => {
                self.join_room(conn_id, room_id, player_name);
            }
            SessionCommand::Movement { position, rotation } => {
                self.registry.set_transform(conn_id, position, rotation);

                // No room yet: nothing to broadcast into.
                let Some(room_id) = self.registry.room_of(conn_id).map(str::to_owned) else {
                    return;
                };
                let Some(room) = self.rooms.get(&room_id) else {
                    return;
                };
                self.fanout.broadcast_to_room(
                    &room.members,
                    &OutboundEvent::PlayerMoved { id: conn_id, position, rotation },
                    conn_id,
                );
            }
            SessionCommand::AdminAuth { key } => {
                if self.admin.authenticate(conn_id, &key) {
                    let snapshot = self.admin.snapshot(&self.registry, &self.rooms);
                    self.fanout.send_to_one(conn_id, OutboundEvent::AdminData(snapshot));
                }
            }
            SessionCommand::AdminData => {
                if self.admin.is_subscriber(conn_id) {
                    let snapshot = self.admin.snapshot(&self.registry, &self.rooms);
                    self.fanout.send_to_one(conn_id, OutboundEvent::AdminData(snapshot));
                }
            }
        }
    }

    fn join_room(&mut self, conn_id: ConnectionId, room_id: RoomId, player_name: Option<String>) {
        if self.registry.get(conn_id).is_none() {
            // Disconnect raced the join; nothing to mutate.
            return;
        }

        if let Some(name) = player_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            self.registry.set_name(conn_id, name);
        }

        // Switching rooms leaves the old one exactly like a disconnect would;
        // membership must never point at two rooms at once. A re-join of the
        // same room is handled inside the directory.
        if let Some(current) = self.registry.room_of(conn_id).map(str::to_owned)
            && current != room_id
        {
            self.leave_room(conn_id, &current);
        }

        let existing = self.rooms.join(&room_id, conn_id);
        self.registry.set_room(conn_id, Some(room_id.clone()));

        // The joiner gets the members that were present before it; they get
        // an incremental join event.
        let snapshot = self.registry.players_by_ids(&existing);
        self.fanout
            .send_to_one(conn_id, OutboundEvent::CurrentPlayers(snapshot));
        if let Some(player) = self.registry.get(conn_id) {
            let joined = OutboundEvent::PlayerJoined(player.clone());
            self.fanout.broadcast_to_room(&existing, &joined, conn_id);
        }
        info!(conn_id, room_id = %room_id, "player joined room");
    }

    fn leave_room(&mut self, conn_id: ConnectionId, room_id: &str) {
        match self.rooms.remove_member(room_id, conn_id) {
            MemberRemoval::Remaining(members) => {
                self.fanout
                    .broadcast_to_room(&members, &OutboundEvent::PlayerLeft(conn_id), conn_id);
            }
            MemberRemoval::RoomDeleted => {
                info!(room_id, "room deleted (empty)");
            }
            MemberRemoval::UnknownRoom => {}
        }
    }

    fn on_disconnected(&mut self, conn_id: ConnectionId) {
        if let Some(room_id) = self.registry.on_disconnect(conn_id) {
            self.leave_room(conn_id, &room_id);
        }
        self.admin.remove(conn_id);
        self.fanout.unregister(conn_id);
        info!(conn_id, "player disconnected");
    }
}

/// Runs until every event sender is dropped. One event at a time: handlers
/// for different connections never interleave mid-mutation.
pub async fn session_task(mut event_rx: mpsc::Receiver<SessionEvent>, admin_key: String) {
    let mut state = SessionState::new(admin_key);
    while let Some(event) = event_rx.recv().await {
        state.handle(event);
    }
    debug!("session event channel closed; relay task exiting");
}
