// Admin channel: shared-key subscriptions and aggregate snapshots.

use crate::domain::ConnectionId;
use crate::use_cases::registry::ConnectionRegistry;
use crate::use_cases::rooms::RoomDirectory;
use crate::use_cases::types::AdminSnapshot;
use std::collections::HashSet;
use sysinfo::{ProcessesToUpdate, System};
use tracing::{debug, info};

/// Privileged subscriptions layered on the same transport as players.
///
/// A connection stays privileged for its whole life once the shared key has
/// been presented; a failed attempt changes nothing and sends no signal back.
pub struct AdminChannel {
    key: String,
    subscribers: HashSet<ConnectionId>,
}

impl AdminChannel {
    pub fn new(key: String) -> Self {
        Self {
            key,
            subscribers: HashSet::new(),
        }
    }

    /// Returns true when the presented key matches and the connection is now
    /// subscribed. Mismatches are logged at debug level only.
    pub fn authenticate(&mut self, conn_id: ConnectionId, key: &str) -> bool {
        if key != self.key {
            debug!(conn_id, "admin auth rejected");
            return false;
        }
        if self.subscribers.insert(conn_id) {
            info!(conn_id, "admin connected");
        }
        true
    }

    pub fn is_subscriber(&self, conn_id: ConnectionId) -> bool {
        self.subscribers.contains(&conn_id)
    }

    /// Subscriptions end with the connection, never before.
    pub fn remove(&mut self, conn_id: ConnectionId) {
        if self.subscribers.remove(&conn_id) {
            info!(conn_id, "admin disconnected");
        }
    }

    /// Fresh aggregate view of the relay for one subscriber.
    pub fn snapshot(&self, registry: &ConnectionRegistry, rooms: &RoomDirectory) -> AdminSnapshot {
        let rooms = rooms
            .list()
            .iter()
            .map(|(id, room)| (id.clone(), room.members.clone()))
            .collect();

        AdminSnapshot {
            total_players: registry.len(),
            rooms,
            memory_usage: process_memory_bytes(),
        }
    }
}

fn process_memory_bytes() -> u64 {
    let mut system = System::new();
    let Ok(pid) = sysinfo::get_current_pid() else {
        return 0;
    };
    let _ = system.refresh_processes(ProcessesToUpdate::Some(&[pid]), false);
    system.process(pid).map_or(0, sysinfo::Process::memory)
}
