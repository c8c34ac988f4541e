// Broadcast fan-out over per-connection delivery queues.

use crate::domain::ConnectionId;
use crate::use_cases::types::OutboundEvent;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One independent delivery queue per connection.
///
/// Sends never block the session task: a recipient whose queue is full loses
/// that message rather than stalling everyone else. Delivery order across
/// recipients is unspecified; per recipient it follows queue order.
#[derive(Debug, Default)]
pub struct FanOut {
    sinks: HashMap<ConnectionId, mpsc::Sender<OutboundEvent>>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, conn_id: ConnectionId, sink: mpsc::Sender<OutboundEvent>) {
        self.sinks.insert(conn_id, sink);
    }

    pub fn unregister(&mut self, conn_id: ConnectionId) {
        self.sinks.remove(&conn_id);
    }

    /// Direct reply channel; unknown recipients are a benign no-op.
    pub fn send_to_one(&self, conn_id: ConnectionId, event: OutboundEvent) {
        let Some(sink) = self.sinks.get(&conn_id) else {
            return;
        };
        match sink.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(conn_id, "outbound queue full; dropping message");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                // Recipient is mid-disconnect; its cleanup event follows.
                debug!(conn_id, "outbound queue closed; dropping message");
            }
        }
    }

    /// Delivers to every listed member except the excluded originator.
    pub fn broadcast_to_room(
        &self,
        members: &[ConnectionId],
        event: &OutboundEvent,
        exclude: ConnectionId,
    ) {
        for member in members {
            if *member == exclude {
                continue;
            }
            self.send_to_one(*member, event.clone());
        }
    }
}
