// Use cases layer: application workflows for the session relay.

pub mod admin;
pub mod fanout;
pub mod registry;
pub mod rooms;
pub mod session;
pub mod types;

pub use types::{AdminSnapshot, OutboundEvent, SessionCommand, SessionEvent};
