use std::env;

// Runtime/server constants (not relay behavior tuning).

pub fn http_port() -> u16 {
    env::var("RELAY_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

/// Shared secret for the admin channel. Override this in any real deployment.
pub fn admin_key() -> String {
    env::var("ADMIN_SECRET_KEY").unwrap_or_else(|_| "admin-secret-key".to_string())
}

pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 128;
