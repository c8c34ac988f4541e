// Shared primitives for one-time server bootstrapping across integration
// tests, plus a thin WebSocket client speaking the relay's wire protocol.
//
// Not every test binary uses every helper.
#![allow(dead_code)]

use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

// Global base URL used by all tests after the server publishes its bound address.
static SERVER_URL: OnceLock<String> = OnceLock::new();
// One-time guard that ensures the server bootstrap path runs only once.
static SERVER_READY: OnceLock<()> = OnceLock::new();

/// How long a test waits for an expected frame before failing.
const RECV_TIMEOUT: Duration = Duration::from_secs(5);
/// Grace window used to assert that a frame was NOT sent.
pub const SILENCE_WINDOW: Duration = Duration::from_millis(300);

/// Ensure the test server is running and return the shared ws base URL.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        // Local one-time slot where the server thread publishes its address.
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);
        // Spawn an OS thread so the server outlives individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                // Bind to an ephemeral port to avoid collisions with local services.
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("ws://{}", addr));
                // Start serving requests until the test process exits.
                relay_server::run(listener).await.expect("server failed");
            });
        });
        wait_for_server_url_and_readiness(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

// Wait for URL publication and then for the socket to accept TCP connections.
fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_URL.set(base_url.clone());

    let addr = base_url
        .strip_prefix("ws://")
        .expect("base url should use ws://");

    // Retry for a short period to avoid racing server bind/accept.
    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}

/// A room id that no other test (or test run) will collide with.
pub fn unique_room_id() -> String {
    format!("test-{}", uuid::Uuid::new_v4())
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One relay client over a real WebSocket, identified by the id the server
/// assigned in its identity packet.
pub struct TestClient {
    pub id: u64,
    stream: WsStream,
}

impl TestClient {
    pub async fn connect(base_url: &str) -> Self {
        let (mut stream, _response) = connect_async(format!("{base_url}/ws"))
            .await
            .expect("ws connect");

        // The first frame is always the identity packet.
        let identity = next_event(&mut stream, "identity").await;
        let id = identity["id"].as_u64().expect("identity id");

        Self { id, stream }
    }

    pub async fn send(&mut self, value: Value) {
        self.send_raw(&value.to_string()).await;
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.stream
            .send(Message::Text(text.to_string().into()))
            .await
            .expect("ws send");
    }

    /// Reads frames until one of the expected type arrives and returns its
    /// `data` payload. Unrelated frames are skipped.
    pub async fn expect_event(&mut self, event_type: &str) -> Value {
        next_event(&mut self.stream, event_type).await
    }

    /// Asserts that no frame at all arrives within the grace window.
    pub async fn expect_silence(&mut self) {
        match timeout(SILENCE_WINDOW, self.stream.next()).await {
            Err(_) => {}
            Ok(frame) => panic!("expected silence, got {frame:?}"),
        }
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}

async fn next_event(stream: &mut WsStream, event_type: &str) -> Value {
    loop {
        let frame = timeout(RECV_TIMEOUT, stream.next())
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for {event_type}"))
            .unwrap_or_else(|| panic!("stream ended waiting for {event_type}"))
            .expect("ws recv");

        if let Message::Text(text) = frame {
            let value: Value = serde_json::from_str(text.as_str()).expect("server sent valid json");
            if value["type"] == event_type {
                return value["data"].clone();
            }
        }
    }
}

/// Polls the lobby listing until the room disappears; panics if it survives
/// past the deadline.
pub async fn wait_for_room_gone(client: &mut TestClient, room_id: &str) {
    for _ in 0..50 {
        client
            .send(serde_json::json!({ "type": "getRooms" }))
            .await;
        let rooms = client.expect_event("roomsList").await;
        if rooms.get(room_id).is_none() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("room {room_id} was never deleted");
}
