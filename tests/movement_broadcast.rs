mod support;

use serde_json::json;
use support::TestClient;

#[tokio::test]
async fn movement_reaches_every_room_peer_except_the_sender() {
    let base_url = support::ensure_server();
    let room_id = support::unique_room_id();

    let mut sender = TestClient::connect(base_url).await;
    sender
        .send(json!({"type": "joinRoom", "data": {"roomId": room_id, "playerName": "A"}}))
        .await;
    sender.expect_event("currentPlayers").await;

    let mut peer_b = TestClient::connect(base_url).await;
    peer_b
        .send(json!({"type": "joinRoom", "data": {"roomId": room_id, "playerName": "B"}}))
        .await;
    peer_b.expect_event("currentPlayers").await;
    sender.expect_event("playerJoined").await;

    let mut peer_c = TestClient::connect(base_url).await;
    peer_c
        .send(json!({"type": "joinRoom", "data": {"roomId": room_id, "playerName": "C"}}))
        .await;
    peer_c.expect_event("currentPlayers").await;
    sender.expect_event("playerJoined").await;
    peer_b.expect_event("playerJoined").await;

    sender
        .send(json!({
            "type": "playerMovement",
            "data": {
                "position": {"x": 10.0, "y": 20.0, "z": 30.0},
                "rotation": {"x": 0.1, "y": 0.2, "z": 0.3}
            }
        }))
        .await;

    for peer in [&mut peer_b, &mut peer_c] {
        let moved = peer.expect_event("playerMoved").await;
        assert_eq!(moved["id"].as_u64(), Some(sender.id));
        assert_eq!(moved["position"]["x"].as_f64(), Some(10.0));
        assert_eq!(moved["position"]["z"].as_f64(), Some(30.0));
        assert_eq!(moved["rotation"]["y"].as_f64().map(|v| v as f32), Some(0.2));
    }

    // The originator hears nothing back.
    sender.expect_silence().await;
}

#[tokio::test]
async fn movement_before_joining_a_room_is_dropped() {
    let base_url = support::ensure_server();

    let mut loner = TestClient::connect(base_url).await;
    loner
        .send(json!({
            "type": "playerMovement",
            "data": {
                "position": {"x": 1.0, "y": 2.0, "z": 3.0},
                "rotation": {"x": 0.0, "y": 0.0, "z": 0.0}
            }
        }))
        .await;

    loner.expect_silence().await;
}

#[tokio::test]
async fn malformed_messages_do_not_affect_the_connection() {
    let base_url = support::ensure_server();

    let mut client = TestClient::connect(base_url).await;
    client.send_raw("this is not json").await;
    client
        .send(json!({"type": "playerMovement", "data": {"position": {"x": 1.0}}}))
        .await;

    // Both messages were dropped; the connection still answers queries.
    client.send(json!({"type": "getRooms"})).await;
    let rooms = client.expect_event("roomsList").await;
    assert!(rooms.is_object());
}
