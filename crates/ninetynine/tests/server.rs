//! Integration tests for the server: full connection flow over a real
//! WebSocket, from join to play to leave.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use ninetynine::prelude::*;
use tokio_tungstenite::tungstenite::Message;

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port with the given rooms seeded and
/// returns the address.
async fn start_server(rooms: &[(&str, &str)]) -> String {
    let store = Arc::new(InMemoryStore::new());
    for (room_id, owner_id) in rooms {
        store.insert_room(RoomDoc::new(*room_id, *owner_id)).await;
    }

    let server = ServerBuilder::new()
        .bind("127.0.0.1:0")
        .build(store)
        .await
        .expect("server should build");
    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str, room_id: &str) -> ClientWs {
    let (ws, _) =
        tokio_tungstenite::connect_async(format!("ws://{addr}/ws/{room_id}"))
            .await
            .expect("should connect");
    ws
}

async fn send_json(ws: &mut ClientWs, json: &str) {
    ws.send(Message::Text(json.to_string().into()))
        .await
        .expect("send should succeed");
}

/// Receives the next server frame, skipping non-data messages.
async fn recv_frame(ws: &mut ClientWs) -> ServerFrame {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("frame should arrive")
            .expect("stream should be open")
            .expect("recv should succeed");
        match msg {
            Message::Text(text) => {
                return serde_json::from_str(&text).expect("valid frame");
            }
            Message::Binary(data) => {
                return serde_json::from_slice(&data).expect("valid frame");
            }
            _ => continue,
        }
    }
}

/// Receives frames until one carries the wanted action label.
async fn recv_action(ws: &mut ClientWs, wanted: &str) -> ServerFrame {
    loop {
        let frame = recv_frame(ws).await;
        if frame.action == wanted {
            return frame;
        }
    }
}

/// Receives frames until an error reply arrives.
async fn recv_error(ws: &mut ClientWs) -> String {
    loop {
        let frame = recv_frame(ws).await;
        if !frame.error.is_empty() {
            return frame.error;
        }
    }
}

async fn join(ws: &mut ClientWs, user_id: &str, username: &str) {
    send_json(
        ws,
        &format!(
            r#"{{"action":"join","userId":"{user_id}","username":"{username}","profilePic":""}}"#
        ),
    )
    .await;
    let _ = recv_action(ws, &format!("player {username} joined")).await;
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_unknown_room_is_rejected() {
    let addr = start_server(&[("r1", "u1")]).await;
    let mut ws = connect(&addr, "nope").await;

    let frame = recv_frame(&mut ws).await;
    assert_eq!(frame.error, "Room does not exist");
    assert!(frame.game_data.is_none());

    // The server closes the connection after the rejection.
    let result =
        tokio::time::timeout(Duration::from_secs(2), ws.next()).await;
    match result {
        Ok(Some(Ok(Message::Close(_)))) | Ok(None) => {}
        Ok(Some(Err(_))) => {}
        other => panic!("expected close, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_broadcasts_the_roster() {
    let addr = start_server(&[("r1", "u1")]).await;
    let mut ws = connect(&addr, "r1").await;

    send_json(
        &mut ws,
        r#"{"action":"join","userId":"u1","username":"alice","profilePic":"http://a/1.png"}"#,
    )
    .await;

    let frame = recv_action(&mut ws, "player alice joined").await;
    let view = frame.game_data.expect("broadcast should carry game data");
    assert_eq!(view.status, GameStatus::Waiting);
    assert_eq!(view.players.len(), 1);
    assert_eq!(view.players[0].player_id, "u1");
    assert_eq!(view.players[0].player_avatar_url, "http://a/1.png");
    // No cards before the deal.
    assert!(view.player_cards.is_empty());
}

#[tokio::test]
async fn test_second_join_is_visible_to_both() {
    let addr = start_server(&[("r1", "u1")]).await;
    let mut ws1 = connect(&addr, "r1").await;
    let mut ws2 = connect(&addr, "r1").await;

    join(&mut ws1, "u1", "alice").await;
    join(&mut ws2, "u2", "bob").await;

    let frame = recv_action(&mut ws1, "player bob joined").await;
    assert_eq!(frame.game_data.unwrap().players.len(), 2);
}

#[tokio::test]
async fn test_invalid_body_gets_an_error_reply() {
    let addr = start_server(&[("r1", "u1")]).await;
    let mut ws = connect(&addr, "r1").await;

    send_json(&mut ws, "not json at all").await;
    assert_eq!(recv_error(&mut ws).await, "Invalid request body");

    // The connection survives a bad frame.
    join(&mut ws, "u1", "alice").await;
}

#[tokio::test]
async fn test_start_requires_two_players() {
    let addr = start_server(&[("r1", "u1")]).await;
    let mut ws = connect(&addr, "r1").await;
    join(&mut ws, "u1", "alice").await;

    send_json(&mut ws, r#"{"action":"start"}"#).await;
    assert_eq!(recv_error(&mut ws).await, "Not enough players");
}

#[tokio::test]
async fn test_only_the_owner_can_start() {
    let addr = start_server(&[("r1", "u1")]).await;
    let mut ws1 = connect(&addr, "r1").await;
    let mut ws2 = connect(&addr, "r1").await;
    join(&mut ws1, "u1", "alice").await;
    join(&mut ws2, "u2", "bob").await;

    send_json(&mut ws2, r#"{"action":"start"}"#).await;
    assert_eq!(
        recv_error(&mut ws2).await,
        "Only owner can start the game"
    );
}

#[tokio::test]
async fn test_play_before_start_is_invalid() {
    let addr = start_server(&[("r1", "u1")]).await;
    let mut ws = connect(&addr, "r1").await;
    join(&mut ws, "u1", "alice").await;

    send_json(
        &mut ws,
        r#"{"action":"play","card":{"value":5,"isSpecial":false}}"#,
    )
    .await;
    assert_eq!(recv_error(&mut ws).await, "Invalid play");
}

#[tokio::test]
async fn test_start_deals_and_first_play_is_broadcast() {
    let addr = start_server(&[("r1", "u1")]).await;
    let mut ws1 = connect(&addr, "r1").await;
    let mut ws2 = connect(&addr, "r1").await;
    join(&mut ws1, "u1", "alice").await;
    join(&mut ws2, "u2", "bob").await;

    send_json(&mut ws1, r#"{"action":"start"}"#).await;

    let alice_started = recv_action(&mut ws1, "game started").await;
    let bob_started = recv_action(&mut ws2, "game started").await;

    let alice_view = alice_started.game_data.unwrap();
    let bob_view = bob_started.game_data.unwrap();
    assert_eq!(alice_view.status, GameStatus::Playing);
    assert_eq!(alice_view.player_cards.len(), 3);
    assert_eq!(bob_view.player_cards.len(), 3);
    assert_eq!(alice_view.current_player_index, 0);
    assert_eq!(alice_view.stack_value, 0);
    assert_eq!(alice_view.max_stack_value, 99);

    // With an empty stack any held card is legal; alice opens.
    let card = alice_view.player_cards[0];
    let play = serde_json::to_string(&ClientFrame::Play { card }).unwrap();
    send_json(&mut ws1, &play).await;

    let frame = recv_action(&mut ws2, "player alice played a card").await;
    let view = frame.game_data.unwrap();
    assert_eq!(view.last_played_card, Some(card));
    if !card.is_special {
        assert_eq!(view.stack_value, card.value);
    }
}

#[tokio::test]
async fn test_playing_out_of_turn_is_invalid() {
    let addr = start_server(&[("r1", "u1")]).await;
    let mut ws1 = connect(&addr, "r1").await;
    let mut ws2 = connect(&addr, "r1").await;
    join(&mut ws1, "u1", "alice").await;
    join(&mut ws2, "u2", "bob").await;

    send_json(&mut ws1, r#"{"action":"start"}"#).await;
    let started = recv_action(&mut ws2, "game started").await;
    let bob_view = started.game_data.unwrap();

    // It is alice's turn; bob jumps the queue.
    let card = bob_view.player_cards[0];
    let play = serde_json::to_string(&ClientFrame::Play { card }).unwrap();
    send_json(&mut ws2, &play).await;
    assert_eq!(recv_error(&mut ws2).await, "Invalid play");
}

#[tokio::test]
async fn test_disconnect_before_start_is_broadcast() {
    let addr = start_server(&[("r1", "u1")]).await;
    let mut ws1 = connect(&addr, "r1").await;
    let mut ws2 = connect(&addr, "r1").await;
    join(&mut ws1, "u1", "alice").await;
    join(&mut ws2, "u2", "bob").await;
    let _ = recv_action(&mut ws1, "player bob joined").await;

    ws2.close(None).await.expect("close should succeed");

    let frame = recv_action(&mut ws1, "player bob left").await;
    let view = frame.game_data.unwrap();
    assert_eq!(view.players.len(), 1);
    assert_eq!(view.players[0].player_id, "u1");
}

#[tokio::test]
async fn test_leave_frame_keeps_the_seat() {
    let addr = start_server(&[("r1", "u1")]).await;
    let mut ws1 = connect(&addr, "r1").await;
    let mut ws2 = connect(&addr, "r1").await;
    join(&mut ws1, "u1", "alice").await;
    join(&mut ws2, "u2", "bob").await;

    // Only closing the connection removes a player; the frame alone
    // changes nothing.
    send_json(&mut ws2, r#"{"action":"leave"}"#).await;
    send_json(&mut ws2, r#"{"action":"start"}"#).await;
    assert_eq!(
        recv_error(&mut ws2).await,
        "Only owner can start the game"
    );
}

#[tokio::test]
async fn test_start_after_game_ended_closes_the_connection() {
    let addr = start_server(&[("r1", "u1")]).await;
    let mut ws1 = connect(&addr, "r1").await;
    let mut ws2 = connect(&addr, "r1").await;
    join(&mut ws1, "u1", "alice").await;
    join(&mut ws2, "u2", "bob").await;

    send_json(&mut ws1, r#"{"action":"start"}"#).await;
    let _ = recv_action(&mut ws1, "game started").await;

    // Bob dropping out of a two-player match ends it and retires the
    // game actor.
    ws2.close(None).await.expect("close should succeed");
    let _ = recv_action(&mut ws1, "game ended").await;

    // A start against the retired actor must tear the connection down,
    // not strand it.
    send_json(&mut ws1, r#"{"action":"start"}"#).await;
    let result = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws1.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(result.is_ok(), "connection should close");
}

#[tokio::test]
async fn test_rejoin_resumes_the_seat() {
    let addr = start_server(&[("r1", "u1")]).await;
    let mut ws1 = connect(&addr, "r1").await;
    join(&mut ws1, "u1", "alice").await;

    // Same user id on a second connection.
    let mut ws2 = connect(&addr, "r1").await;
    send_json(
        &mut ws2,
        r#"{"action":"join","userId":"u1","username":"alice","profilePic":""}"#,
    )
    .await;

    let frame = recv_action(&mut ws2, "player alice rejoined").await;
    assert_eq!(frame.game_data.unwrap().players.len(), 1);
}
