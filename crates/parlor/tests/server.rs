//! Integration tests for the Parlor server, handler, and full connection flow.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parlor::prelude::*;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address.
async fn start_server() -> String {
    let server = ParlorServerBuilder::new()
        .bind("127.0.0.1:0")
        .seed(11)
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    addr
}

/// A connected client that has already consumed its welcome frame.
struct Client {
    ws: ClientWs,
    id: PlayerId,
}

impl Client {
    async fn connect(addr: &str) -> Self {
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("should connect");
        match next_frame(&mut ws).await {
            ServerFrame::Welcome { player_id, .. } => Self { ws, id: player_id },
            other => panic!("expected welcome, got {other:?}"),
        }
    }

    async fn send(&mut self, request: Value) {
        self.ws
            .send(Message::text(request.to_string()))
            .await
            .expect("send request");
    }

    async fn request(&mut self, id: u64, event: Value) {
        self.send(json!({ "id": id, "event": event })).await;
    }

    async fn next(&mut self) -> ServerFrame {
        next_frame(&mut self.ws).await
    }

    /// Reads frames until the reply with `id`; panics on anything else.
    async fn reply(&mut self, id: u64) -> Reply {
        match self.next().await {
            ServerFrame::Reply { id: got, reply } if got == id => reply,
            other => panic!("expected reply {id}, got {other:?}"),
        }
    }

    /// Reads frames until an event matching `pred` arrives.
    async fn event_where(&mut self, pred: impl Fn(&ServerEvent) -> bool) -> ServerEvent {
        loop {
            if let ServerFrame::Event(event) = self.next().await {
                if pred(&event) {
                    return event;
                }
            }
        }
    }
}

async fn next_frame(ws: &mut ClientWs) -> ServerFrame {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("frame should arrive in time")
            .expect("stream open")
            .expect("ok frame");
        match msg {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).expect("decode frame");
            }
            Message::Binary(data) => return serde_json::from_slice(&data).expect("decode frame"),
            _ => continue,
        }
    }
}

fn join(room_code: Option<&RoomCode>, username: &str) -> Value {
    json!({
        "type": "join-room",
        "data": { "room_code": room_code, "username": username }
    })
}

fn with_code(kind: &str, room_code: &RoomCode) -> Value {
    json!({ "type": kind, "data": { "room_code": room_code } })
}

/// Host creates a room; `guests` more players join it. Every client's
/// queue is drained of join traffic.
async fn table(addr: &str, guests: usize) -> (Vec<Client>, RoomCode) {
    let mut host = Client::connect(addr).await;
    host.request(1, join(None, "host")).await;
    let code = host.reply(1).await.room_code.expect("room code");

    let mut clients = vec![host];
    for n in 0..guests {
        let mut guest = Client::connect(addr).await;
        guest.request(1, join(Some(&code), &format!("guest{n}"))).await;
        assert!(guest.reply(1).await.is_ok());
        clients.push(guest);
    }
    // Everyone already seated hears about each later arrival.
    for (seat, client) in clients.iter_mut().enumerate() {
        for _ in seat + 1..=guests {
            client
                .event_where(|e| matches!(e, ServerEvent::PlayerJoined(_)))
                .await;
        }
    }
    (clients, code)
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_welcome_is_first_frame() {
    let addr = start_server().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");

    match next_frame(&mut ws).await {
        ServerFrame::Welcome {
            player_id,
            protocol_version,
        } => {
            assert!(player_id.0 > 0);
            assert_eq!(protocol_version, PROTOCOL_VERSION);
        }
        other => panic!("expected welcome, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_without_code_creates_room() {
    let addr = start_server().await;
    let mut alice = Client::connect(&addr).await;

    alice.request(7, join(None, "alice")).await;
    let reply = alice.reply(7).await;

    assert!(reply.is_ok());
    let code = reply.room_code.expect("room code");
    assert_eq!(code.as_str().len(), 6);
    assert!(code.as_str().chars().all(|c| c.is_ascii_uppercase()));
    assert_eq!(reply.host, Some(alice.id));
    assert_eq!(
        reply.players,
        Some(vec![Player::new(alice.id, "alice")])
    );
}

#[tokio::test]
async fn test_join_with_empty_code_creates_room() {
    let addr = start_server().await;
    let mut alice = Client::connect(&addr).await;

    alice
        .request(1, json!({ "type": "join-room", "data": { "room_code": "", "username": "alice" } }))
        .await;
    assert!(alice.reply(1).await.room_code.is_some());
}

#[tokio::test]
async fn test_join_unknown_room() {
    let addr = start_server().await;
    let mut alice = Client::connect(&addr).await;

    alice.request(1, join(Some(&RoomCode::new("QQQQQQ")), "alice")).await;

    assert_eq!(alice.reply(1).await, Reply::error(ErrorReason::NoSuchRoom));
}

#[tokio::test]
async fn test_room_code_is_case_insensitive() {
    let addr = start_server().await;
    let (_clients, code) = table(&addr, 0).await;

    let mut bob = Client::connect(&addr).await;
    bob.request(
        1,
        json!({
            "type": "join-room",
            "data": { "room_code": code.as_str().to_lowercase(), "username": "bob" }
        }),
    )
    .await;
    assert!(bob.reply(1).await.is_ok());
}

#[tokio::test]
async fn test_start_with_two_players_is_not_enough() {
    let addr = start_server().await;
    let (mut clients, code) = table(&addr, 1).await;

    clients[0].request(2, with_code("start-game", &code)).await;

    assert_eq!(
        clients[0].reply(2).await,
        Reply::error(ErrorReason::NotEnoughPlayers)
    );
}

#[tokio::test]
async fn test_start_by_guest_is_rejected() {
    let addr = start_server().await;
    let (mut clients, code) = table(&addr, 2).await;

    clients[1].request(2, with_code("start-game", &code)).await;

    assert_eq!(
        clients[1].reply(2).await,
        Reply::error(ErrorReason::NotAnOwner)
    );
}

#[tokio::test]
async fn test_start_unknown_room() {
    let addr = start_server().await;
    let mut alice = Client::connect(&addr).await;

    alice
        .request(3, with_code("start-game", &RoomCode::new("NOROOM")))
        .await;

    assert_eq!(alice.reply(3).await, Reply::error(ErrorReason::NoSuchRoom));
}

#[tokio::test]
async fn test_undecodable_request_with_id_is_invalid() {
    let addr = start_server().await;
    let mut alice = Client::connect(&addr).await;

    alice
        .request(9, json!({ "type": "fly-to-moon", "data": {} }))
        .await;
    assert_eq!(
        alice.reply(9).await,
        Reply::error(ErrorReason::InvalidRequest)
    );

    // Garbage without an id is dropped; the next reply is for request 10.
    alice
        .ws
        .send(Message::text("not json at all"))
        .await
        .expect("send garbage");
    alice.request(10, join(None, "alice")).await;
    assert!(alice.reply(10).await.is_ok());
}

#[tokio::test]
async fn test_full_round_over_websocket() {
    let addr = start_server().await;
    let (mut clients, code) = table(&addr, 2).await;

    clients[0].request(2, with_code("start-game", &code)).await;
    assert!(clients[0].reply(2).await.is_ok());
    for client in clients.iter_mut() {
        let event = client
            .event_where(|e| matches!(e, ServerEvent::PreparationStarted { .. }))
            .await;
        match event {
            ServerEvent::PreparationStarted { players } => assert_eq!(players.len(), 3),
            other => panic!("unexpected {other:?}"),
        }
    }

    for (n, client) in clients.iter_mut().enumerate() {
        client
            .request(
                3,
                json!({
                    "type": "add-questions",
                    "data": {
                        "room_code": code,
                        "questions": [format!("question {n}")],
                        "answers": [format!("answer {n}")]
                    }
                }),
            )
            .await;
    }

    let mut current = None;
    let mut answers = Vec::new();
    for client in clients.iter_mut() {
        // Reply to this client's own submission comes before its turn.
        loop {
            match client.next().await {
                ServerFrame::Reply { id: 3, reply } => {
                    assert!(reply.is_ok());
                    break;
                }
                ServerFrame::Event(ServerEvent::PlayerReady(_)) => continue,
                other => panic!("expected reply before turn, got {other:?}"),
            }
        }
        match client
            .event_where(|e| matches!(e, ServerEvent::TurnStarted { .. }))
            .await
        {
            ServerEvent::TurnStarted {
                answer,
                current_player,
                players,
                ..
            } => {
                assert_eq!(players.len(), 3);
                current = Some(current_player);
                if current_player == client.id {
                    assert_eq!(answer, None);
                } else {
                    answers.push(answer.expect("presenter gets an answer"));
                }
            }
            other => panic!("unexpected {other:?}"),
        }
    }
    assert_eq!(answers.len(), 2);
    assert_ne!(answers[0], answers[1]);

    // A vote from someone other than the current player is refused.
    let current = current.expect("a current player");
    let bystander = clients
        .iter_mut()
        .find(|c| c.id != current)
        .expect("a presenter");
    bystander
        .request(
            4,
            json!({ "type": "cast-vote", "data": { "room_code": code, "player": current } }),
        )
        .await;
    assert_eq!(
        bystander.reply(4).await,
        Reply::error(ErrorReason::NotYourTurn)
    );
}

#[tokio::test]
async fn test_disconnect_notifies_room() {
    let addr = start_server().await;
    let (mut clients, _code) = table(&addr, 1).await;

    let mut guest = clients.pop().expect("guest");
    let guest_id = guest.id;
    guest.ws.close(None).await.expect("close");

    let event = clients[0]
        .event_where(|e| matches!(e, ServerEvent::PlayerLeft(_)))
        .await;
    assert_eq!(event, ServerEvent::PlayerLeft(guest_id));
}

#[tokio::test]
async fn test_host_disconnect_hands_off_host() {
    let addr = start_server().await;
    let (mut clients, _code) = table(&addr, 2).await;

    let host = clients.remove(0);
    drop(host);

    let event = clients[0]
        .event_where(|e| matches!(e, ServerEvent::HostChanged { .. }))
        .await;
    assert_eq!(event, ServerEvent::HostChanged { host: clients[0].id });
}
