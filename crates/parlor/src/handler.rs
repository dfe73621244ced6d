//! Per-connection handler: welcome, request routing, and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Split the connection; a writer task drains the player's outbound
//!      channel, which room actors also push into
//!   2. Send `welcome` with the connection's player id
//!   3. Loop: decode requests → route each to its room actor
//!   4. On close, tell every joined room the player left

use std::sync::Arc;

use parlor_protocol::{
    ClientEvent, Codec, ErrorReason, PlayerId, Reply, Request, RequestId, ServerFrame,
    PROTOCOL_VERSION,
};
use parlor_room::{Caller, PlayerSender, RoomError, RoomHandle};
use parlor_transport::{
    Connection, ConnectionReader, ConnectionWriter, WebSocketConnection, WebSocketWriter,
};
use tokio::sync::mpsc;

use crate::ParlorError;
use crate::server::ServerState;

/// Drop guard that reports a closed connection to every room it joined.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, the leaves go out from a fire-and-forget task.
struct MembershipGuard {
    player_id: PlayerId,
    rooms: Vec<RoomHandle>,
}

impl MembershipGuard {
    fn track(&mut self, handle: &RoomHandle) {
        if !self.rooms.iter().any(|h| h.code() == handle.code()) {
            self.rooms.push(handle.clone());
        }
    }
}

impl Drop for MembershipGuard {
    fn drop(&mut self) {
        if self.rooms.is_empty() {
            return;
        }
        let player_id = self.player_id;
        let rooms = std::mem::take(&mut self.rooms);
        tokio::spawn(async move {
            for handle in rooms {
                let _ = handle.leave(player_id).await;
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ParlorError> {
    let conn_id = conn.id();
    let player_id = PlayerId(conn_id.into_inner());
    tracing::info!(%conn_id, %player_id, peer = %conn.peer_addr(), "player connected");

    let (mut reader, mut writer) = conn.into_split();

    let welcome = ServerFrame::Welcome {
        player_id,
        protocol_version: PROTOCOL_VERSION,
    };
    writer.send(&state.codec.encode(&welcome)?).await?;

    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(write_frames(writer, rx, Arc::clone(&state)));

    let mut guard = MembershipGuard {
        player_id,
        rooms: Vec::new(),
    };

    loop {
        let data = match reader.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
        };

        let request: Request = match state.codec.decode(&data) {
            Ok(request) => request,
            Err(e) => {
                let id = state
                    .codec
                    .decode::<RequestId>(&data)
                    .ok()
                    .and_then(|r| r.id);
                tracing::debug!(%player_id, error = %e, ?id, "failed to decode request");
                if let Some(id) = id {
                    let _ = tx.send(ServerFrame::Reply {
                        id,
                        reply: Reply::error(ErrorReason::InvalidRequest),
                    });
                }
                continue;
            }
        };

        route_request(&state, player_id, &tx, &mut guard, request).await;
    }

    // guard drops here → leaves fire.
    Ok(())
}

/// Encodes and writes every frame queued for this player.
///
/// Ends when the socket fails or when every sender is gone: the
/// handler's own, plus one per room that still has this player
/// subscribed.
async fn write_frames<C: Codec>(
    mut writer: WebSocketWriter,
    mut rx: mpsc::UnboundedReceiver<ServerFrame>,
    state: Arc<ServerState<C>>,
) {
    while let Some(frame) = rx.recv().await {
        let bytes = match state.codec.encode(&frame) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode frame");
                continue;
            }
        };
        if let Err(e) = writer.send(&bytes).await {
            tracing::debug!(error = %e, "send failed, stopping writer");
            break;
        }
    }
    let _ = writer.close().await;
}

/// Resolves the request's room and hands the request to its actor.
///
/// The actor sends the reply frame itself, ahead of any notification the
/// request triggers. The handler only answers when no actor could.
async fn route_request<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    tx: &PlayerSender,
    guard: &mut MembershipGuard,
    request: Request,
) {
    let Request { id, event } = request;
    let name = event.name();
    tracing::debug!(%player_id, event = name, ?id, "request");

    // finish-presentation never gets a reply; a vote for an unknown room
    // is dropped silently as well.
    let reply_if_missing = event.expects_reply() && !matches!(event, ClientEvent::CastVote { .. });

    let handle = match event.room_code() {
        Some(code) => state.rooms.lock().await.get(code),
        None => Some(state.rooms.lock().await.create_room(player_id)),
    };
    let Some(handle) = handle else {
        tracing::debug!(%player_id, event = name, "no such room");
        if reply_if_missing {
            reply(tx, id, Reply::error(ErrorReason::NoSuchRoom));
        }
        return;
    };

    let caller = Caller::new(player_id, tx.clone()).with_request(id);
    let result = match event {
        ClientEvent::JoinRoom { username, .. } => {
            let joined = handle.join(caller, username).await;
            if joined.is_ok() {
                guard.track(&handle);
            }
            joined.map(|_| ())
        }
        ClientEvent::StartGame { .. } => handle.start_game(caller).await,
        ClientEvent::AddQuestions {
            questions, answers, ..
        } => handle.add_content(caller, questions, answers).await,
        ClientEvent::FinishPresentation { .. } => handle.finish_presentation(player_id).await,
        ClientEvent::CastVote { player, .. } => handle.cast_vote(caller, player).await,
    };

    match result {
        Ok(()) => {}
        Err(RoomError::Unavailable(code)) => {
            tracing::debug!(%player_id, event = name, room_code = %code, "room went away");
            if reply_if_missing {
                reply(tx, id, Reply::error(ErrorReason::NoSuchRoom));
            }
        }
        Err(e) => {
            tracing::debug!(%player_id, event = name, error = %e, "request rejected");
        }
    }
}

fn reply(tx: &PlayerSender, id: Option<u64>, reply: Reply) {
    if let Some(id) = id {
        let _ = tx.send(ServerFrame::Reply { id, reply });
    }
}
