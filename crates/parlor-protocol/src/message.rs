//! Frames that travel on the wire.
//!
//! Inbound, a client sends a [`Request`]: an optional correlation `id`
//! plus a [`ClientEvent`]. Outbound, the server sends [`ServerFrame`]s:
//! a one-time `welcome`, `reply` frames correlated to request ids, and
//! `event` frames carrying [`ServerEvent`] notifications.
//!
//! Both enums use adjacently tagged JSON with kebab-case names:
//!
//! ```text
//! {"id": 1, "event": {"type": "join-room", "data": {"room_code": null, "username": "ann"}}}
//! {"type": "event", "data": {"type": "player-ready", "data": 3}}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Player, PlayerId, RoomCode};

/// The current protocol version, announced in the `welcome` frame.
pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// One inbound message.
///
/// Requests with an `id` receive exactly one `reply` frame (except for
/// fire-and-forget events, see [`ClientEvent::expects_reply`]). Requests
/// without an `id` are processed silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<u64>,
    pub event: ClientEvent,
}

/// Just the correlation id of a request.
///
/// Used to salvage an id from a frame whose `event` failed to decode, so
/// the client still gets an `invalid-request` reply.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RequestId {
    #[serde(default)]
    pub id: Option<u64>,
}

/// Actions a client can take.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Join an existing room, or create one when `room_code` is absent
    /// or empty.
    JoinRoom {
        #[serde(default)]
        room_code: Option<RoomCode>,
        username: String,
    },

    /// Host only: move the room from lobby to preparation.
    StartGame { room_code: RoomCode },

    /// Submit this player's questions and answers during preparation.
    AddQuestions {
        room_code: RoomCode,
        #[serde(default)]
        questions: Vec<String>,
        #[serde(default)]
        answers: Vec<String>,
    },

    /// "I have presented my answer." Never replied to.
    FinishPresentation { room_code: RoomCode },

    /// The current player picks the winning presenter.
    CastVote { room_code: RoomCode, player: PlayerId },
}

impl ClientEvent {
    /// The wire name of the event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom { .. } => "join-room",
            Self::StartGame { .. } => "start-game",
            Self::AddQuestions { .. } => "add-questions",
            Self::FinishPresentation { .. } => "finish-presentation",
            Self::CastVote { .. } => "cast-vote",
        }
    }

    /// The room this event targets. `None` for a join that creates a room.
    pub fn room_code(&self) -> Option<&RoomCode> {
        match self {
            Self::JoinRoom { room_code, .. } => room_code.as_ref().filter(|c| !c.is_empty()),
            Self::StartGame { room_code }
            | Self::AddQuestions { room_code, .. }
            | Self::FinishPresentation { room_code }
            | Self::CastVote { room_code, .. } => Some(room_code),
        }
    }

    /// `false` for fire-and-forget events.
    pub fn expects_reply(&self) -> bool {
        !matches!(self, Self::FinishPresentation { .. })
    }
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Notifications pushed to room subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Someone else joined the lobby.
    PlayerJoined(Player),

    /// The host started the game; submit content now.
    PreparationStarted { players: Vec<Player> },

    /// A player submitted their content.
    PlayerReady(PlayerId),

    /// A new turn. Personalized: `answer` is `None` for the current
    /// player and a distinct answer for everyone else.
    TurnStarted {
        question: String,
        answer: Option<String>,
        current_player: PlayerId,
        players: Vec<Player>,
    },

    /// A presenter finished.
    PresentationDone(PlayerId),

    /// Every presenter finished; the current player may vote.
    VotingPhase { current_player: PlayerId },

    /// The current player voted for this player.
    PlayerVoted(PlayerId),

    /// The content ran out (or too few players remain). The room is back
    /// in the lobby with an empty roster.
    GameOver,

    /// A player's connection closed.
    PlayerLeft(PlayerId),

    /// Host authority moved to another player.
    HostChanged { host: PlayerId },
}

/// Outcome of a request, as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Ok,
    Error,
}

/// Why a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorReason {
    NoSuchRoom,
    GameInProgress,
    NotEnoughPlayers,
    IllegalState,
    NotAnOwner,
    NotYourTurn,
    RoomFull,
    InvalidRequest,
}

impl ErrorReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSuchRoom => "no-such-room",
            Self::GameInProgress => "game-in-progress",
            Self::NotEnoughPlayers => "not-enough-players",
            Self::IllegalState => "illegal-state",
            Self::NotAnOwner => "not-an-owner",
            Self::NotYourTurn => "not-your-turn",
            Self::RoomFull => "room-full",
            Self::InvalidRequest => "invalid-request",
        }
    }
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a successful join tells the new player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedRoom {
    pub room_code: RoomCode,
    pub players: Vec<Player>,
    pub host: PlayerId,
}

/// The body of a `reply` frame.
///
/// Flat on the wire: `{"status": "ok"}`,
/// `{"status": "error", "reason": "no-such-room"}`, or for joins
/// `{"status": "ok", "room_code": ..., "players": [...], "host": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub status: ReplyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ErrorReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_code: Option<RoomCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<Player>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<PlayerId>,
}

impl Reply {
    pub fn ok() -> Self {
        Self {
            status: ReplyStatus::Ok,
            reason: None,
            room_code: None,
            players: None,
            host: None,
        }
    }

    pub fn error(reason: ErrorReason) -> Self {
        Self {
            status: ReplyStatus::Error,
            reason: Some(reason),
            ..Self::ok()
        }
    }

    pub fn joined(joined: JoinedRoom) -> Self {
        Self {
            room_code: Some(joined.room_code),
            players: Some(joined.players),
            host: Some(joined.host),
            ..Self::ok()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ReplyStatus::Ok
    }
}

/// Every frame the server writes to a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerFrame {
    /// First frame on every connection: "this is who you are".
    Welcome {
        player_id: PlayerId,
        protocol_version: u32,
    },

    /// Answer to the request with the same `id`.
    Reply { id: u64, reply: Reply },

    /// A room notification.
    Event(ServerEvent),
}
