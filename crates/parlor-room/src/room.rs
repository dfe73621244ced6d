//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Commands are applied one at a time, so the
//! [`Room`] state machine never sees concurrent mutation, and every
//! notification a command produces is queued to the recipients before
//! the next command is looked at.

use std::collections::HashMap;
use std::time::Duration;

use parlor_protocol::{JoinedRoom, Player, PlayerId, Reply, RoomCode, ServerFrame};
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::game::{Effects, Room};
use crate::{RoomConfig, RoomError, RoomState};

/// Channel sender for delivering frames to a player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerFrame>;

/// Who is asking, and where their answer goes.
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: PlayerId,
    pub sender: PlayerSender,
    /// Request id to echo in the reply frame. `None` means the client
    /// doesn't want one.
    pub request: Option<u64>,
}

impl Caller {
    pub fn new(id: PlayerId, sender: PlayerSender) -> Self {
        Self {
            id,
            sender,
            request: None,
        }
    }

    pub fn with_request(mut self, request: Option<u64>) -> Self {
        self.request = request;
        self
    }
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Join {
        caller: Caller,
        username: String,
        reply: oneshot::Sender<Result<JoinedRoom, RoomError>>,
    },
    StartGame {
        caller: Caller,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    AddContent {
        caller: Caller,
        questions: Vec<String>,
        answers: Vec<String>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    /// Fire-and-forget.
    FinishPresentation { player_id: PlayerId },
    CastVote {
        caller: Caller,
        target: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    /// A connection that joined this room closed.
    Leave { player_id: PlayerId },
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },
    Shutdown,
}

impl std::fmt::Debug for RoomCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Join { .. } => "Join",
            Self::StartGame { .. } => "StartGame",
            Self::AddContent { .. } => "AddContent",
            Self::FinishPresentation { .. } => "FinishPresentation",
            Self::CastVote { .. } => "CastVote",
            Self::Leave { .. } => "Leave",
            Self::GetInfo { .. } => "GetInfo",
            Self::Shutdown => "Shutdown",
        };
        f.write_str(name)
    }
}

/// A snapshot of room metadata.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub state: RoomState,
    pub host: PlayerId,
    /// Active players.
    pub player_count: usize,
    /// Open connections that joined this room at some point.
    pub subscriber_count: usize,
    /// Time since the last command other than an info query.
    pub idle: Duration,
}

impl RoomInfo {
    /// Whether the reaper may remove this room.
    ///
    /// The room must have been idle for at least `ttl`, and either be an
    /// empty lobby or have no connection left to talk to.
    pub fn is_reapable(&self, ttl: Duration) -> bool {
        let empty_lobby = self.state == RoomState::Lobby && self.player_count == 0;
        self.idle >= ttl && (empty_lobby || self.subscriber_count == 0)
    }
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Adds the caller to the lobby and subscribes their connection to
    /// the room's notifications.
    pub async fn join(
        &self,
        caller: Caller,
        username: impl Into<String>,
    ) -> Result<JoinedRoom, RoomError> {
        let username = username.into();
        self.request(|reply| RoomCommand::Join {
            caller,
            username,
            reply,
        })
        .await?
    }

    pub async fn start_game(&self, caller: Caller) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::StartGame { caller, reply })
            .await?
    }

    pub async fn add_content(
        &self,
        caller: Caller,
        questions: Vec<String>,
        answers: Vec<String>,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::AddContent {
            caller,
            questions,
            answers,
            reply,
        })
        .await?
    }

    /// Fire-and-forget: no reply, errors are swallowed by the room.
    pub async fn finish_presentation(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.send(RoomCommand::FinishPresentation { player_id })
            .await
    }

    pub async fn cast_vote(&self, caller: Caller, target: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::CastVote {
            caller,
            target,
            reply,
        })
        .await?
    }

    /// Tells the room a joined connection closed.
    pub async fn leave(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.send(RoomCommand::Leave { player_id }).await
    }

    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::GetInfo { reply }).await
    }

    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(make(reply_tx)).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    /// Connections that joined this room and are still open. Survives a
    /// restart so the previous players hear about the next game.
    subscribers: HashMap<PlayerId, PlayerSender>,
    last_activity: Instant,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room_code = %self.room.code(), "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            if !matches!(cmd, RoomCommand::GetInfo { .. }) {
                self.last_activity = Instant::now();
            }
            tracing::trace!(room_code = %self.room.code(), ?cmd, "room command");

            match cmd {
                RoomCommand::Join {
                    caller,
                    username,
                    reply,
                } => {
                    let result = self.handle_join(&caller, username);
                    let _ = reply.send(result);
                }
                RoomCommand::StartGame { caller, reply } => {
                    let result = self.room.start_game(caller.id);
                    let _ = reply.send(self.settle(&caller, result));
                }
                RoomCommand::AddContent {
                    caller,
                    questions,
                    answers,
                    reply,
                } => {
                    let result = self.room.add_content(caller.id, questions, answers);
                    let _ = reply.send(self.settle(&caller, result));
                }
                RoomCommand::FinishPresentation { player_id } => {
                    let effects = self.room.finish_presentation(player_id);
                    self.dispatch(effects);
                }
                RoomCommand::CastVote {
                    caller,
                    target,
                    reply,
                } => {
                    let result = self.room.cast_vote(caller.id, target);
                    let _ = reply.send(self.settle(&caller, result));
                }
                RoomCommand::Leave { player_id } => {
                    self.subscribers.remove(&player_id);
                    let effects = self.room.leave(player_id);
                    self.dispatch(effects);
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room_code = %self.room.code(), "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room_code = %self.room.code(), "room actor stopped");
    }

    fn handle_join(&mut self, caller: &Caller, username: String) -> Result<JoinedRoom, RoomError> {
        match self.room.join(Player::new(caller.id, username)) {
            Ok((joined, effects)) => {
                self.subscribers.insert(caller.id, caller.sender.clone());
                self.reply(caller, Reply::joined(joined.clone()));
                self.dispatch(effects);
                Ok(joined)
            }
            Err(e) => {
                self.reject(caller, &e);
                Err(e)
            }
        }
    }

    /// Replies to the caller, then fans out the effects. The caller's
    /// reply is queued ahead of any notification it triggered.
    fn settle(&self, caller: &Caller, result: Result<Effects, RoomError>) -> Result<(), RoomError> {
        match result {
            Ok(effects) => {
                self.reply(caller, Reply::ok());
                self.dispatch(effects);
                Ok(())
            }
            Err(e) => {
                self.reject(caller, &e);
                Err(e)
            }
        }
    }

    fn reject(&self, caller: &Caller, error: &RoomError) {
        tracing::debug!(
            room_code = %self.room.code(),
            player_id = %caller.id,
            %error,
            "request rejected"
        );
        self.reply(caller, Reply::error(error.reason()));
    }

    fn reply(&self, caller: &Caller, reply: Reply) {
        if let Some(id) = caller.request {
            let _ = caller.sender.send(ServerFrame::Reply { id, reply });
        }
    }

    /// Delivers each effect to every subscriber it addresses. A closed
    /// receiver is skipped; its `Leave` is on the way.
    fn dispatch(&self, effects: Effects) {
        for (recipient, event) in effects {
            for (&player_id, sender) in &self.subscribers {
                if recipient.includes(player_id) {
                    let _ = sender.send(ServerFrame::Event(event.clone()));
                }
            }
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.room.code().clone(),
            state: self.room.state(),
            host: self.room.host(),
            player_count: self.room.player_count(),
            subscriber_count: self.subscribers.len(),
            idle: self.last_activity.elapsed(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub(crate) fn spawn_room(
    code: RoomCode,
    host: PlayerId,
    config: RoomConfig,
    rng: StdRng,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        room: Room::new(code.clone(), host, config, rng),
        subscribers: HashMap::new(),
        last_activity: Instant::now(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
