//! The per-room game state machine and turn engine.
//!
//! [`Room`] is plain data with synchronous operations. Each operation
//! takes the acting player, mutates the room, and returns the ordered
//! list of addressed notifications it produced ([`Effects`]). Nothing
//! here touches a socket; the room actor delivers the effects.
//!
//! ```text
//!   join ──→ [Lobby] ──start_game──→ [Preparation] ──add_content (all ready)──→ [Game]
//!               ↑                                                            │
//!               └────────────── advance_turn (content exhausted) ────────────┘
//! ```

use std::collections::{HashSet, VecDeque};

use parlor_protocol::{JoinedRoom, Player, PlayerId, Recipient, RoomCode, ServerEvent};
use rand::rngs::StdRng;

use crate::shuffle::shuffle;
use crate::{RoomConfig, RoomError, RoomState};

/// Addressed notifications produced by one operation, in emission order.
pub type Effects = Vec<(Recipient, ServerEvent)>;

/// Fewest active players a turn can run with: one on trial, one presenting.
const MIN_TURN_PLAYERS: usize = 2;

/// Whether a member's connection is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Active,
    /// Disconnected during a game. Kept in the roster until the room
    /// restarts, but skipped by every gate and by turn rotation.
    Departed,
}

/// A player plus their presence.
#[derive(Debug, Clone)]
pub struct Member {
    pub player: Player,
    pub presence: Presence,
}

impl Member {
    pub fn is_active(&self) -> bool {
        self.presence == Presence::Active
    }
}

/// One play session.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    host: PlayerId,
    /// The host's connection closed with nobody left to inherit the role.
    /// The next player to join becomes host.
    host_gone: bool,
    state: RoomState,
    config: RoomConfig,
    members: Vec<Member>,
    questions: Vec<String>,
    answers: Vec<String>,
    /// Ring of active players. Front = current player.
    queue: VecDeque<PlayerId>,
    /// Who passed the current readiness gate.
    ready: HashSet<PlayerId>,
    rng: StdRng,
}

impl Room {
    pub fn new(code: RoomCode, host: PlayerId, config: RoomConfig, rng: StdRng) -> Self {
        Self {
            code,
            host,
            host_gone: false,
            state: RoomState::Lobby,
            config,
            members: Vec::new(),
            questions: Vec::new(),
            answers: Vec::new(),
            queue: VecDeque::new(),
            ready: HashSet::new(),
            rng,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host(&self) -> PlayerId {
        self.host
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    /// Active players in join order.
    pub fn players(&self) -> Vec<Player> {
        self.members
            .iter()
            .filter(|m| m.is_active())
            .map(|m| m.player.clone())
            .collect()
    }

    /// The full roster, departed members included.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Number of active players.
    pub fn player_count(&self) -> usize {
        self.members.iter().filter(|m| m.is_active()).count()
    }

    pub fn is_member(&self, player: PlayerId) -> bool {
        self.members
            .iter()
            .any(|m| m.player.id == player && m.is_active())
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }

    /// The player on trial, while a game runs.
    pub fn current_player(&self) -> Option<PlayerId> {
        match self.state {
            RoomState::Game => self.queue.front().copied(),
            _ => None,
        }
    }

    /// The turn ring, current player first.
    pub fn queue(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.queue.iter().copied()
    }

    // -----------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------

    /// Adds a player to the lobby.
    pub fn join(&mut self, player: Player) -> Result<(JoinedRoom, Effects), RoomError> {
        if !self.state.is_joinable() {
            return Err(RoomError::GameInProgress(self.code.clone()));
        }
        if self.is_member(player.id) {
            return Err(RoomError::InvalidRequest(format!(
                "player {} is already in room {}",
                player.id, self.code
            )));
        }
        if self.player_count() >= self.config.max_players {
            return Err(RoomError::RoomFull(self.code.clone()));
        }

        let id = player.id;
        tracing::info!(
            room_code = %self.code,
            player_id = %id,
            username = %player.username,
            "player joined"
        );
        self.members.push(Member {
            player: player.clone(),
            presence: Presence::Active,
        });

        let mut effects = vec![(Recipient::AllExcept(id), ServerEvent::PlayerJoined(player))];
        if self.host_gone {
            self.host = id;
            self.host_gone = false;
            effects.push((Recipient::AllExcept(id), ServerEvent::HostChanged { host: id }));
        }

        let joined = JoinedRoom {
            room_code: self.code.clone(),
            players: self.players(),
            host: self.host,
        };
        Ok((joined, effects))
    }

    /// Host-only: lobby → preparation.
    pub fn start_game(&mut self, caller: PlayerId) -> Result<Effects, RoomError> {
        let actual = self.player_count();
        if actual < self.config.min_players {
            return Err(RoomError::NotEnoughPlayers {
                required: self.config.min_players,
                actual,
            });
        }
        self.expect_state(RoomState::Lobby)?;
        if caller != self.host {
            return Err(RoomError::NotAnOwner);
        }

        self.transition(RoomState::Preparation);
        self.ready.clear();
        tracing::info!(room_code = %self.code, players = actual, "preparation started");

        Ok(vec![(
            Recipient::All,
            ServerEvent::PreparationStarted {
                players: self.players(),
            },
        )])
    }

    /// Banks a player's content and marks them ready. The last player to
    /// submit starts the game and its first turn in the same call.
    pub fn add_content(
        &mut self,
        caller: PlayerId,
        questions: Vec<String>,
        answers: Vec<String>,
    ) -> Result<Effects, RoomError> {
        self.expect_state(RoomState::Preparation)?;
        if !self.is_member(caller) {
            return Err(RoomError::InvalidRequest(format!(
                "player {caller} is not in room {}",
                self.code
            )));
        }
        if self.ready.contains(&caller) {
            return Err(RoomError::InvalidRequest(format!(
                "player {caller} already submitted content"
            )));
        }

        tracing::debug!(
            room_code = %self.code,
            player_id = %caller,
            questions = questions.len(),
            answers = answers.len(),
            "content submitted"
        );
        self.questions.extend(questions);
        self.answers.extend(answers);
        self.ready.insert(caller);

        let mut effects = vec![(Recipient::AllExcept(caller), ServerEvent::PlayerReady(caller))];
        if self.preparation_complete() {
            self.begin_game(&mut effects);
        }
        Ok(effects)
    }

    /// Starts the next turn, or ends the game when content runs out.
    ///
    /// A turn needs one question and at least one answer per active
    /// player. The question and answers are popped from the end of their
    /// (already shuffled) pools. The queue rotates back-to-front; the new
    /// front is on trial and gets no answer, everyone after it gets the
    /// next answer in ring order.
    pub fn advance_turn(&mut self, effects: &mut Effects) {
        self.ready.clear();

        let active = self.player_count();
        let playable = active >= MIN_TURN_PLAYERS && self.answers.len() >= active;
        let question = match self.questions.pop() {
            Some(question) if playable => question,
            _ => {
                self.finish(effects);
                return;
            }
        };

        if let Some(back) = self.queue.pop_back() {
            self.queue.push_front(back);
        }
        let Some(current) = self.queue.front().copied() else {
            self.finish(effects);
            return;
        };

        let players = self.players();
        for (position, &player) in self.queue.iter().enumerate() {
            let answer = if position == 0 {
                None
            } else {
                self.answers.pop()
            };
            effects.push((
                Recipient::Player(player),
                ServerEvent::TurnStarted {
                    question: question.clone(),
                    answer,
                    current_player: current,
                    players: players.clone(),
                },
            ));
        }

        tracing::debug!(
            room_code = %self.code,
            current_player = %current,
            questions_left = self.questions.len(),
            answers_left = self.answers.len(),
            "turn started"
        );
    }

    /// A presenter says they are done. Fire-and-forget: anything that
    /// doesn't count toward the gate is ignored.
    pub fn finish_presentation(&mut self, caller: PlayerId) -> Effects {
        let mut effects = Vec::new();
        let Some(current) = self.current_player() else {
            tracing::debug!(room_code = %self.code, player_id = %caller, state = %self.state, "presentation outside a game ignored");
            return effects;
        };
        if caller == current || !self.queue.contains(&caller) || !self.ready.insert(caller) {
            tracing::debug!(room_code = %self.code, player_id = %caller, "presentation ignored");
            return effects;
        }

        effects.push((Recipient::AllExcept(caller), ServerEvent::PresentationDone(caller)));
        if self.presentations_complete() {
            effects.push((
                Recipient::All,
                ServerEvent::VotingPhase {
                    current_player: current,
                },
            ));
        }
        effects
    }

    /// The current player picks a winner, which ends the turn.
    ///
    /// `target` is not checked against the roster.
    pub fn cast_vote(&mut self, caller: PlayerId, target: PlayerId) -> Result<Effects, RoomError> {
        self.expect_state(RoomState::Game)?;
        if self.current_player() != Some(caller) {
            return Err(RoomError::NotYourTurn);
        }

        tracing::info!(room_code = %self.code, player_id = %caller, %target, "vote cast");
        let mut effects = vec![(Recipient::All, ServerEvent::PlayerVoted(target))];
        self.advance_turn(&mut effects);
        Ok(effects)
    }

    /// Reconciles a closed connection.
    ///
    /// In the lobby the player is dropped from the roster. During a game
    /// they are marked departed and removed from the turn ring; whatever
    /// gate they were holding up is re-evaluated.
    pub fn leave(&mut self, player: PlayerId) -> Effects {
        let mut effects = Vec::new();
        let was_current = self.current_player() == Some(player);
        let was_complete = self.state == RoomState::Game && self.presentations_complete();

        let index = self
            .members
            .iter()
            .position(|m| m.player.id == player && m.is_active());
        if let Some(index) = index {
            if self.state == RoomState::Lobby {
                self.members.remove(index);
            } else {
                self.members[index].presence = Presence::Departed;
            }
            self.ready.remove(&player);
            self.queue.retain(|&id| id != player);
            tracing::info!(room_code = %self.code, player_id = %player, state = %self.state, "player left");
            effects.push((Recipient::AllExcept(player), ServerEvent::PlayerLeft(player)));
        }

        if player == self.host && !self.host_gone {
            self.hand_off_host(&mut effects);
        }
        if index.is_none() || self.state == RoomState::Lobby {
            return effects;
        }

        if self.state == RoomState::Preparation {
            // Too few players left: the first turn ends the game at once.
            if self.player_count() < MIN_TURN_PLAYERS || self.preparation_complete() {
                self.begin_game(&mut effects);
            }
        } else if self.player_count() < MIN_TURN_PLAYERS {
            self.finish(&mut effects);
        } else if was_current {
            self.advance_turn(&mut effects);
        } else if !was_complete && self.presentations_complete() {
            if let Some(current) = self.current_player() {
                effects.push((
                    Recipient::All,
                    ServerEvent::VotingPhase {
                        current_player: current,
                    },
                ));
            }
        }
        effects
    }

    /// Resets the room to an empty lobby from `Game` (or re-clears a
    /// lobby). The host and the room code survive; everything else is
    /// cleared.
    pub fn restart(&mut self) {
        if self.state != RoomState::Lobby {
            self.transition(RoomState::Lobby);
        }
        self.members.clear();
        self.questions.clear();
        self.answers.clear();
        self.queue.clear();
        self.ready.clear();
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn expect_state(&self, expected: RoomState) -> Result<(), RoomError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RoomError::IllegalState {
                expected,
                actual: self.state,
            })
        }
    }

    fn transition(&mut self, next: RoomState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} → {next}",
            self.state
        );
        self.state = next;
    }

    fn active_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.members
            .iter()
            .filter(|m| m.is_active())
            .map(|m| m.player.id)
    }

    fn preparation_complete(&self) -> bool {
        self.player_count() > 0 && self.active_ids().all(|id| self.ready.contains(&id))
    }

    fn presentations_complete(&self) -> bool {
        self.queue.iter().skip(1).all(|id| self.ready.contains(id))
    }

    fn begin_game(&mut self, effects: &mut Effects) {
        self.transition(RoomState::Game);
        shuffle(&mut self.questions, &mut self.rng);
        shuffle(&mut self.answers, &mut self.rng);
        let mut order: Vec<PlayerId> = self.active_ids().collect();
        shuffle(&mut order, &mut self.rng);
        self.queue = order.into();

        tracing::info!(
            room_code = %self.code,
            players = self.queue.len(),
            questions = self.questions.len(),
            answers = self.answers.len(),
            "game started"
        );
        self.advance_turn(effects);
    }

    fn finish(&mut self, effects: &mut Effects) {
        tracing::info!(room_code = %self.code, "game finished");
        self.restart();
        effects.push((Recipient::All, ServerEvent::GameOver));
    }

    fn hand_off_host(&mut self, effects: &mut Effects) {
        let next = self.active_ids().next();
        match next {
            Some(next) => {
                self.host = next;
                tracing::info!(room_code = %self.code, host = %next, "host handed off");
                effects.push((Recipient::All, ServerEvent::HostChanged { host: next }));
            }
            None => self.host_gone = true,
        }
    }
}
