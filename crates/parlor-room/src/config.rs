//! Room configuration and lifecycle states.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every room a registry creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Minimum players required to start the game.
    pub min_players: usize,

    /// Maximum players allowed in the lobby.
    pub max_players: usize,

    /// How long a room may sit idle (no commands) before the reaper may
    /// remove it. Only lobbies without active players and rooms without
    /// any subscribed connection are eligible.
    pub idle_ttl: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 3,
            max_players: 16,
            idle_ttl: Duration::from_secs(30 * 60),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// The only edges are a cycle:
///
/// ```text
/// Lobby → Preparation → Game → Lobby
/// ```
///
/// - **Lobby**: accepting joins; the host may start.
/// - **Preparation**: players submit questions and answers.
/// - **Game**: turns are played until content runs out, then the room
///   resets to Lobby.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    Lobby,
    Preparation,
    Game,
}

impl RoomState {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// The single state reachable from this one.
    pub fn next(self) -> Self {
        match self {
            Self::Lobby => Self::Preparation,
            Self::Preparation => Self::Game,
            Self::Game => Self::Lobby,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == target
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "lobby"),
            Self::Preparation => write!(f, "preparation"),
            Self::Game => write!(f, "game"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_state_next_is_a_cycle() {
        assert_eq!(RoomState::Lobby.next(), RoomState::Preparation);
        assert_eq!(RoomState::Preparation.next(), RoomState::Game);
        assert_eq!(RoomState::Game.next(), RoomState::Lobby);
    }

    #[test]
    fn test_room_state_can_transition_to() {
        assert!(RoomState::Lobby.can_transition_to(RoomState::Preparation));
        assert!(!RoomState::Lobby.can_transition_to(RoomState::Game));
        assert!(!RoomState::Preparation.can_transition_to(RoomState::Lobby));
        assert!(!RoomState::Game.can_transition_to(RoomState::Preparation));
        assert!(!RoomState::Lobby.can_transition_to(RoomState::Lobby));
    }

    #[test]
    fn test_room_state_is_joinable() {
        assert!(RoomState::Lobby.is_joinable());
        assert!(!RoomState::Preparation.is_joinable());
        assert!(!RoomState::Game.is_joinable());
    }

    #[test]
    fn test_room_state_display_and_serde_agree() {
        for state in [RoomState::Lobby, RoomState::Preparation, RoomState::Game] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.min_players, 3);
        assert_eq!(config.max_players, 16);
        assert_eq!(config.idle_ttl, Duration::from_secs(1800));
    }
}
