//! Error types for the room layer.

use parlor_protocol::{ErrorReason, RoomCode};

use crate::RoomState;

/// Errors that can occur during room operations.
///
/// Every variant is recoverable and is reported only to the player who
/// made the request; [`RoomError::reason`] gives the wire form.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room code does not resolve to a live room.
    #[error("room {0} not found")]
    NoSuchRoom(RoomCode),

    /// Joins are only accepted in the lobby.
    #[error("room {0} already has a game in progress")]
    GameInProgress(RoomCode),

    /// The lobby is at `max_players`.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// Not enough players to start.
    #[error("need at least {required} players, have {actual}")]
    NotEnoughPlayers { required: usize, actual: usize },

    /// The room is in a phase that doesn't allow this operation.
    #[error("operation requires state {expected}, room is in {actual}")]
    IllegalState { expected: RoomState, actual: RoomState },

    /// Only the host may do this.
    #[error("only the host may do this")]
    NotAnOwner,

    /// Only the current player may vote.
    #[error("it is not your turn")]
    NotYourTurn,

    /// Anything else the client got wrong.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The room's actor is gone (shut down or reaped).
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl RoomError {
    /// The reason code sent to the client.
    pub fn reason(&self) -> ErrorReason {
        match self {
            Self::NoSuchRoom(_) | Self::Unavailable(_) => ErrorReason::NoSuchRoom,
            Self::GameInProgress(_) => ErrorReason::GameInProgress,
            Self::RoomFull(_) => ErrorReason::RoomFull,
            Self::NotEnoughPlayers { .. } => ErrorReason::NotEnoughPlayers,
            Self::IllegalState { .. } => ErrorReason::IllegalState,
            Self::NotAnOwner => ErrorReason::NotAnOwner,
            Self::NotYourTurn => ErrorReason::NotYourTurn,
            Self::InvalidRequest(_) => ErrorReason::InvalidRequest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_reads_as_missing_room() {
        let err = RoomError::Unavailable(RoomCode::new("ABCDEF"));
        assert_eq!(err.reason(), ErrorReason::NoSuchRoom);
    }

    #[test]
    fn test_illegal_state_message() {
        let err = RoomError::IllegalState {
            expected: RoomState::Preparation,
            actual: RoomState::Lobby,
        };
        assert_eq!(err.to_string(), "operation requires state preparation, room is in lobby");
        assert_eq!(err.reason(), ErrorReason::IllegalState);
    }
}
