//! Identity types shared by every layer: who a player is, which room
//! they are talking about, and who a server event is addressed to.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// There is no account system: a player *is* their connection, so the
/// gateway derives this from the transport's connection id. It serializes
/// as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The short code players type to find a room, e.g. `"QWERTY"`.
///
/// Codes are case-insensitive on input: construction trims whitespace
/// and uppercases, so `" qwerty"` and `"QWERTY"` name the same room.
/// Deserialization goes through the same normalization.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Creates a normalized room code.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty code means "create a new room" in a join request.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for RoomCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A player as other players see them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
}

impl Player {
    pub fn new(id: PlayerId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive an event?
// ---------------------------------------------------------------------------

/// Addresses a server event within a room.
///
/// Room operations return `(Recipient, ServerEvent)` pairs; the room
/// actor resolves them against the room's current subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every connection subscribed to the room.
    All,

    /// One specific player.
    Player(PlayerId),

    /// Every subscriber except the given player (usually the actor
    /// that caused the event).
    AllExcept(PlayerId),
}

impl Recipient {
    /// Returns `true` if `player` is addressed by this recipient.
    pub fn includes(&self, player: PlayerId) -> bool {
        match self {
            Self::All => true,
            Self::Player(target) => *target == player,
            Self::AllExcept(excluded) => *excluded != player,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
    }

    #[test]
    fn test_room_code_is_normalized() {
        assert_eq!(RoomCode::new(" qwErty ").as_str(), "QWERTY");
        assert_eq!(RoomCode::from("abc"), RoomCode::from("ABC"));
        assert!(RoomCode::new("   ").is_empty());
    }

    #[test]
    fn test_room_code_deserialization_normalizes() {
        let code: RoomCode = serde_json::from_str("\"zxcvbn\"").unwrap();
        assert_eq!(code.as_str(), "ZXCVBN");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"ZXCVBN\"");
    }

    #[test]
    fn test_player_json_shape() {
        let json = serde_json::to_value(Player::new(PlayerId(5), "ann")).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 5, "username": "ann" }));
    }

    #[test]
    fn test_recipient_includes() {
        let me = PlayerId(1);
        let other = PlayerId(2);
        assert!(Recipient::All.includes(me));
        assert!(Recipient::Player(me).includes(me));
        assert!(!Recipient::Player(me).includes(other));
        assert!(!Recipient::AllExcept(me).includes(me));
        assert!(Recipient::AllExcept(me).includes(other));
    }
}
