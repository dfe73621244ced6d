//! Unified error type for Parlor.

use parlor_protocol::ProtocolError;
use parlor_room::RoomError;
use parlor_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ParlorError {
    /// A transport-level error (accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error. Normally these become `reply` frames; this
    /// variant is for the ones that escape a connection task.
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let parlor_err: ParlorError = err.into();
        assert!(matches!(parlor_err, ParlorError::Transport(_)));
        assert!(parlor_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let parlor_err: ParlorError = ProtocolError::Decode(json_err).into();
        assert!(matches!(parlor_err, ParlorError::Protocol(_)));
        assert!(parlor_err.to_string().starts_with("decode failed"));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NoSuchRoom("ABCDEF".into());
        let parlor_err: ParlorError = err.into();
        assert!(matches!(parlor_err, ParlorError::Room(_)));
        assert!(parlor_err.to_string().contains("ABCDEF"));
    }
}
