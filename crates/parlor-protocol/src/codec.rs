//! Codec trait and implementations for serializing/deserializing frames.
//!
//! The gateway never touches `serde_json` directly: it holds something
//! that implements [`Codec`] and asks it to turn [`Request`]s and
//! [`ServerFrame`]s into bytes and back. [`JsonCodec`] is the only
//! implementation today; JSON keeps the protocol readable from browser
//! DevTools and from hand-written test clients.
//!
//! [`Request`]: crate::Request
//! [`ServerFrame`]: crate::ServerFrame

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because a single codec instance lives in the
/// shared server state and is used from every connection task at once.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do
    /// not match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// ## Example
///
/// ```rust
/// use parlor_protocol::{Codec, JsonCodec, PlayerId, ServerFrame, PROTOCOL_VERSION};
///
/// let codec = JsonCodec;
/// let frame = ServerFrame::Welcome {
///     player_id: PlayerId(3),
///     protocol_version: PROTOCOL_VERSION,
/// };
///
/// let bytes = codec.encode(&frame).unwrap();
/// let decoded: ServerFrame = codec.decode(&bytes).unwrap();
/// assert_eq!(frame, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
