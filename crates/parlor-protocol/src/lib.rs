//! Wire protocol for Parlor.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Identity types** ([`PlayerId`], [`RoomCode`], [`Player`]) and
//!   addressing ([`Recipient`]).
//! - **Frames** ([`Request`], [`ClientEvent`], [`ServerFrame`],
//!   [`ServerEvent`], [`Reply`]).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how frames become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! It knows nothing about sockets or rooms.
//!
//! ```text
//! Transport (bytes) → Protocol (frames) → Room (game rules)
//! ```

mod codec;
mod error;
mod message;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{
    ClientEvent, ErrorReason, JoinedRoom, Reply, ReplyStatus, Request, RequestId, ServerEvent,
    ServerFrame, PROTOCOL_VERSION,
};
pub use types::{Player, PlayerId, Recipient, RoomCode};
