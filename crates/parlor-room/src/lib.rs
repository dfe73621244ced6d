//! Rooms for Parlor.
//!
//! A room is one play session: a lobby that fills up, a preparation phase
//! where everyone submits questions and answers, and a game of turns that
//! runs until the content runs out. Each room runs as an isolated Tokio
//! task (actor model) that owns its state.
//!
//! # Key types
//!
//! - [`Room`]: the synchronous state machine and turn engine
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomRegistry`]: creates rooms, resolves codes, reaps idle rooms
//! - [`RoomState`]: lifecycle state machine
//! - [`RoomConfig`]: player limits and idle TTL

mod code;
mod config;
mod error;
mod game;
mod registry;
mod room;
mod shuffle;

pub use code::{generate_code, CODE_LEN};
pub use config::{RoomConfig, RoomState};
pub use error::RoomError;
pub use game::{Effects, Member, Presence, Room};
pub use registry::RoomRegistry;
pub use room::{Caller, PlayerSender, RoomHandle, RoomInfo};
pub use shuffle::shuffle;
