//! # Parlor
//!
//! Real-time server for a turn-based party game.
//!
//! Clients connect over WebSocket and gather in rooms identified by a
//! short code. The host starts the game, everyone submits questions and
//! answers, and then each player in turn is "on trial": they get a
//! question, everyone else gets a random answer to present, and the
//! player on trial votes for the best one.
//!
//! This crate wires the layers together:
//!
//! ```text
//! parlor-transport (bytes) → parlor-protocol (frames) → parlor-room (game rules)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parlor::prelude::*;
//!
//! # async fn start() -> Result<(), ParlorError> {
//! let config = ServerConfig::from_env();
//! let server = ParlorServer::builder()
//!     .bind(&config.bind_addr())
//!     .room_config(config.room)
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::ServerConfig;
pub use error::ParlorError;
pub use server::{ParlorServer, ParlorServerBuilder};

/// Commonly used types, re-exported for convenience.
pub mod prelude {
    pub use crate::{ParlorError, ParlorServer, ParlorServerBuilder, ServerConfig};
    pub use parlor_protocol::{
        ClientEvent, ErrorReason, Player, PlayerId, Reply, Request, RoomCode, ServerEvent,
        ServerFrame, PROTOCOL_VERSION,
    };
    pub use parlor_room::{RoomConfig, RoomState};
}
