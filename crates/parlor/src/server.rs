//! `ParlorServer` builder and server loop.
//!
//! This is the entry point for running a Parlor game server. It ties
//! together all the layers: transport → protocol → room.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parlor_protocol::{Codec, JsonCodec};
use parlor_room::{RoomConfig, RoomRegistry};
use parlor_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;

use crate::ParlorError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The
/// registry lock is held only to resolve or create a room, never while
/// talking to a room actor on a player's behalf.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: Mutex<RoomRegistry>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Parlor server.
///
/// # Example
///
/// ```rust,no_run
/// use parlor::prelude::*;
///
/// # async fn start() -> Result<(), ParlorError> {
/// let server = ParlorServer::builder()
///     .bind("0.0.0.0:4000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ParlorServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    reap_interval: Duration,
    seed: Option<u64>,
}

impl ParlorServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:4000".to_string(),
            room_config: RoomConfig::default(),
            reap_interval: Duration::from_secs(60),
            seed: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration every new room gets.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// How often idle rooms are reaped. `Duration::ZERO` disables reaping.
    pub fn reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval;
        self
    }

    /// Seeds room codes and every room's shuffles.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Binds the transport and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<ParlorServer<JsonCodec>, ParlorError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let registry = match self.seed {
            Some(seed) => RoomRegistry::with_seed(self.room_config, seed),
            None => RoomRegistry::new(self.room_config),
        };
        let state = Arc::new(ServerState {
            rooms: Mutex::new(registry),
            codec: JsonCodec,
        });

        Ok(ParlorServer {
            transport,
            state,
            reap_interval: self.reap_interval,
        })
    }
}

impl Default for ParlorServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Parlor game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ParlorServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
    reap_interval: Duration,
}

impl ParlorServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> ParlorServerBuilder {
        ParlorServerBuilder::new()
    }
}

impl<C: Codec> ParlorServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Starts the idle-room reaper, then accepts incoming connections and
    /// spawns a handler task for each. Runs until the process is
    /// terminated.
    pub async fn run(mut self) -> Result<(), ParlorError> {
        match self.local_addr() {
            Ok(addr) => tracing::info!(%addr, "Parlor server running"),
            Err(_) => tracing::info!("Parlor server running"),
        }

        if !self.reap_interval.is_zero() {
            tokio::spawn(reap_idle_rooms(Arc::clone(&self.state), self.reap_interval));
        }

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Periodically drops rooms nobody is using.
async fn reap_idle_rooms<C: Codec>(state: Arc<ServerState<C>>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let reaped = state.rooms.lock().await.reap_idle().await;
        if !reaped.is_empty() {
            tracing::info!(count = reaped.len(), "reaped idle rooms");
        }
    }
}
