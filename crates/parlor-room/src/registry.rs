//! Room registry: creates rooms, resolves codes, and reaps idle rooms.

use std::collections::HashMap;

use parlor_protocol::{PlayerId, RoomCode};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::code::generate_code;
use crate::room::spawn_room;
use crate::{RoomConfig, RoomError, RoomHandle, RoomInfo};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Owns every live room, keyed by code.
///
/// This is the entry point for room operations from the gateway. It is
/// not itself shared; the server wraps it in a mutex and holds the lock
/// only long enough to resolve or create a room.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, RoomHandle>,
    config: RoomConfig,
    /// Drives room codes and seeds each room's own RNG.
    rng: StdRng,
}

impl RoomRegistry {
    /// Creates an empty registry seeded from the OS.
    pub fn new(config: RoomConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates an empty registry with a fixed seed. Room codes and every
    /// shuffle in every room become reproducible.
    pub fn with_seed(config: RoomConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: RoomConfig, rng: StdRng) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
            rng,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Spawns a fresh room with a code no live room uses. `host` is the
    /// creating player.
    pub fn create_room(&mut self, host: PlayerId) -> RoomHandle {
        let code = loop {
            let candidate = generate_code(&mut self.rng);
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        let handle = spawn_room(
            code.clone(),
            host,
            self.config.clone(),
            StdRng::from_rng(&mut self.rng),
            DEFAULT_CHANNEL_SIZE,
        );
        self.rooms.insert(code.clone(), handle.clone());
        tracing::info!(room_code = %code, %host, rooms = self.rooms.len(), "room created");
        handle
    }

    /// Looks up a live room.
    pub fn get(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.rooms.get(code).cloned()
    }

    /// Shuts a room down and forgets it.
    pub async fn destroy_room(&mut self, code: &RoomCode) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(code)
            .ok_or_else(|| RoomError::NoSuchRoom(code.clone()))?;
        let _ = handle.shutdown().await;
        tracing::info!(room_code = %code, "room destroyed");
        Ok(())
    }

    /// Removes every room that has outlived the idle TTL with nobody
    /// left to play in it, plus any room whose actor has stopped.
    /// Returns the removed codes.
    pub async fn reap_idle(&mut self) -> Vec<RoomCode> {
        let ttl = self.config.idle_ttl;
        let mut doomed = Vec::new();
        for (code, handle) in &self.rooms {
            match handle.get_info().await {
                Ok(info) if info.is_reapable(ttl) => doomed.push(code.clone()),
                Ok(_) => {}
                Err(_) => doomed.push(code.clone()),
            }
        }

        for code in &doomed {
            if let Some(handle) = self.rooms.remove(code) {
                let _ = handle.shutdown().await;
            }
            tracing::info!(room_code = %code, "idle room reaped");
        }
        doomed
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room_codes(&self) -> Vec<RoomCode> {
        self.rooms.keys().cloned().collect()
    }

    /// Queries every room for its info. Rooms that fail to respond are
    /// skipped.
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let mut infos = Vec::with_capacity(self.rooms.len());
        for handle in self.rooms.values() {
            if let Ok(info) = handle.get_info().await {
                infos.push(info);
            }
        }
        infos
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
