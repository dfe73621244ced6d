//! Process configuration, read from environment variables.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use parlor_room::RoomConfig;

/// Everything the `parlor-server` binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub room: RoomConfig,
    /// How often the idle-room reaper runs. Zero disables it.
    pub reap_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            room: RoomConfig::default(),
            reap_interval: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    /// Loads config from environment variables.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `PARLOR_HOST` | `0.0.0.0` |
    /// | `PORT` | `4000` |
    /// | `PARLOR_MAX_PLAYERS` | `16` |
    /// | `PARLOR_ROOM_IDLE_TTL_SECS` | `1800` |
    /// | `PARLOR_REAP_INTERVAL_SECS` | `60` |
    ///
    /// Values that don't parse fall back to the default with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let host = lookup("PARLOR_HOST")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or(defaults.host);
        let port = parse_or(&lookup, "PORT", defaults.port);

        let mut max_players = parse_or(
            &lookup,
            "PARLOR_MAX_PLAYERS",
            defaults.room.max_players,
        );
        if max_players < defaults.room.min_players {
            tracing::warn!(
                max_players,
                min_players = defaults.room.min_players,
                "PARLOR_MAX_PLAYERS is below the minimum needed to start, using default"
            );
            max_players = defaults.room.max_players;
        }

        let idle_ttl = parse_or(
            &lookup,
            "PARLOR_ROOM_IDLE_TTL_SECS",
            defaults.room.idle_ttl.as_secs(),
        );
        let reap_interval = parse_or(
            &lookup,
            "PARLOR_REAP_INTERVAL_SECS",
            defaults.reap_interval.as_secs(),
        );

        Self {
            host,
            port,
            room: RoomConfig {
                max_players,
                idle_ttl: Duration::from_secs(idle_ttl),
                ..defaults.room
            },
            reap_interval: Duration::from_secs(reap_interval),
        }
    }

    /// `host:port`, ready for [`ParlorServerBuilder::bind`](crate::ParlorServerBuilder::bind).
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = %raw, %default, "invalid config value, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = config(&[]);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.room.min_players, 3);
        assert_eq!(cfg.room.max_players, 16);
        assert_eq!(cfg.room.idle_ttl, Duration::from_secs(1800));
        assert_eq!(cfg.reap_interval, Duration::from_secs(60));
        assert_eq!(cfg.bind_addr(), "0.0.0.0:4000");
    }

    #[test]
    fn test_values_are_read() {
        let cfg = config(&[
            ("PARLOR_HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("PARLOR_MAX_PLAYERS", "8"),
            ("PARLOR_ROOM_IDLE_TTL_SECS", "120"),
            ("PARLOR_REAP_INTERVAL_SECS", "5"),
        ]);
        assert_eq!(cfg.bind_addr(), "127.0.0.1:9000");
        assert_eq!(cfg.room.max_players, 8);
        assert_eq!(cfg.room.idle_ttl, Duration::from_secs(120));
        assert_eq!(cfg.reap_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_garbage_falls_back_to_default() {
        let cfg = config(&[("PORT", "eighty"), ("PARLOR_ROOM_IDLE_TTL_SECS", "-1")]);
        assert_eq!(cfg.port, 4000);
        assert_eq!(cfg.room.idle_ttl, Duration::from_secs(1800));
    }

    #[test]
    fn test_max_players_below_minimum_is_rejected() {
        let cfg = config(&[("PARLOR_MAX_PLAYERS", "2")]);
        assert_eq!(cfg.room.max_players, 16);
    }

    #[test]
    fn test_blank_host_uses_default() {
        let cfg = config(&[("PARLOR_HOST", "  ")]);
        assert_eq!(cfg.host, "0.0.0.0");
    }
}
