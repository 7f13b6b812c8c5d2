//! Configuration settings structures
//!
//! Defines all the configuration structures used by the server: network
//! settings, room reclamation policy, and logging options.

use serde::{Deserialize, Serialize};

/// Main configuration structure
///
/// Root configuration object containing all server settings; serialized
/// to/from TOML for configuration files.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// Server-specific settings
    pub server: ServerSettings,
    /// Room lifecycle policy
    pub rooms: RoomSettings,
    /// Optional logging configuration
    pub logging: Option<LoggingSettings>,
}

/// Server configuration settings
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerSettings {
    /// Network address to bind the server to
    ///
    /// Format: "IP:PORT" (e.g., "127.0.0.1:8080" for localhost,
    /// "0.0.0.0:8080" for all interfaces)
    pub listen_addr: String,

    /// Maximum number of concurrent connections
    ///
    /// New connections beyond this limit are refused during the
    /// handshake to keep resource usage bounded.
    pub max_connections: usize,
}

/// Room reclamation policy
///
/// Stale rooms (created long ago and never cleaned up) are forcibly
/// closed by a periodic sweep. The sweep is policy, not core behavior:
/// setting the interval to zero disables it entirely.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RoomSettings {
    /// Seconds between reclamation sweeps; 0 disables the sweep.
    pub reclaim_interval_secs: u64,

    /// Age in seconds after which a room is considered stale.
    pub max_age_secs: u64,
}

/// Logging system configuration
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoggingSettings {
    /// Logging level filter
    ///
    /// Valid values: "trace", "debug", "info", "warn", "error"
    pub level: String,

    /// Enable JSON-formatted log output
    ///
    /// When true, logs are output in structured JSON format,
    /// useful for log aggregation systems.
    pub json_format: bool,
}

impl Default for Config {
    /// Default configuration suitable for local development.
    fn default() -> Self {
        Self {
            server: ServerSettings {
                listen_addr: "127.0.0.1:8080".to_string(),
                max_connections: 1000,
            },
            rooms: RoomSettings {
                reclaim_interval_secs: 60,
                max_age_secs: 1800,
            },
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.server.max_connections, 1000);
        assert_eq!(config.rooms.reclaim_interval_secs, 60);
        assert!(config.logging.is_some());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.server.listen_addr, deserialized.server.listen_addr);
        assert_eq!(
            config.server.max_connections,
            deserialized.server.max_connections
        );
        assert_eq!(config.rooms.max_age_secs, deserialized.rooms.max_age_secs);
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
[server]
listen_addr = "0.0.0.0:9090"
max_connections = 500

[rooms]
reclaim_interval_secs = 30
max_age_secs = 600

[logging]
level = "debug"
json_format = true
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:9090");
        assert_eq!(config.server.max_connections, 500);
        assert_eq!(config.rooms.reclaim_interval_secs, 30);
        assert!(config.logging.unwrap().json_format);
    }
}
