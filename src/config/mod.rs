//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Directory holding the static client page
    pub client_dir: PathBuf,
    /// Silence after which a connected player is evicted
    pub idle_timeout: Duration,
    /// Interval between liveness pings; a missed pong within one interval
    /// terminates the connection
    pub heartbeat_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port.trim()),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        };

        let idle_timeout_secs = parse_or(&lookup, "IDLE_TIMEOUT_SECS", 60u64)?;
        let heartbeat_ms = parse_or(&lookup, "HEARTBEAT_INTERVAL_MS", 2000u64)?;
        if heartbeat_ms == 0 {
            return Err(ConfigError::Invalid("HEARTBEAT_INTERVAL_MS"));
        }

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            client_dir: lookup("CLIENT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("client")),

            idle_timeout: Duration::from_secs(idle_timeout_secs),
            heartbeat_interval: Duration::from_millis(heartbeat_ms),
        })
    }
}

fn parse_or<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
