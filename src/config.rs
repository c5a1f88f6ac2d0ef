// Runtime configuration from environment variables
//
//   PRESTIGE_DB_PATH   SQLite file (":memory:" for a throwaway store)   default prestige.db
//   PRESTIGE_BIND      listen host                                      default 0.0.0.0
//   PORT               listen port                                      default 3000

use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_DB_PATH: &str = "prestige.db";
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid port value: {0}")]
    InvalidPort(String),

    #[error("invalid bind address {addr}: {reason}")]
    InvalidBindAddress { addr: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (tests pass a map instead of the process env)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("PRESTIGE_DB_PATH")
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

        let host = lookup("PRESTIGE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let port = match lookup("PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(value.clone()))?,
            None => DEFAULT_PORT,
        };

        let addr = format!("{}:{}", host, port);
        let bind_addr = addr
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidBindAddress {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;

        Ok(ServerConfig {
            db_path: PathBuf::from(db_path),
            bind_addr,
        })
    }
}

/// Only the database location matters to the CLI
pub fn db_path_from_env() -> PathBuf {
    std::env::var("PRESTIGE_DB_PATH")
        .ok()
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
}
