//! Server configuration.

use crate::auth::{Identity, TokenDirectory};
use crate::PlayerId;
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument};

/// A player known to the static token directory.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct PlayerEntry {
    /// Player id.
    id: PlayerId,
    /// Display name.
    name: String,
    /// Bearer token.
    token: String,
}

impl PlayerEntry {
    /// Creates a player entry.
    pub fn new(id: PlayerId, name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            token: token.into(),
        }
    }
}

/// Configuration for the match server.
#[derive(Debug, Clone, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    port: u16,

    /// SQLite database path. `None` keeps matches in memory.
    #[serde(default)]
    db_path: Option<String>,

    /// Players accepted by the token directory.
    #[serde(default)]
    players: Vec<PlayerEntry>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: None,
            players: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the file cannot be read, parsed or validated.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the text is not valid configuration.
    #[instrument(skip(content), fields(len = content.len()))]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        info!(
            host = %config.host,
            port = config.port,
            players = config.players.len(),
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Rejects duplicate player ids or tokens.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] naming the first duplicate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut ids = HashSet::new();
        let mut tokens = HashSet::new();
        for player in &self.players {
            if !ids.insert(player.id) {
                return Err(ConfigError::new(format!("Duplicate player id {}", player.id)));
            }
            if !tokens.insert(player.token.as_str()) {
                return Err(ConfigError::new(format!(
                    "Duplicate token for player {}",
                    player.id
                )));
            }
        }
        Ok(())
    }

    /// Token directory holding the configured players.
    #[instrument(skip(self))]
    pub fn directory(&self) -> TokenDirectory {
        TokenDirectory::from_entries(
            self.players
                .iter()
                .map(|p| (p.token.clone(), Identity::new(p.id, p.name.clone()))),
        )
    }

    /// `host:port` bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::PlayerDirectory;

    #[test]
    fn test_defaults_apply_to_empty_file() {
        let config = ServerConfig::from_toml_str("").unwrap();
        assert_eq!(config.host(), "127.0.0.1");
        assert_eq!(*config.port(), 8000);
        assert!(config.db_path().is_none());
        assert!(config.players().is_empty());
    }

    #[test]
    fn test_players_table_builds_directory() {
        let config = ServerConfig::from_toml_str(
            r#"
            port = 9100
            db_path = "matches.db"

            [[players]]
            id = 1
            name = "alice"
            token = "tok-a"

            [[players]]
            id = 2
            name = "bob"
            token = "tok-b"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:9100");
        assert_eq!(config.db_path().as_deref(), Some("matches.db"));

        let directory = config.directory();
        assert_eq!(*directory.resolve("tok-b").unwrap().id(), 2);
        assert_eq!(directory.lookup(1).unwrap().name(), "alice");
    }

    #[test]
    fn test_duplicate_token_rejected() {
        let err = ServerConfig::from_toml_str(
            r#"
            [[players]]
            id = 1
            name = "alice"
            token = "same"

            [[players]]
            id = 2
            name = "bob"
            token = "same"
            "#,
        )
        .unwrap_err();
        assert!(err.message.contains("Duplicate token"));
    }

    #[test]
    fn test_overrides_via_setters() {
        let config = ServerConfig::default()
            .with_port(4000)
            .with_db_path(Some("x.db".to_string()));
        assert_eq!(*config.port(), 4000);
        assert_eq!(config.db_path().as_deref(), Some("x.db"));
    }
}
