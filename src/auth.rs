//! Authenticated player identities.
//!
//! Credential issuance lives outside this crate. The server only needs to
//! turn a bearer token into a player id and look up display names.

use crate::PlayerId;
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// An authenticated player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters, new)]
pub struct Identity {
    id: PlayerId,
    name: String,
}

impl Identity {
    /// Placeholder identity for a player the directory does not know.
    pub fn unknown(id: PlayerId) -> Self {
        Self::new(id, format!("player-{}", id))
    }
}

/// Token resolution failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum AuthError {
    /// Missing, unknown or expired token.
    #[display("Could not validate credentials")]
    Unauthenticated,
}

/// Resolves tokens and player ids to identities.
pub trait PlayerDirectory: Send + Sync {
    /// Resolves a bearer token.
    ///
    /// # Errors
    ///
    /// [`AuthError::Unauthenticated`] if the token is not recognized.
    fn resolve(&self, token: &str) -> Result<Identity, AuthError>;

    /// Looks up a player's identity by id.
    fn lookup(&self, id: PlayerId) -> Option<Identity>;

    /// Identity for `id`, falling back to a generated name.
    fn identity_or_unknown(&self, id: PlayerId) -> Identity {
        self.lookup(id).unwrap_or_else(|| Identity::unknown(id))
    }
}

/// Static token table, loaded from the server config.
#[derive(Debug, Clone, Default)]
pub struct TokenDirectory {
    by_token: HashMap<String, Identity>,
    by_id: HashMap<PlayerId, Identity>,
}

impl TokenDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token for a player, replacing any previous mapping of that token.
    #[instrument(skip(self, token, identity), fields(player_id = *identity.id()))]
    pub fn insert(&mut self, token: impl Into<String>, identity: Identity) {
        debug!(name = %identity.name(), "Registering player token");
        self.by_id.insert(*identity.id(), identity.clone());
        self.by_token.insert(token.into(), identity);
    }

    /// Builds a directory from `(token, identity)` pairs.
    #[instrument(skip(entries))]
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Identity)>) -> Self {
        let mut directory = Self::new();
        for (token, identity) in entries {
            directory.insert(token, identity);
        }
        info!(players = directory.len(), "Token directory loaded");
        directory
    }

    /// Number of known players.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True if no players are registered.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl PlayerDirectory for TokenDirectory {
    fn resolve(&self, token: &str) -> Result<Identity, AuthError> {
        self.by_token.get(token).cloned().ok_or_else(|| {
            debug!("Unknown token");
            AuthError::Unauthenticated
        })
    }

    fn lookup(&self, id: PlayerId) -> Option<Identity> {
        self.by_id.get(&id).cloned()
    }
}
