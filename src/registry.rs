//! Live socket registry and fan-out.
//!
//! Each match has at most one socket per seated player plus any number of
//! spectator sockets. Entries are created on first connection and dropped
//! once both maps are empty. The map is sharded, so connects, disconnects and
//! broadcasts on different matches do not contend on a single lock.

use crate::protocol::ServerEvent;
use crate::{MatchId, PlayerId};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, instrument, warn};

/// Identifies one socket connection for the lifetime of the process.
pub type ConnectionId = u64;

/// Outbound half of a socket connection.
///
/// Sending never blocks: events queue on the connection's writer task, so a
/// slow client never stalls a broadcast. Dropping every handle for a
/// connection closes its queue, which ends the writer.
#[derive(Debug, Clone)]
pub struct SocketHandle {
    id: ConnectionId,
    tx: UnboundedSender<Arc<ServerEvent>>,
}

impl SocketHandle {
    /// Wraps an existing sender.
    pub fn new(id: ConnectionId, tx: UnboundedSender<Arc<ServerEvent>>) -> Self {
        Self { id, tx }
    }

    /// Creates a handle and the receiver its writer task drains.
    pub fn channel(id: ConnectionId) -> (Self, UnboundedReceiver<Arc<ServerEvent>>) {
        let (tx, rx) = unbounded_channel();
        (Self::new(id, tx), rx)
    }

    /// Connection id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queues an event. Returns `false` if the connection is gone.
    pub fn send(&self, event: Arc<ServerEvent>) -> bool {
        self.tx.send(event).is_ok()
    }
}

#[derive(Debug, Default)]
struct MatchSockets {
    players: HashMap<PlayerId, SocketHandle>,
    spectators: HashMap<ConnectionId, SocketHandle>,
}

impl MatchSockets {
    fn is_empty(&self) -> bool {
        self.players.is_empty() && self.spectators.is_empty()
    }
}

/// Registry of live sockets, keyed by match.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    entries: Arc<DashMap<MatchId, MatchSockets>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating session registry");
        Self::default()
    }

    /// Registers `socket` as `player`'s seat connection.
    ///
    /// Last writer wins: a previous socket for the same seat is returned so
    /// the caller can drop it, which closes that connection.
    #[instrument(skip(self, socket), fields(connection = socket.id()))]
    pub fn connect_player(
        &self,
        match_id: MatchId,
        player: PlayerId,
        socket: SocketHandle,
    ) -> Option<SocketHandle> {
        let superseded = self
            .entries
            .entry(match_id)
            .or_default()
            .players
            .insert(player, socket);
        if let Some(old) = &superseded {
            info!(superseded = old.id(), "Player socket replaced");
        } else {
            debug!("Player socket registered");
        }
        superseded
    }

    /// Adds a spectator socket.
    #[instrument(skip(self, socket), fields(connection = socket.id()))]
    pub fn connect_spectator(&self, match_id: MatchId, socket: SocketHandle) {
        self.entries
            .entry(match_id)
            .or_default()
            .spectators
            .insert(socket.id(), socket);
        debug!("Spectator socket registered");
    }

    /// Removes `player`'s socket, whichever connection it is.
    #[instrument(skip(self))]
    pub fn disconnect_player(&self, match_id: MatchId, player: PlayerId) -> Option<SocketHandle> {
        self.remove_player_if(match_id, player, |_| true)
    }

    /// Removes `player`'s socket only if it is still `connection`.
    ///
    /// A superseded connection closing must not unregister its replacement.
    /// Returns `true` if the socket was removed.
    #[instrument(skip(self))]
    pub fn release_player(&self, match_id: MatchId, player: PlayerId, connection: ConnectionId) -> bool {
        self.remove_player_if(match_id, player, |socket| socket.id() == connection)
            .is_some()
    }

    fn remove_player_if(
        &self,
        match_id: MatchId,
        player: PlayerId,
        predicate: impl Fn(&SocketHandle) -> bool,
    ) -> Option<SocketHandle> {
        let removed = {
            let mut entry = self.entries.get_mut(&match_id)?;
            match entry.players.get(&player) {
                Some(socket) if predicate(socket) => entry.players.remove(&player),
                _ => None,
            }
        };
        self.prune(match_id);
        if removed.is_some() {
            debug!(match_id, player, "Player socket removed");
        }
        removed
    }

    /// Removes a spectator socket. Returns `true` if it was registered.
    #[instrument(skip(self))]
    pub fn disconnect_spectator(&self, match_id: MatchId, connection: ConnectionId) -> bool {
        let removed = self
            .entries
            .get_mut(&match_id)
            .and_then(|mut entry| entry.spectators.remove(&connection))
            .is_some();
        self.prune(match_id);
        removed
    }

    /// Drops the match entry once no sockets remain.
    fn prune(&self, match_id: MatchId) {
        if self
            .entries
            .remove_if(&match_id, |_, sockets| sockets.is_empty())
            .is_some()
        {
            debug!(match_id, "Registry entry dropped");
        }
    }

    /// Delivers `event` to every player and spectator socket of the match.
    ///
    /// Every socket is attempted before returning. Sockets whose connection
    /// is gone are unregistered. Returns the number of successful deliveries.
    #[instrument(skip(self, event))]
    pub fn broadcast(&self, match_id: MatchId, event: ServerEvent) -> usize {
        let event = Arc::new(event);
        let mut delivered = 0;
        let mut dead_players = Vec::new();
        let mut dead_spectators = Vec::new();

        if let Some(entry) = self.entries.get(&match_id) {
            for (player, socket) in &entry.players {
                if socket.send(event.clone()) {
                    delivered += 1;
                } else {
                    dead_players.push((*player, socket.id()));
                }
            }
            for (connection, socket) in &entry.spectators {
                if socket.send(event.clone()) {
                    delivered += 1;
                } else {
                    dead_spectators.push(*connection);
                }
            }
        }

        for (player, connection) in dead_players {
            warn!(match_id, player, connection, "Dropping dead player socket");
            self.release_player(match_id, player, connection);
        }
        for connection in dead_spectators {
            warn!(match_id, connection, "Dropping dead spectator socket");
            self.disconnect_spectator(match_id, connection);
        }

        debug!(delivered, "Broadcast complete");
        delivered
    }

    /// Sends an event to one seated player's socket.
    pub fn send_to_player(&self, match_id: MatchId, player: PlayerId, event: ServerEvent) -> bool {
        self.entries
            .get(&match_id)
            .and_then(|entry| entry.players.get(&player).cloned())
            .is_some_and(|socket| socket.send(Arc::new(event)))
    }

    /// True if `player` has a live socket on the match.
    pub fn is_player_connected(&self, match_id: MatchId, player: PlayerId) -> bool {
        self.entries
            .get(&match_id)
            .is_some_and(|entry| entry.players.contains_key(&player))
    }

    /// True if `connection` is `player`'s current seat socket.
    pub fn is_live_player(&self, match_id: MatchId, player: PlayerId, connection: ConnectionId) -> bool {
        self.entries.get(&match_id).is_some_and(|entry| {
            entry
                .players
                .get(&player)
                .is_some_and(|socket| socket.id() == connection)
        })
    }

    /// Number of live player sockets on the match.
    pub fn player_count(&self, match_id: MatchId) -> usize {
        self.entries
            .get(&match_id)
            .map_or(0, |entry| entry.players.len())
    }

    /// Number of spectator sockets on the match.
    pub fn spectator_count(&self, match_id: MatchId) -> usize {
        self.entries
            .get(&match_id)
            .map_or(0, |entry| entry.spectators.len())
    }

    /// True if the match has a registry entry.
    pub fn contains(&self, match_id: MatchId) -> bool {
        self.entries.contains_key(&match_id)
    }
}
