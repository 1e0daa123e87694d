//! Match session coordinator.
//!
//! Bridges socket and HTTP actions to [`Match`] state, the [`MatchStore`]
//! and the [`SessionRegistry`]. Every transition on a match runs inside that
//! match's own async mutex, so joins and moves on one match are linearized
//! while other matches proceed independently. Events for a transition are
//! queued before the mutex is released, which keeps broadcast order equal
//! to ledger order.

use crate::games::gomoku::{Match, MatchStatus, MoveError, MoveOutcome};
use crate::protocol::{ClientMessage, ServerEvent};
use crate::registry::{ConnectionId, SessionRegistry, SocketHandle};
use crate::store::MatchStore;
use crate::{DbError, Identity, MatchId, PlayerDirectory, PlayerId};
use dashmap::DashMap;
use derive_getters::Getters;
use derive_more::{Display, Error};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Failure of a coordinated action.
#[derive(Debug, Clone, Display, Error)]
pub enum CoordinatorError {
    /// No match with this id.
    #[display("Match {} not found", id)]
    NotFound {
        /// Requested match id.
        id: MatchId,
    },

    /// The match rejected the action. State is unchanged.
    #[display("{}", _0)]
    Rejected(MoveError),

    /// The store failed. State is unchanged.
    #[display("{}", _0)]
    Store(DbError),
}

impl From<MoveError> for CoordinatorError {
    fn from(err: MoveError) -> Self {
        CoordinatorError::Rejected(err)
    }
}

impl From<DbError> for CoordinatorError {
    fn from(err: DbError) -> Self {
        CoordinatorError::Store(err)
    }
}

/// How a socket participates in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Holds seat A or seat B.
    Player,
    /// Watches without a seat.
    Spectator,
}

/// One registered socket connection.
#[derive(Debug, Clone, Getters)]
pub struct Connection {
    match_id: MatchId,
    identity: Identity,
    role: Role,
    connection_id: ConnectionId,
}

/// A move accepted by the coordinator.
#[derive(Debug, Clone, Getters)]
pub struct CommittedMove {
    /// What the move did.
    outcome: MoveOutcome,
    /// Match state right after the move was committed.
    game: Match,
}

type Slot = Arc<Mutex<Match>>;

/// Serializes actions per match and fans out the resulting events.
pub struct MatchCoordinator {
    store: Arc<dyn MatchStore>,
    directory: Arc<dyn PlayerDirectory>,
    registry: SessionRegistry,
    live: DashMap<MatchId, Slot>,
    next_connection: AtomicU64,
}

impl std::fmt::Debug for MatchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchCoordinator")
            .field("registry", &self.registry)
            .field("live_matches", &self.live.len())
            .finish()
    }
}

impl MatchCoordinator {
    /// Creates a coordinator over the given collaborators.
    #[instrument(skip_all)]
    pub fn new(
        store: Arc<dyn MatchStore>,
        directory: Arc<dyn PlayerDirectory>,
        registry: SessionRegistry,
    ) -> Self {
        info!("Creating match coordinator");
        Self {
            store,
            directory,
            registry,
            live: DashMap::new(),
            next_connection: AtomicU64::new(1),
        }
    }

    /// The socket registry.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// The identity resolver.
    pub fn directory(&self) -> &Arc<dyn PlayerDirectory> {
        &self.directory
    }

    /// Allocates a process-unique connection id.
    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_connection.fetch_add(1, Ordering::Relaxed)
    }

    /// Cached match, loading it from the store on first use.
    async fn slot(&self, id: MatchId) -> Result<Slot, CoordinatorError> {
        if let Some(slot) = self.live.get(&id) {
            return Ok(slot.clone());
        }
        let loaded = self
            .store
            .load_match(id)
            .await?
            .ok_or(CoordinatorError::NotFound { id })?;
        debug!(match_id = id, "Match loaded into cache");
        Ok(self
            .live
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(loaded)))
            .clone())
    }

    /// Creates a waiting match with `creator` in seat A.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::Store`] if the store fails.
    #[instrument(skip(self))]
    pub async fn create_match(&self, creator: PlayerId) -> Result<Match, CoordinatorError> {
        let game = self.store.create_match(creator).await?;
        self.live
            .insert(game.id(), Arc::new(Mutex::new(game.clone())));
        info!(match_id = game.id(), creator, "Match opened");
        Ok(game)
    }

    /// Seats `player` in seat B and starts the match.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::NotFound`], a seat-conflict
    /// [`CoordinatorError::Rejected`], or [`CoordinatorError::Store`].
    #[instrument(skip(self))]
    pub async fn join_match(&self, id: MatchId, player: PlayerId) -> Result<Match, CoordinatorError> {
        let result = self.join_locked(id, player).await;
        self.evict_if_idle(id).await;
        result
    }

    async fn join_locked(&self, id: MatchId, player: PlayerId) -> Result<Match, CoordinatorError> {
        let slot = self.slot(id).await?;
        let mut current = slot.lock().await;

        let mut next = current.clone();
        next.join(player)?;
        self.store.persist_match(&next).await?;
        *current = next.clone();

        info!(match_id = id, guest = player, "Player joined match");
        Ok(next)
    }

    /// Current state of a match.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::NotFound`] or [`CoordinatorError::Store`].
    #[instrument(skip(self))]
    pub async fn snapshot(&self, id: MatchId) -> Result<Match, CoordinatorError> {
        if let Some(slot) = self.live.get(&id).map(|slot| slot.clone()) {
            let game = slot.lock().await.clone();
            return Ok(game);
        }
        let loaded = self
            .store
            .load_match(id)
            .await?
            .ok_or(CoordinatorError::NotFound { id })?;
        if loaded.status() == MatchStatus::Finished {
            return Ok(loaded);
        }
        let slot = self
            .live
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(loaded)))
            .clone();
        let game = slot.lock().await.clone();
        Ok(game)
    }

    /// Lists stored matches ordered by id.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::Store`] if the store fails.
    #[instrument(skip(self))]
    pub async fn list_matches(&self, skip: usize, limit: usize) -> Result<Vec<Match>, CoordinatorError> {
        Ok(self.store.list_matches(skip, limit).await?)
    }

    /// Registers a socket on a match.
    ///
    /// Seated identities register as players and announce themselves with
    /// `player_join`; anyone else registers as a spectator. While the match
    /// is in play a `game_start` snapshot goes to everyone once both seats
    /// are live, otherwise only to the connecting player.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::NotFound`] or [`CoordinatorError::Store`].
    #[instrument(skip(self, identity, socket), fields(player_id = *identity.id(), connection = socket.id()))]
    pub async fn connect(
        &self,
        match_id: MatchId,
        identity: Identity,
        socket: SocketHandle,
    ) -> Result<Connection, CoordinatorError> {
        let slot = self.slot(match_id).await?;
        let game = slot.lock().await;
        let connection_id = socket.id();
        let player = *identity.id();

        if game.seat_of(player).is_none() {
            self.registry.connect_spectator(match_id, socket);
            info!(match_id, player, "Spectator connected");
            return Ok(Connection {
                match_id,
                identity,
                role: Role::Spectator,
                connection_id,
            });
        }

        if let Some(superseded) = self.registry.connect_player(match_id, player, socket) {
            drop(superseded);
        }
        info!(match_id, player, "Player connected");
        self.registry
            .broadcast(match_id, ServerEvent::player_join(&identity));

        if let (MatchStatus::Playing, Some(guest), Some(turn)) =
            (game.status(), game.guest(), game.turn())
        {
            let host = self.directory.identity_or_unknown(game.host());
            let guest_identity = self.directory.identity_or_unknown(guest);
            let start = ServerEvent::game_start(&game, &host, &guest_identity, turn);

            let both_live = self.registry.is_player_connected(match_id, game.host())
                && self.registry.is_player_connected(match_id, guest);
            if both_live {
                self.registry.broadcast(match_id, start);
            } else {
                self.registry.send_to_player(match_id, player, start);
            }
        }

        Ok(Connection {
            match_id,
            identity,
            role: Role::Player,
            connection_id,
        })
    }

    /// Applies one inbound socket message.
    ///
    /// Moves from spectators or superseded sockets are rejected. A store
    /// failure is reported to the acting socket with a `storage_unavailable`
    /// error event; other rejections produce no event.
    ///
    /// # Errors
    ///
    /// The rejection or fault, for the caller to log.
    #[instrument(skip(self, connection, message), fields(match_id = connection.match_id, connection = connection.connection_id))]
    pub async fn handle_message(
        &self,
        connection: &Connection,
        message: ClientMessage,
    ) -> Result<(), CoordinatorError> {
        match message {
            ClientMessage::Chat { message } => {
                self.registry.broadcast(
                    connection.match_id,
                    ServerEvent::chat(&connection.identity, message),
                );
                Ok(())
            }
            ClientMessage::Move { position: [x, y] } => {
                let player = *connection.identity.id();
                let live = connection.role == Role::Player
                    && self.registry.is_live_player(
                        connection.match_id,
                        player,
                        connection.connection_id,
                    );
                if !live {
                    return Err(MoveError::NotSeated(player).into());
                }

                match self.submit_move(connection.match_id, player, x, y).await {
                    Err(CoordinatorError::Store(err)) => {
                        warn!(error = %err, "Move not stored");
                        self.registry.send_to_player(
                            connection.match_id,
                            player,
                            ServerEvent::error("storage_unavailable", "Move could not be saved"),
                        );
                        Err(CoordinatorError::Store(err))
                    }
                    other => other.map(|_| ()),
                }
            }
        }
    }

    /// Validates and applies a move, then broadcasts `game_move` or `game_end`.
    ///
    /// The move is committed to the store before the cached match changes.
    /// The returned state is the one committed under the match lock.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::NotFound`], [`CoordinatorError::Rejected`] or
    /// [`CoordinatorError::Store`]; on any error nothing is broadcast.
    #[instrument(skip(self))]
    pub async fn submit_move(
        &self,
        match_id: MatchId,
        player: PlayerId,
        x: i64,
        y: i64,
    ) -> Result<CommittedMove, CoordinatorError> {
        let result = self.apply_locked(match_id, player, x, y).await;
        self.evict_if_idle(match_id).await;
        result
    }

    async fn apply_locked(
        &self,
        match_id: MatchId,
        player: PlayerId,
        x: i64,
        y: i64,
    ) -> Result<CommittedMove, CoordinatorError> {
        let slot = self.slot(match_id).await?;
        let mut current = slot.lock().await;

        let mut next = current.clone();
        let outcome = match next.apply_move(player, x, y) {
            Err(MoveError::NotYourTurn(p)) if next.seat_of(p).is_none() => {
                return Err(MoveError::NotSeated(p).into());
            }
            other => other?,
        };
        self.store.commit_move(&next, outcome.record()).await?;
        *current = next;

        let committed = CommittedMove {
            outcome,
            game: current.clone(),
        };
        let record = committed.outcome.record();
        let event = match &committed.outcome {
            MoveOutcome::Moved { next_turn, .. } => Some(ServerEvent::game_move(
                player,
                [*record.x(), *record.y()],
                *next_turn,
                current.board(),
            )),
            MoveOutcome::Won { winner, .. } => current
                .outcome()
                .map(|result| ServerEvent::game_end(Some(*winner), result, current.board())),
            MoveOutcome::Drawn { .. } => current
                .outcome()
                .map(|result| ServerEvent::game_end(None, result, current.board())),
        };
        if let Some(event) = event {
            let delivered = self.registry.broadcast(match_id, event);
            debug!(seq = record.seq(), delivered, "Move broadcast");
        }
        Ok(committed)
    }

    /// Unregisters a socket.
    ///
    /// A seated player's departure is announced with `player_leave` unless a
    /// newer socket already replaced this one. The match itself is untouched.
    #[instrument(skip(self, connection), fields(match_id = connection.match_id, connection = connection.connection_id, role = %connection.role))]
    pub async fn disconnect(&self, connection: &Connection) {
        let match_id = connection.match_id;
        match connection.role {
            Role::Player => {
                let player = *connection.identity.id();
                if self
                    .registry
                    .release_player(match_id, player, connection.connection_id)
                {
                    info!(match_id, player, "Player disconnected");
                    self.registry
                        .broadcast(match_id, ServerEvent::player_leave(&connection.identity));
                } else {
                    debug!(match_id, player, "Superseded socket closed");
                }
            }
            Role::Spectator => {
                self.registry
                    .disconnect_spectator(match_id, connection.connection_id);
                debug!(match_id, "Spectator disconnected");
            }
        }
        self.evict_if_idle(match_id).await;
    }

    /// Drops a finished match from the cache once no sockets remain.
    ///
    /// Runs after every disconnect, move and join, so a match finished
    /// without sockets attached does not linger.
    async fn evict_if_idle(&self, match_id: MatchId) {
        if self.registry.contains(match_id) {
            return;
        }
        let Some(slot) = self.live.get(&match_id).map(|slot| slot.clone()) else {
            return;
        };
        if slot.lock().await.status() == MatchStatus::Finished {
            self.live.remove(&match_id);
            debug!(match_id, "Finished match evicted from cache");
        }
    }

    /// Number of matches held in memory.
    pub fn cached_matches(&self) -> usize {
        self.live.len()
    }
}
