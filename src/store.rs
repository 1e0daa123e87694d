//! Match persistence interface.

use crate::games::gomoku::{Match, MoveRecord};
use crate::{DbError, MatchId, PlayerId};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

/// Where matches and their move ledgers live between process restarts.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Allocates a new waiting match with `creator` in seat A.
    async fn create_match(&self, creator: PlayerId) -> Result<Match, DbError>;

    /// Loads a match with its ledger. `None` if no such match exists.
    async fn load_match(&self, id: MatchId) -> Result<Option<Match>, DbError>;

    /// Writes the match's current state.
    async fn persist_match(&self, game: &Match) -> Result<(), DbError>;

    /// Appends one ledger entry.
    async fn append_move(&self, record: &MoveRecord) -> Result<(), DbError>;

    /// Lists matches ordered by id.
    async fn list_matches(&self, skip: usize, limit: usize) -> Result<Vec<Match>, DbError>;

    /// Records an accepted move together with the resulting match state.
    ///
    /// Stores that support transactions should make this atomic.
    async fn commit_move(&self, game: &Match, record: &MoveRecord) -> Result<(), DbError> {
        self.append_move(record).await?;
        self.persist_match(game).await
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    last_id: MatchId,
    matches: BTreeMap<MatchId, Match>,
    moves: BTreeMap<MatchId, Vec<MoveRecord>>,
}

/// In-process store. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory match store");
        Self::default()
    }

    fn state(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, DbError> {
        self.state
            .lock()
            .map_err(|_| DbError::new("Memory store lock poisoned"))
    }

    /// Appended ledger entries for a match, in append order.
    pub fn moves(&self, id: MatchId) -> Result<Vec<MoveRecord>, DbError> {
        Ok(self.state()?.moves.get(&id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    #[instrument(skip(self))]
    async fn create_match(&self, creator: PlayerId) -> Result<Match, DbError> {
        let mut state = self.state()?;
        state.last_id += 1;
        let game = Match::create(state.last_id, creator);
        state.matches.insert(game.id(), game.clone());
        Ok(game)
    }

    #[instrument(skip(self))]
    async fn load_match(&self, id: MatchId) -> Result<Option<Match>, DbError> {
        let game = self.state()?.matches.get(&id).cloned();
        if game.is_none() {
            debug!(match_id = id, "Match not found");
        }
        Ok(game)
    }

    #[instrument(skip(self, game), fields(match_id = game.id()))]
    async fn persist_match(&self, game: &Match) -> Result<(), DbError> {
        let mut state = self.state()?;
        if !state.matches.contains_key(&game.id()) {
            return Err(DbError::new(format!("Match {} does not exist", game.id())));
        }
        state.matches.insert(game.id(), game.clone());
        Ok(())
    }

    #[instrument(skip(self, record), fields(match_id = record.match_id(), seq = record.seq()))]
    async fn append_move(&self, record: &MoveRecord) -> Result<(), DbError> {
        let mut state = self.state()?;
        let log = state.moves.entry(*record.match_id()).or_default();
        if *record.seq() as usize != log.len() + 1 {
            return Err(DbError::new(format!(
                "Out-of-order move seq {} (ledger has {})",
                record.seq(),
                log.len()
            )));
        }
        log.push(record.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_matches(&self, skip: usize, limit: usize) -> Result<Vec<Match>, DbError> {
        Ok(self
            .state()?
            .matches
            .values()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }
}
