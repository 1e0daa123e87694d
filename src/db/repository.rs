//! SQLite repository for matches and their move ledgers.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_migrations::MigrationHarness;
use tracing::{debug, info, instrument};

use crate::db::models::{GameChanges, GameRow, MoveRow, NewGameRow, NewMoveRow};
use crate::db::{DbError, MIGRATIONS, schema};
use crate::games::gomoku::{Board, Match, MoveRecord};
use crate::store::MatchStore;
use crate::{MatchId, PlayerId};

/// Database repository for match operations.
///
/// Opens a fresh connection per operation. The [`MatchStore`] impl runs each
/// call on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct MatchRepository {
    db_path: String,
}

impl MatchRepository {
    /// Creates a new repository connected to the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path is empty"));
        }
        info!(path = %db_path, "Creating MatchRepository");
        Ok(Self { db_path })
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))?;
        diesel::sql_query("PRAGMA busy_timeout = 5000").execute(&mut conn)?;
        Ok(conn)
    }

    /// Applies pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Migration failed: {}", e)))?;
        info!(applied = applied.len(), "Migrations applied");
        Ok(())
    }

    /// Inserts a new waiting match.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn insert_match(&self, creator: PlayerId) -> Result<Match, DbError> {
        let mut conn = self.connection()?;
        let row = NewGameRow::waiting(creator, &Board::new(), Utc::now().naive_utc())?;

        let created = diesel::insert_into(schema::games::table)
            .values(&row)
            .returning(GameRow::as_returning())
            .get_result(&mut conn)?;

        info!(match_id = created.id(), creator, "Match created");
        created.into_match(Vec::new())
    }

    /// Loads a match and its ledger.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs or the row is inconsistent.
    #[instrument(skip(self))]
    pub fn find_match(&self, id: MatchId) -> Result<Option<Match>, DbError> {
        let mut conn = self.connection()?;
        Self::find_with(&mut conn, id)
    }

    fn find_with(conn: &mut SqliteConnection, id: MatchId) -> Result<Option<Match>, DbError> {
        let Some(row) = schema::games::table
            .find(id)
            .select(GameRow::as_select())
            .first(conn)
            .optional()?
        else {
            debug!(match_id = id, "Match not found");
            return Ok(None);
        };

        let moves = schema::game_moves::table
            .filter(schema::game_moves::game_id.eq(id))
            .order(schema::game_moves::seq.asc())
            .select(MoveRow::as_select())
            .load(conn)?;

        row.into_match(moves).map(Some)
    }

    /// Overwrites a match's state columns.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the match does not exist or a database error occurs.
    #[instrument(skip(self, game), fields(match_id = game.id()))]
    pub fn save_match(&self, game: &Match) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        Self::save_with(&mut conn, game)
    }

    fn save_with(conn: &mut SqliteConnection, game: &Match) -> Result<(), DbError> {
        let changes = GameChanges::from_match(game)?;
        let updated = diesel::update(schema::games::table.find(game.id()))
            .set(&changes)
            .execute(conn)?;
        if updated == 0 {
            return Err(DbError::new(format!("Match {} does not exist", game.id())));
        }
        debug!(match_id = game.id(), status = %game.status(), "Match saved");
        Ok(())
    }

    /// Appends a ledger entry.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on a duplicate sequence number or database error.
    #[instrument(skip(self, record), fields(match_id = record.match_id(), seq = record.seq()))]
    pub fn insert_move(&self, record: &MoveRecord) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        Self::insert_move_with(&mut conn, record)
    }

    fn insert_move_with(conn: &mut SqliteConnection, record: &MoveRecord) -> Result<(), DbError> {
        diesel::insert_into(schema::game_moves::table)
            .values(&NewMoveRow::from_record(record))
            .execute(conn)?;
        Ok(())
    }

    /// Appends a ledger entry and saves the match in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if either write fails; neither is kept.
    #[instrument(skip(self, game, record), fields(match_id = game.id(), seq = record.seq()))]
    pub fn record_move(&self, game: &Match, record: &MoveRecord) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        conn.transaction::<_, DbError, _>(|conn| {
            Self::insert_move_with(conn, record)?;
            Self::save_with(conn, game)
        })?;
        info!(match_id = game.id(), seq = record.seq(), "Move recorded");
        Ok(())
    }

    /// Lists matches ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn list_matches(&self, skip: usize, limit: usize) -> Result<Vec<Match>, DbError> {
        let mut conn = self.connection()?;
        let ids: Vec<i64> = schema::games::table
            .select(schema::games::id)
            .order(schema::games::id.asc())
            .offset(i64::try_from(skip).unwrap_or(i64::MAX))
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .load(&mut conn)?;

        let mut matches = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(game) = Self::find_with(&mut conn, id)? {
                matches.push(game);
            }
        }
        info!(count = matches.len(), "Matches loaded");
        Ok(matches)
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, DbError>
    where
        T: Send + 'static,
        F: FnOnce(MatchRepository) -> Result<T, DbError> + Send + 'static,
    {
        let repository = self.clone();
        tokio::task::spawn_blocking(move || op(repository)).await?
    }
}

#[async_trait]
impl MatchStore for MatchRepository {
    async fn create_match(&self, creator: PlayerId) -> Result<Match, DbError> {
        self.blocking(move |repo| repo.insert_match(creator)).await
    }

    async fn load_match(&self, id: MatchId) -> Result<Option<Match>, DbError> {
        self.blocking(move |repo| repo.find_match(id)).await
    }

    async fn persist_match(&self, game: &Match) -> Result<(), DbError> {
        let game = game.clone();
        self.blocking(move |repo| repo.save_match(&game)).await
    }

    async fn append_move(&self, record: &MoveRecord) -> Result<(), DbError> {
        let record = record.clone();
        self.blocking(move |repo| repo.insert_move(&record)).await
    }

    async fn list_matches(&self, skip: usize, limit: usize) -> Result<Vec<Match>, DbError> {
        self.blocking(move |repo| repo.list_matches(skip, limit)).await
    }

    async fn commit_move(&self, game: &Match, record: &MoveRecord) -> Result<(), DbError> {
        let game = game.clone();
        let record = record.clone();
        self.blocking(move |repo| repo.record_move(&game, &record)).await
    }
}
