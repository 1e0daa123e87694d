//! Database rows and their conversion to and from domain types.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use diesel::prelude::*;
use tracing::instrument;

use crate::db::{DbError, schema};
use crate::games::gomoku::{
    Board, GomokuInvariants, InvariantSet, Match, MatchStatus, MoveLedger, MoveRecord, Outcome,
    Phase, Seat,
};

/// Stored match row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::games)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GameRow {
    id: i64,
    status: String,
    player1_id: i64,
    player2_id: Option<i64>,
    current_turn_id: Option<i64>,
    winner_id: Option<i64>,
    board: String,
    created_at: NaiveDateTime,
    started_at: Option<NaiveDateTime>,
    finished_at: Option<NaiveDateTime>,
}

/// Insertable row for a freshly created match.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::games)]
pub struct NewGameRow {
    status: String,
    player1_id: i64,
    board: String,
    created_at: NaiveDateTime,
}

/// Full-state update for an existing match. `None` writes `NULL`.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::games)]
#[diesel(treat_none_as_null = true)]
pub struct GameChanges {
    status: String,
    player2_id: Option<i64>,
    current_turn_id: Option<i64>,
    winner_id: Option<i64>,
    board: String,
    started_at: Option<NaiveDateTime>,
    finished_at: Option<NaiveDateTime>,
}

/// Stored ledger entry.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::game_moves)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MoveRow {
    id: i64,
    game_id: i64,
    player_id: i64,
    x: i32,
    y: i32,
    seq: i32,
    created_at: NaiveDateTime,
}

/// Insertable ledger entry.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::game_moves)]
pub struct NewMoveRow {
    game_id: i64,
    player_id: i64,
    x: i32,
    y: i32,
    seq: i32,
    created_at: NaiveDateTime,
}

fn encode_board(board: &Board) -> Result<String, DbError> {
    Ok(serde_json::to_string(&board.to_codes())?)
}

impl NewGameRow {
    /// Row for a match that has just been created.
    #[instrument(skip(creator_board))]
    pub fn waiting(player1_id: i64, creator_board: &Board, created_at: NaiveDateTime) -> Result<Self, DbError> {
        Ok(Self {
            status: MatchStatus::Waiting.to_string(),
            player1_id,
            board: encode_board(creator_board)?,
            created_at,
        })
    }
}

impl GameChanges {
    /// Column values describing `game`'s current state.
    #[instrument(skip(game), fields(match_id = game.id()))]
    pub fn from_match(game: &Match) -> Result<Self, DbError> {
        Ok(Self {
            status: game.status().to_string(),
            player2_id: game.guest(),
            current_turn_id: game.turn(),
            winner_id: game.winner(),
            board: encode_board(game.board())?,
            started_at: game.started_at().map(|t| t.naive_utc()),
            finished_at: game.finished_at().map(|t| t.naive_utc()),
        })
    }
}

impl NewMoveRow {
    /// Row for a ledger entry.
    pub fn from_record(record: &MoveRecord) -> Self {
        Self {
            game_id: *record.match_id(),
            player_id: *record.player_id(),
            x: *record.x() as i32,
            y: *record.y() as i32,
            seq: *record.seq() as i32,
            created_at: record.played_at().naive_utc(),
        }
    }
}

impl MoveRow {
    fn into_record(self) -> Result<MoveRecord, DbError> {
        let (Ok(x), Ok(y), Ok(seq)) = (
            usize::try_from(self.x),
            usize::try_from(self.y),
            u32::try_from(self.seq),
        ) else {
            return Err(DbError::corrupt(self.game_id, format!("bad move row {}", self.id)));
        };
        Ok(MoveRecord::new(
            self.game_id,
            self.player_id,
            x,
            y,
            seq,
            self.created_at.and_utc(),
        ))
    }
}

impl GameRow {
    /// Rebuilds the match, rejecting column combinations no phase allows.
    #[instrument(skip(self, moves), fields(match_id = self.id, moves = moves.len()))]
    pub fn into_match(self, moves: Vec<MoveRow>) -> Result<Match, DbError> {
        let id = self.id;
        let status: MatchStatus = self
            .status
            .parse()
            .map_err(|_| DbError::corrupt(id, format!("unknown status '{}'", self.status)))?;

        let codes: Vec<Vec<u8>> = serde_json::from_str(&self.board)?;
        let board =
            Board::from_codes(&codes).ok_or_else(|| DbError::corrupt(id, "board is not 15x15"))?;

        let host = self.player1_id;
        let seat_of = |player: i64| -> Result<Seat, DbError> {
            if player == host {
                Ok(Seat::A)
            } else if Some(player) == self.player2_id {
                Ok(Seat::B)
            } else {
                Err(DbError::corrupt(id, format!("player {} is not seated", player)))
            }
        };

        let phase = match (
            status,
            self.player2_id,
            self.current_turn_id,
            self.winner_id,
            self.started_at,
            self.finished_at,
        ) {
            (MatchStatus::Waiting, None, None, None, None, None) => Phase::Waiting,
            (MatchStatus::Playing, Some(guest), Some(turn), None, Some(started), None) => {
                Phase::Playing {
                    guest,
                    turn: seat_of(turn)?,
                    started_at: started.and_utc(),
                }
            }
            (MatchStatus::Finished, Some(guest), None, winner, Some(started), Some(finished)) => {
                let outcome = match winner {
                    Some(winner) => Outcome::Win(seat_of(winner)?),
                    None => Outcome::Draw,
                };
                Phase::Finished {
                    guest,
                    started_at: started.and_utc(),
                    finished_at: finished.and_utc(),
                    outcome,
                }
            }
            _ => {
                return Err(DbError::corrupt(
                    id,
                    format!("columns do not fit status '{}'", status),
                ));
            }
        };

        let records = moves
            .into_iter()
            .map(MoveRow::into_record)
            .collect::<Result<Vec<_>, _>>()?;

        let game = Match::restore(
            id,
            host,
            board,
            MoveLedger::from_records(records),
            self.created_at.and_utc(),
            phase,
        );

        GomokuInvariants::check_all(&game).map_err(|violations| {
            let detail = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            DbError::corrupt(id, detail)
        })?;

        Ok(game)
    }
}
