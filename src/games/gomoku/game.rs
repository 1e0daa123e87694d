//! Match state machine: WAITING -> PLAYING -> FINISHED.

use super::invariants::{GomokuInvariants, InvariantSet};
use super::{
    Board, MatchStatus, MoveError, MoveLedger, MoveRecord, Outcome, Phase, Position, Seat, rules,
};
use crate::{MatchId, PlayerId};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The match continues; `next_turn` is due to move.
    Moved {
        /// Ledger entry for the move.
        record: MoveRecord,
        /// Player due to move next.
        next_turn: PlayerId,
    },
    /// The move completed five in a row.
    Won {
        /// Ledger entry for the move.
        record: MoveRecord,
        /// The mover.
        winner: PlayerId,
    },
    /// The move filled the board without a winner.
    Drawn {
        /// Ledger entry for the move.
        record: MoveRecord,
    },
}

impl MoveOutcome {
    /// The ledger entry appended by this move.
    pub fn record(&self) -> &MoveRecord {
        match self {
            MoveOutcome::Moved { record, .. }
            | MoveOutcome::Won { record, .. }
            | MoveOutcome::Drawn { record } => record,
        }
    }

    /// True if the move ended the match.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MoveOutcome::Moved { .. })
    }
}

/// A two-seat gomoku match.
///
/// Seat A is the creator and never changes; seat B is set once by
/// [`Match::join`]. The board and ledger change only through
/// [`Match::apply_move`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    id: MatchId,
    host: PlayerId,
    board: Board,
    ledger: MoveLedger,
    created_at: DateTime<Utc>,
    phase: Phase,
}

impl Match {
    /// Creates a waiting match with `creator` in seat A.
    #[instrument]
    pub fn create(id: MatchId, creator: PlayerId) -> Self {
        info!(match_id = id, creator, "Creating match");
        Self {
            id,
            host: creator,
            board: Board::new(),
            ledger: MoveLedger::new(),
            created_at: Utc::now(),
            phase: Phase::Waiting,
        }
    }

    /// Reassembles a match from stored parts. Callers validate the result
    /// with [`GomokuInvariants`].
    pub fn restore(
        id: MatchId,
        host: PlayerId,
        board: Board,
        ledger: MoveLedger,
        created_at: DateTime<Utc>,
        phase: Phase,
    ) -> Self {
        Self {
            id,
            host,
            board,
            ledger,
            created_at,
            phase,
        }
    }

    /// Match identifier.
    pub fn id(&self) -> MatchId {
        self.id
    }

    /// Seat A occupant.
    pub fn host(&self) -> PlayerId {
        self.host
    }

    /// Seat B occupant, once joined.
    pub fn guest(&self) -> Option<PlayerId> {
        match &self.phase {
            Phase::Waiting => None,
            Phase::Playing { guest, .. } | Phase::Finished { guest, .. } => Some(*guest),
        }
    }

    /// Phase-specific state.
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Coarse status.
    pub fn status(&self) -> MatchStatus {
        self.phase.status()
    }

    /// The board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Accepted moves.
    pub fn ledger(&self) -> &MoveLedger {
        &self.ledger
    }

    /// Creation time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Time seat B was filled.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match &self.phase {
            Phase::Waiting => None,
            Phase::Playing { started_at, .. } | Phase::Finished { started_at, .. } => {
                Some(*started_at)
            }
        }
    }

    /// Time the match ended.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        match &self.phase {
            Phase::Finished { finished_at, .. } => Some(*finished_at),
            _ => None,
        }
    }

    /// Seat due to move, while playing.
    pub fn turn_seat(&self) -> Option<Seat> {
        match &self.phase {
            Phase::Playing { turn, .. } => Some(*turn),
            _ => None,
        }
    }

    /// Player due to move, while playing.
    pub fn turn(&self) -> Option<PlayerId> {
        self.turn_seat().and_then(|seat| self.occupant(seat))
    }

    /// Outcome, once finished.
    pub fn outcome(&self) -> Option<Outcome> {
        match &self.phase {
            Phase::Finished { outcome, .. } => Some(*outcome),
            _ => None,
        }
    }

    /// Winning player, if the match finished by a win.
    pub fn winner(&self) -> Option<PlayerId> {
        self.outcome()
            .and_then(|outcome| outcome.winner())
            .and_then(|seat| self.occupant(seat))
    }

    /// Occupant of a seat.
    pub fn occupant(&self, seat: Seat) -> Option<PlayerId> {
        match seat {
            Seat::A => Some(self.host),
            Seat::B => self.guest(),
        }
    }

    /// Seat held by `player`, if any.
    pub fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        if player == self.host {
            Some(Seat::A)
        } else if self.guest() == Some(player) {
            Some(Seat::B)
        } else {
            None
        }
    }

    /// Fills seat B and starts play with seat A to move.
    ///
    /// # Errors
    ///
    /// [`MoveError::NotWaiting`] unless waiting, [`MoveError::AlreadySeated`]
    /// if `player` created the match, [`MoveError::SeatTaken`] if seat B is set.
    #[instrument(skip(self), fields(match_id = self.id))]
    pub fn join(&mut self, player: PlayerId) -> Result<(), MoveError> {
        if self.status() != MatchStatus::Waiting {
            debug!(status = %self.status(), "Join rejected: not waiting");
            return Err(MoveError::NotWaiting);
        }
        if player == self.host {
            return Err(MoveError::AlreadySeated(player));
        }
        if self.guest().is_some() {
            return Err(MoveError::SeatTaken);
        }

        self.phase = Phase::Playing {
            guest: player,
            turn: Seat::A,
            started_at: Utc::now(),
        };
        info!(guest = player, "Match started");
        Ok(())
    }

    /// Places `player`'s stone at `(x, y)`.
    ///
    /// Validates everything before mutating, so a rejected move leaves the
    /// match untouched and repeating it yields the same rejection.
    ///
    /// # Errors
    ///
    /// [`MoveError::NotPlaying`], [`MoveError::NotYourTurn`],
    /// [`MoveError::OutOfBounds`] or [`MoveError::CellOccupied`].
    #[instrument(skip(self), fields(match_id = self.id))]
    pub fn apply_move(&mut self, player: PlayerId, x: i64, y: i64) -> Result<MoveOutcome, MoveError> {
        let Phase::Playing {
            guest,
            turn,
            started_at,
        } = self.phase
        else {
            return Err(MoveError::NotPlaying);
        };

        if self.occupant(turn) != Some(player) {
            return Err(MoveError::NotYourTurn(player));
        }
        let pos = Position::new(x, y)?;
        self.board.place(pos, turn)?;

        let now = Utc::now();
        let record = self.ledger.append(self.id, player, pos, now).clone();

        let outcome = if rules::check_win(&self.board, pos, turn) {
            self.phase = Phase::Finished {
                guest,
                started_at,
                finished_at: now,
                outcome: Outcome::Win(turn),
            };
            info!(winner = player, seq = record.seq(), "Match won");
            MoveOutcome::Won {
                record,
                winner: player,
            }
        } else if rules::is_full(&self.board) {
            self.phase = Phase::Finished {
                guest,
                started_at,
                finished_at: now,
                outcome: Outcome::Draw,
            };
            info!(seq = record.seq(), "Board full, match drawn");
            MoveOutcome::Drawn { record }
        } else {
            let next = turn.opponent();
            self.phase = Phase::Playing {
                guest,
                turn: next,
                started_at,
            };
            let next_turn = self.occupant(next).unwrap_or(self.host);
            debug!(position = %pos, next_turn, "Move accepted");
            MoveOutcome::Moved { record, next_turn }
        };

        debug_assert!(GomokuInvariants::check_all(self).is_ok());
        Ok(outcome)
    }
}
