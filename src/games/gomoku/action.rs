//! Move validation errors for gomoku matches.

use super::Position;
use crate::PlayerId;

/// Why a join or move was rejected.
///
/// Rejections never mutate the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// Coordinates fall outside the board.
    #[display("Position ({x}, {y}) is off the board")]
    OutOfBounds {
        /// Requested column.
        x: i64,
        /// Requested row.
        y: i64,
    },

    /// The cell already holds a stone.
    #[display("Cell {} is already occupied", _0)]
    CellOccupied(Position),

    /// `join` on a match that is no longer waiting.
    #[display("Match is not waiting for players")]
    NotWaiting,

    /// The creator tried to join their own match.
    #[display("Player {} is already seated", _0)]
    AlreadySeated(PlayerId),

    /// Seat B is already occupied.
    #[display("Match is full")]
    SeatTaken,

    /// The match is not in play.
    #[display("Match is not in play")]
    NotPlaying,

    /// The player is not the one due to move.
    #[display("It's not player {}'s turn", _0)]
    NotYourTurn(PlayerId),

    /// The player holds neither seat.
    #[display("Player {} is not seated in this match", _0)]
    NotSeated(PlayerId),
}

impl MoveError {
    /// True for the seat-conflict family surfaced on the join path.
    pub fn is_seat_conflict(&self) -> bool {
        matches!(
            self,
            MoveError::NotWaiting | MoveError::AlreadySeated(_) | MoveError::SeatTaken
        )
    }
}

impl std::error::Error for MoveError {}
