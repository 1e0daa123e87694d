//! Fifteen-by-fifteen gomoku: board, rules and the match state machine.

mod action;
mod game;
mod invariants;
mod ledger;
mod phases;
pub mod rules;
mod types;

pub use action::MoveError;
pub use game::{Match, MoveOutcome};
pub use invariants::{
    AlternatingTurnInvariant, GomokuInvariants, Invariant, InvariantSet, InvariantViolation,
    LedgerSequenceInvariant, MonotonicBoardInvariant,
};
pub use ledger::{MoveLedger, MoveRecord};
pub use phases::{MatchStatus, Outcome, Phase};
pub use types::{BOARD_SIZE, Board, Cell, Position, Seat, WIN_LENGTH};
