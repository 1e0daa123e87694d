//! Invariants every match must satisfy.
//!
//! Checked after each accepted move in debug builds, and whenever a match is
//! rebuilt from storage.

mod alternating_turn;
mod ledger_sequence;
mod monotonic_board;

pub use alternating_turn::AlternatingTurnInvariant;
pub use ledger_sequence::LedgerSequenceInvariant;
pub use monotonic_board::MonotonicBoardInvariant;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("Invariant violated: {}", description)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants checked together.
pub trait InvariantSet<S> {
    /// Returns every violated invariant, or `Ok(())` if all hold.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();

        if !I1::holds(state) {
            violations.push(InvariantViolation::new(I1::description()));
        }
        if !I2::holds(state) {
            violations.push(InvariantViolation::new(I2::description()));
        }
        if !I3::holds(state) {
            violations.push(InvariantViolation::new(I3::description()));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// All match invariants.
pub type GomokuInvariants = (
    LedgerSequenceInvariant,
    MonotonicBoardInvariant,
    AlternatingTurnInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::gomoku::{Board, Match, MoveLedger, Phase, Position, Seat};
    use chrono::Utc;

    fn playing() -> Match {
        let mut game = Match::create(1, 10);
        game.join(20).unwrap();
        game
    }

    #[test]
    fn test_invariants_hold_for_new_match() {
        assert!(GomokuInvariants::check_all(&Match::create(1, 10)).is_ok());
        assert!(GomokuInvariants::check_all(&playing()).is_ok());
    }

    #[test]
    fn test_invariants_hold_after_moves() {
        let mut game = playing();
        game.apply_move(10, 7, 7).unwrap();
        game.apply_move(20, 8, 8).unwrap();
        game.apply_move(10, 7, 8).unwrap();
        assert!(GomokuInvariants::check_all(&game).is_ok());
    }

    #[test]
    fn test_stray_stone_violates_monotonic_board() {
        let game = playing();
        let mut board = Board::new();
        board.place(Position::new(0, 0).unwrap(), Seat::B).unwrap();
        let corrupted = Match::restore(
            game.id(),
            game.host(),
            board,
            MoveLedger::new(),
            game.created_at(),
            game.phase().clone(),
        );

        let violations = GomokuInvariants::check_all(&corrupted).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].description,
            MonotonicBoardInvariant::description()
        );
    }

    #[test]
    fn test_wrong_turn_violates_alternation() {
        let corrupted = Match::restore(
            1,
            10,
            Board::new(),
            MoveLedger::new(),
            Utc::now(),
            Phase::Playing {
                guest: 20,
                turn: Seat::B,
                started_at: Utc::now(),
            },
        );
        assert!(!AlternatingTurnInvariant::holds(&corrupted));
    }
}
