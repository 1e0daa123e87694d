//! Monotonic board invariant: the board is exactly the replayed ledger.

use super::super::{Board, Cell, Match};
use super::Invariant;

/// Invariant: every stone on the board comes from one ledger entry, each
/// placed on an empty cell by a seated player.
pub struct MonotonicBoardInvariant;

impl Invariant<Match> for MonotonicBoardInvariant {
    fn holds(game: &Match) -> bool {
        let mut replayed = Board::new();

        for record in game.ledger().records() {
            let (Some(pos), Some(seat)) = (record.position(), game.seat_of(*record.player_id()))
            else {
                return false;
            };
            if replayed.get(pos) != Cell::Empty {
                return false;
            }
            if replayed.place(pos, seat).is_err() {
                return false;
            }
        }

        replayed == *game.board()
    }

    fn description() -> &'static str {
        "Board cells are set once and match the ledger"
    }
}
