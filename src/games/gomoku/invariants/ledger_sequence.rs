//! Ledger sequence invariant: 1, 2, 3, ... with no gaps.

use super::super::Match;
use super::Invariant;

/// Invariant: ledger sequence numbers start at 1 and increase by one, and
/// every record belongs to the match.
pub struct LedgerSequenceInvariant;

impl Invariant<Match> for LedgerSequenceInvariant {
    fn holds(game: &Match) -> bool {
        game.ledger()
            .records()
            .iter()
            .enumerate()
            .all(|(index, record)| {
                *record.seq() as usize == index + 1 && *record.match_id() == game.id()
            })
    }

    fn description() -> &'static str {
        "Ledger sequence numbers are contiguous from 1"
    }
}
