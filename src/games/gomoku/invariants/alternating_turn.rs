//! Alternating turn invariant: A, B, A, B, ...

use super::super::{Match, Outcome, Phase, Seat};
use super::Invariant;

/// Invariant: seats alternate starting with A, the seat due to move follows
/// the last mover, and a winner is the last mover.
pub struct AlternatingTurnInvariant;

impl Invariant<Match> for AlternatingTurnInvariant {
    fn holds(game: &Match) -> bool {
        let records = game.ledger().records();

        let alternates = records.iter().enumerate().all(|(index, record)| {
            let expected = if index % 2 == 0 { Seat::A } else { Seat::B };
            game.seat_of(*record.player_id()) == Some(expected)
        });
        if !alternates {
            return false;
        }

        let last_mover = records
            .last()
            .and_then(|record| game.seat_of(*record.player_id()));

        match game.phase() {
            Phase::Waiting => records.is_empty(),
            Phase::Playing { turn, .. } => match last_mover {
                Some(seat) => *turn == seat.opponent(),
                None => *turn == Seat::A,
            },
            Phase::Finished { outcome, .. } => match outcome {
                Outcome::Win(seat) => last_mover == Some(*seat),
                Outcome::Draw => last_mover.is_some(),
            },
        }
    }

    fn description() -> &'static str {
        "Seats alternate A, B, A, ... and the turn follows the last mover"
    }
}
