//! Match phases.
//!
//! Each phase carries exactly the fields that are meaningful in it: a
//! waiting match has no guest or turn, a match in play has a turn but no
//! outcome, a finished match has an outcome but no turn.

use super::Seat;
use crate::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coarse lifecycle status, as stored and shown on the wire.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MatchStatus {
    /// Waiting for a second player.
    Waiting,
    /// Both seats filled; moves accepted.
    Playing,
    /// Terminal.
    Finished,
}

/// How a finished match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// The seat completed five in a row.
    Win(Seat),
    /// The board filled with no winner.
    Draw,
}

impl Outcome {
    /// Returns the winning seat, if any.
    pub fn winner(&self) -> Option<Seat> {
        match self {
            Outcome::Win(seat) => Some(*seat),
            Outcome::Draw => None,
        }
    }

    /// Reason string carried by `game_end` events.
    pub fn reason(&self) -> &'static str {
        match self {
            Outcome::Win(_) => "win",
            Outcome::Draw => "draw",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Win(seat) => write!(f, "Seat {} wins", seat),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}

/// Phase-specific match state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Created, seat B empty.
    Waiting,
    /// Both seats filled.
    Playing {
        /// Seat B occupant.
        guest: PlayerId,
        /// Seat due to move.
        turn: Seat,
        /// When seat B was filled.
        started_at: DateTime<Utc>,
    },
    /// Terminal.
    Finished {
        /// Seat B occupant.
        guest: PlayerId,
        /// When seat B was filled.
        started_at: DateTime<Utc>,
        /// When the deciding move was accepted.
        finished_at: DateTime<Utc>,
        /// Win or draw.
        outcome: Outcome,
    },
}

impl Phase {
    /// Coarse status of this phase.
    pub fn status(&self) -> MatchStatus {
        match self {
            Phase::Waiting => MatchStatus::Waiting,
            Phase::Playing { .. } => MatchStatus::Playing,
            Phase::Finished { .. } => MatchStatus::Finished,
        }
    }
}
