//! Read-only JSON views of matches for the HTTP surface.

use crate::games::gomoku::{Match, MatchStatus, MoveRecord};
use crate::protocol::WireBoard;
use crate::{MatchId, PlayerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Flat view of a match, with unset seats and turn as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Match id.
    pub id: MatchId,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Seat A.
    pub player1_id: PlayerId,
    /// Seat B, once joined.
    pub player2_id: Option<PlayerId>,
    /// Player due to move, while playing.
    pub current_turn_id: Option<PlayerId>,
    /// Winner, if the match ended in a win.
    pub winner_id: Option<PlayerId>,
    /// Board rows, indexed `board[y][x]`.
    pub board: WireBoard,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// When seat B was filled.
    pub started_at: Option<DateTime<Utc>>,
    /// When the match ended.
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&Match> for MatchSnapshot {
    fn from(game: &Match) -> Self {
        Self {
            id: game.id(),
            status: game.status(),
            player1_id: game.host(),
            player2_id: game.guest(),
            current_turn_id: game.turn(),
            winner_id: game.winner(),
            board: game.board().to_codes(),
            created_at: game.created_at(),
            started_at: game.started_at(),
            finished_at: game.finished_at(),
        }
    }
}

/// One ledger entry as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveView {
    /// The mover.
    pub player_id: PlayerId,
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// 1-based acceptance order.
    pub seq: u32,
    /// Acceptance time.
    pub created_at: DateTime<Utc>,
}

impl From<&MoveRecord> for MoveView {
    fn from(record: &MoveRecord) -> Self {
        Self {
            player_id: *record.player_id(),
            x: *record.x(),
            y: *record.y(),
            seq: *record.seq(),
            created_at: *record.played_at(),
        }
    }
}

/// Snapshot plus the full move ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDetail {
    /// Current state.
    #[serde(flatten)]
    pub snapshot: MatchSnapshot,
    /// Accepted moves in order.
    pub moves: Vec<MoveView>,
}

impl From<&Match> for MatchDetail {
    fn from(game: &Match) -> Self {
        Self {
            snapshot: game.into(),
            moves: game.ledger().records().iter().map(MoveView::from).collect(),
        }
    }
}
